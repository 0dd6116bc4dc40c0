//! Progress and ETA reporting for a single long-running unit of work.

use std::fmt;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::completion::CompletionQueue;
use crate::stopwatch::{Stopwatch, format_seconds};

/// Width of the filled/unfilled bar segment, in characters.
const BAR_WIDTH: usize = 40;

/// How long the display thread sleeps between renders.
const REFRESH_INTERVAL: Duration = Duration::from_millis(100);

/// Reports progress of `total_work` units toward completion, with a
/// background thread that periodically redraws a status line (bar,
/// percentage, elapsed time and ETA) on stderr.
///
/// Progress is fed either by direct counter increments from any number of
/// concurrent producers, or by polling a [`CompletionQueue`] of
/// asynchronously completing markers. Exactly one of the two mechanisms is
/// active per instance, chosen at construction.
///
/// Call [`done`](Self::done) once when the work is finished; dropping the
/// reporter finalizes it as well.
pub struct ProgressReporter {
    shared: Arc<Shared>,
    quiet: bool,
    /// Markers handed to the completion queue so far. Only meaningful in
    /// completion mode; bounded by `total_work`.
    launched: AtomicU64,
    thread: Option<JoinHandle<()>>,
}

/// State shared between producers, the owner and the display thread.
struct Shared {
    total_work: u64,
    title: String,
    work_done: AtomicU64,
    exiting: AtomicBool,
    stopwatch: Stopwatch,
    completions: Option<Box<dyn CompletionQueue + Send + Sync>>,
}

impl Shared {
    /// Current completed-work count. In completion mode this folds a fresh
    /// poll of the queue into `work_done` first, so readers never see the
    /// count regress.
    ///
    /// # Panics
    ///
    /// Panics if the completion backend fails to answer a poll; the
    /// pipeline being tracked is broken and the job cannot continue.
    fn current(&self) -> u64 {
        if let Some(queue) = &self.completions {
            match queue.poll_completed() {
                Ok(finished) => {
                    self.work_done.fetch_max(finished, Ordering::Relaxed);
                }
                Err(err) => panic!("failed to poll completion markers: {err}"),
            }
        }
        self.work_done.load(Ordering::Relaxed)
    }

    fn fraction(&self) -> f64 {
        if self.total_work == 0 {
            return 1.0;
        }
        self.current().min(self.total_work) as f64 / self.total_work as f64
    }
}

impl ProgressReporter {
    /// Create a counter-driven reporter for `total_work` units.
    ///
    /// Unless `quiet`, a display thread is spawned immediately. With
    /// `quiet` set, no thread is spawned, nothing is ever printed and
    /// every [`update`](Self::update) is a no-op.
    pub fn new(total_work: u64, title: impl Into<String>, quiet: bool) -> Self {
        Self::build(total_work, title.into(), quiet, None)
    }

    /// Create a reporter that tracks progress by polling `queue` instead of
    /// by direct counter increments.
    ///
    /// [`update`](Self::update) then submits markers to the queue, up to
    /// `total_work` in total, and the display thread advances progress as
    /// markers are observed complete.
    pub fn with_completions<Q>(
        total_work: u64,
        title: impl Into<String>,
        quiet: bool,
        queue: Q,
    ) -> Self
    where
        Q: CompletionQueue + Send + Sync + 'static,
    {
        Self::build(total_work, title.into(), quiet, Some(Box::new(queue)))
    }

    fn build(
        total_work: u64,
        title: String,
        quiet: bool,
        completions: Option<Box<dyn CompletionQueue + Send + Sync>>,
    ) -> Self {
        let shared = Arc::new(Shared {
            total_work,
            title,
            work_done: AtomicU64::new(0),
            exiting: AtomicBool::new(false),
            stopwatch: Stopwatch::new(),
            completions,
        });

        let thread = if quiet {
            None
        } else {
            log::debug!("starting display thread for {:?}", shared.title);
            let shared = Arc::clone(&shared);
            Some(std::thread::spawn(move || display_loop(&shared)))
        };

        Self {
            shared,
            quiet,
            launched: AtomicU64::new(0),
            thread,
        }
    }

    /// Report that `num` further work units have completed (counter mode),
    /// or submit `num` further completion markers (completion mode).
    ///
    /// Counter-mode updates are a single relaxed atomic add: lock-free,
    /// never blocking, and never lost under concurrent callers. A no-op if
    /// `num == 0` or the reporter is quiet.
    ///
    /// # Panics
    ///
    /// In completion mode, panics if the submissions would exceed
    /// `total_work` (the caller declared fewer units than it submits) or if
    /// the completion backend rejects the markers.
    pub fn update(&self, num: u64) {
        if self.quiet || num == 0 {
            return;
        }
        match &self.shared.completions {
            Some(queue) => {
                let launched = self.launched.fetch_add(num, Ordering::Relaxed);
                assert!(
                    launched + num <= self.shared.total_work,
                    "submitted {} completion markers but only {} work units were declared",
                    launched + num,
                    self.shared.total_work,
                );
                if let Err(err) = queue.submit(num) {
                    panic!("failed to submit completion markers: {err}");
                }
            }
            None => {
                self.shared.work_done.fetch_add(num, Ordering::Relaxed);
            }
        }
    }

    /// Seconds since the reporter was constructed.
    pub fn elapsed_seconds(&self) -> f64 {
        self.shared.stopwatch.elapsed_seconds()
    }

    /// Completed-work count as currently observable. In completion mode
    /// this polls the queue, so it reflects markers finished so far.
    pub fn work_done(&self) -> u64 {
        self.shared.current()
    }

    /// Fraction complete in `[0, 1]`; defined as 1.0 when `total_work` is
    /// zero.
    pub fn fraction(&self) -> f64 {
        self.shared.fraction()
    }

    pub fn total_work(&self) -> u64 {
        self.shared.total_work
    }

    pub fn title(&self) -> &str {
        &self.shared.title
    }

    /// Stop the display thread and emit the final status line.
    ///
    /// Blocks until the thread has observed the exit flag, drawn one last
    /// complete line and printed a trailing newline. Idempotent: calls
    /// after the first are no-ops, and a quiet reporter has nothing to
    /// stop.
    ///
    /// # Panics
    ///
    /// Re-raises a panic from the display thread (a completion backend
    /// failure observed while polling).
    pub fn done(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        // The original work estimate may have been high; snap the counter
        // so the final line reads 100%. Completion mode reports the true
        // final state from the last poll instead.
        if self.shared.completions.is_none() {
            self.shared
                .work_done
                .fetch_max(self.shared.total_work, Ordering::Relaxed);
        }
        self.shared.exiting.store(true, Ordering::Release);
        log::debug!("joining display thread for {:?}", self.shared.title);
        if let Err(payload) = thread.join() {
            std::panic::resume_unwind(payload);
        }
    }
}

impl fmt::Display for ProgressReporter {
    /// Renders the current status line on demand, independent of the
    /// display thread. Useful for diagnostics.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&status_line(
            &self.shared.title,
            self.shared.fraction(),
            self.shared.stopwatch.elapsed_seconds(),
        ))
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if std::thread::panicking() {
            // Unwinding already; stop the thread without risking a double
            // panic from the join.
            self.shared.exiting.store(true, Ordering::Release);
            if let Some(thread) = self.thread.take() {
                let _ = thread.join();
            }
        } else {
            self.done();
        }
    }
}

/// Body of the display thread: redraw, sleep, repeat until told to exit,
/// then draw one last complete line and break the line.
fn display_loop(shared: &Shared) {
    let mut stderr = std::io::stderr();
    while !shared.exiting.load(Ordering::Acquire) {
        render(shared, &mut stderr, false);
        std::thread::sleep(REFRESH_INTERVAL);
    }
    render(shared, &mut stderr, true);
}

fn render(shared: &Shared, out: &mut impl Write, last: bool) {
    let line = status_line(
        &shared.title,
        shared.fraction(),
        shared.stopwatch.elapsed_seconds(),
    );
    // Write errors on the status line are not worth failing the job over.
    let _ = if last {
        writeln!(out, "\r{line}")
    } else {
        write!(out, "\r{line}")
    };
    let _ = out.flush();
}

/// Format one status line: title, fixed-width bar, percentage, elapsed
/// time and, once there is any progress to extrapolate from, the ETA.
fn status_line(title: &str, fraction: f64, elapsed: f64) -> String {
    let filled = ((fraction * BAR_WIDTH as f64) as usize).min(BAR_WIDTH);
    let mut bar = String::with_capacity(BAR_WIDTH);
    for _ in 0..filled {
        bar.push('+');
    }
    for _ in filled..BAR_WIDTH {
        bar.push(' ');
    }
    let percent = fraction * 100.0;
    if fraction > 0.0 {
        let eta = elapsed * (1.0 - fraction) / fraction;
        format!(
            "{title}: [{bar}] {percent:5.1}% ({}|ETA {})",
            format_seconds(elapsed),
            format_seconds(eta),
        )
    } else {
        format!(
            "{title}: [{bar}] {percent:5.1}% ({})",
            format_seconds(elapsed),
        )
    }
}
