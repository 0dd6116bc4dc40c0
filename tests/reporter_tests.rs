use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use workmeter::completion::CompletionQueue;
use workmeter::error::Result;
use workmeter::reporter::ProgressReporter;

/// A completion queue whose markers finish only when the test says so.
struct ManualQueue {
    submitted: AtomicU64,
    completed: Arc<AtomicU64>,
}

impl ManualQueue {
    fn new(completed: Arc<AtomicU64>) -> Self {
        Self {
            submitted: AtomicU64::new(0),
            completed,
        }
    }
}

impl CompletionQueue for ManualQueue {
    fn submit(&self, num: u64) -> Result<()> {
        self.submitted.fetch_add(num, Ordering::Relaxed);
        Ok(())
    }

    fn poll_completed(&self) -> Result<u64> {
        // A marker can only finish after it was submitted.
        let submitted = self.submitted.load(Ordering::Relaxed);
        Ok(self.completed.load(Ordering::Relaxed).min(submitted))
    }
}

#[test]
fn sequential_updates_reach_full_fraction() {
    let mut reporter = ProgressReporter::new(10, "render", false);
    for _ in 0..10 {
        reporter.update(1);
    }
    reporter.done();
    assert_eq!(reporter.work_done(), 10);
    assert_eq!(reporter.fraction(), 1.0);
    // The display thread has exited; a second done has nothing to do.
    reporter.done();
}

#[test]
fn concurrent_updates_are_not_lost() {
    const PRODUCERS: u64 = 4;
    const UPDATES_EACH: u64 = 500;

    let mut reporter = ProgressReporter::new(PRODUCERS * UPDATES_EACH, "concurrent", false);
    thread::scope(|scope| {
        for _ in 0..PRODUCERS {
            scope.spawn(|| {
                for _ in 0..UPDATES_EACH {
                    reporter.update(1);
                }
            });
        }
    });
    reporter.done();
    assert_eq!(reporter.work_done(), PRODUCERS * UPDATES_EACH);
    assert_eq!(reporter.fraction(), 1.0);
}

#[test]
fn quiet_reporter_never_tracks_or_prints() {
    let mut reporter = ProgressReporter::new(100, "quiet", true);
    for _ in 0..100 {
        reporter.update(1);
    }
    // Quiet updates are no-ops, so the observable state never moves.
    assert_eq!(reporter.work_done(), 0);
    assert_eq!(reporter.fraction(), 0.0);
    reporter.done();
    assert_eq!(reporter.work_done(), 0);
}

#[test]
fn elapsed_seconds_is_non_decreasing() {
    let mut reporter = ProgressReporter::new(1, "clock", true);
    let first = reporter.elapsed_seconds();
    thread::sleep(Duration::from_millis(10));
    let second = reporter.elapsed_seconds();
    assert!(second >= first);
    reporter.done();
}

#[test]
fn completion_markers_advance_fraction_when_polled() {
    let completed = Arc::new(AtomicU64::new(0));
    let queue = ManualQueue::new(Arc::clone(&completed));
    let mut reporter = ProgressReporter::with_completions(5, "device", false, queue);

    reporter.update(5);
    assert_eq!(reporter.work_done(), 0, "nothing has completed yet");

    completed.store(2, Ordering::Relaxed);
    assert_eq!(reporter.work_done(), 2);

    completed.store(5, Ordering::Relaxed);
    assert_eq!(reporter.work_done(), 5);
    assert_eq!(reporter.fraction(), 1.0);

    reporter.done();
    assert_eq!(reporter.fraction(), 1.0);
}

#[test]
fn finished_markers_never_exceed_submitted_ones() {
    let completed = Arc::new(AtomicU64::new(0));
    let queue = ManualQueue::new(Arc::clone(&completed));
    let mut reporter = ProgressReporter::with_completions(5, "device", false, queue);

    reporter.update(3);
    // Claim more completions than were ever submitted; the queue caps the
    // answer at the submitted count.
    completed.store(10, Ordering::Relaxed);
    assert_eq!(reporter.work_done(), 3);
    assert!(reporter.fraction() < 1.0);

    reporter.update(2);
    assert_eq!(reporter.work_done(), 5);
    reporter.done();
}

#[test]
#[should_panic(expected = "completion markers")]
fn over_submission_is_a_contract_violation() {
    let completed = Arc::new(AtomicU64::new(0));
    let queue = ManualQueue::new(completed);
    let reporter = ProgressReporter::with_completions(5, "device", false, queue);

    reporter.update(3);
    reporter.update(3); // 3 + 3 > 5
}

#[test]
fn progress_never_regresses_in_the_display() {
    let completed = Arc::new(AtomicU64::new(0));
    let queue = ManualQueue::new(Arc::clone(&completed));
    let mut reporter = ProgressReporter::with_completions(4, "device", false, queue);

    reporter.update(4);
    completed.store(3, Ordering::Relaxed);
    assert_eq!(reporter.work_done(), 3);

    // Even if the queue were to answer lower later, the reported count
    // holds at its high-water mark.
    completed.store(1, Ordering::Relaxed);
    assert!(reporter.work_done() >= 3);
    reporter.done();
}

#[test]
fn eta_is_omitted_until_there_is_progress() {
    let mut reporter = ProgressReporter::new(10, "render", true);
    let line = reporter.to_string();
    assert!(line.contains("0.0%"));
    assert!(!line.contains("ETA"), "no estimate without any progress");
    reporter.done();

    let mut reporter = ProgressReporter::new(10, "render", false);
    reporter.update(5);
    let line = reporter.to_string();
    assert!(line.contains(" 50.0%"));
    assert!(line.contains("ETA"));
    reporter.done();
}

#[test]
fn zero_total_work_finishes_cleanly() {
    let mut reporter = ProgressReporter::new(0, "empty", false);
    assert_eq!(reporter.fraction(), 1.0);
    reporter.done();
    assert_eq!(reporter.fraction(), 1.0);
}

#[test]
fn drop_without_done_stops_the_display_thread() {
    let reporter = ProgressReporter::new(3, "dropped", false);
    reporter.update(3);
    drop(reporter); // Drop finalizes, joining the thread.
}
