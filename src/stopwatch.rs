//! Monotonic stopwatch for elapsed-time reporting.

use std::fmt;
use std::time::Instant;

/// A stopwatch that starts ticking at construction.
///
/// Elapsed time comes from a monotonic clock, so it is immune to wall-clock
/// adjustments: successive reads are non-negative and non-decreasing. Reads
/// have no side effects and may happen from any thread.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    start: Instant,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Seconds since construction.
    pub fn elapsed_seconds(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Stopwatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_seconds(self.elapsed_seconds()))
    }
}

/// Render a duration in seconds as a compact human-readable string,
/// e.g. "12.3s", "2m05s" or "1h05m".
pub fn format_seconds(seconds: f64) -> String {
    if seconds < 60.0 {
        format!("{seconds:.1}s")
    } else if seconds < 3600.0 {
        let minutes = (seconds / 60.0) as u64;
        let rest = (seconds % 60.0) as u64;
        format!("{minutes}m{rest:02}s")
    } else {
        let hours = (seconds / 3600.0) as u64;
        let minutes = ((seconds % 3600.0) / 60.0) as u64;
        format!("{hours}h{minutes:02}m")
    }
}
