//! Pluggable tracking of asynchronously completing work.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::Result;

/// A queue of opaque completion markers for work that finishes somewhere
/// else, e.g. on a device, and is observed complete by polling.
///
/// Markers are submitted in order. Polling must never block on an
/// unfinished marker: one that has not completed yet is simply not counted
/// and is examined again on the next poll.
pub trait CompletionQueue {
    /// Submit `num` further markers for asynchronous completion.
    ///
    /// # Errors
    ///
    /// If the underlying completion backend fails to record the markers,
    /// return an error with kind `Completion`. The pipeline being tracked
    /// is broken at that point; callers treat this as fatal.
    fn submit(&self, num: u64) -> Result<()>;

    /// Poll for completed markers without blocking.
    ///
    /// Returns the total number of markers observed complete so far. The
    /// returned count never decreases across calls.
    ///
    /// # Errors
    ///
    /// If querying the backend fails, return an error with kind
    /// `Completion`.
    fn poll_completed(&self) -> Result<u64>;
}

/// A [`CompletionQueue`] where submission is immediate completion.
///
/// This is the stand-in for pipelines without device-side completion
/// signals: every submitted marker counts as finished on the next poll.
#[derive(Debug, Default)]
pub struct InlineCompletions {
    submitted: AtomicU64,
}

impl InlineCompletions {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CompletionQueue for InlineCompletions {
    fn submit(&self, num: u64) -> Result<()> {
        self.submitted.fetch_add(num, Ordering::Relaxed);
        Ok(())
    }

    fn poll_completed(&self) -> Result<u64> {
        Ok(self.submitted.load(Ordering::Relaxed))
    }
}
