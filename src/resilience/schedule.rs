//! Explicit backoff schedule.
//!
//! The schedule is the list of waits between attempts, supplied verbatim by
//! the caller. Its length is the retry budget: `N` delays allow `N + 1`
//! attempts in total.

use std::time::Duration;

/// Ordered, immutable list of retry delays.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BackoffSchedule {
    delays: Box<[Duration]>,
}

impl BackoffSchedule {
    pub fn new(delays: impl IntoIterator<Item = Duration>) -> Self {
        Self {
            delays: delays.into_iter().collect(),
        }
    }

    /// Build from millisecond values, as they appear in config files.
    pub fn from_millis(delays: &[u64]) -> Self {
        Self::new(delays.iter().copied().map(Duration::from_millis))
    }

    /// A schedule that never retries.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn durations(&self) -> &[Duration] {
        &self.delays
    }

    /// Maximum number of retries after the first attempt.
    pub fn len(&self) -> usize {
        self.delays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delays.is_empty()
    }

    /// Delay to wait before retry number `retry_index` (0-based), or `None`
    /// once the budget is spent.
    pub fn delay_for(&self, retry_index: usize) -> Option<Duration> {
        self.delays.get(retry_index).copied()
    }
}
