//! Shrink-and-retry policy for rate-limited ranged fetches.
//!
//! A rate-limited request is re-issued after a fixed cool-down with its
//! lookback halved, never below one day.

use std::time::Duration;

/// Smallest lookback a shrink can produce.
pub const MIN_WINDOW_DAYS: i64 = 1;

/// Timing and budget of the shrink-and-retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Shrinks allowed after the first attempt. Total attempts = `max_shrinks + 1`.
    pub max_shrinks: u32,
    /// Wait before re-issuing a shrunken request.
    pub cooldown: Duration,
    /// Wait between consecutive continuation page fetches.
    pub page_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_shrinks: 3,
            // Polygon's free tier allows five requests per minute.
            cooldown: Duration::from_secs(12),
            page_delay: Duration::from_millis(250),
        }
    }
}

impl BackoffPolicy {
    /// Same shrink budget with no waiting, for tests.
    pub fn immediate(max_shrinks: u32) -> Self {
        Self {
            max_shrinks,
            cooldown: Duration::ZERO,
            page_delay: Duration::ZERO,
        }
    }

    pub fn start(&self, days: i64) -> ShrinkState {
        ShrinkState {
            current_days: days.max(MIN_WINDOW_DAYS),
            shrinks_remaining: self.max_shrinks,
            attempts: 1,
        }
    }
}

/// Loop state: the lookback of the attempt in flight and the budget left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShrinkState {
    current_days: i64,
    shrinks_remaining: u32,
    attempts: u32,
}

impl ShrinkState {
    pub const fn current_days(&self) -> i64 {
        self.current_days
    }

    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Transition on a rate-limited attempt. Returns the next lookback, or
    /// `None` once the shrink budget is spent.
    pub fn on_rate_limited(&mut self) -> Option<i64> {
        if self.shrinks_remaining == 0 {
            return None;
        }
        self.shrinks_remaining -= 1;
        self.attempts += 1;
        self.current_days = shrink_days(self.current_days);
        Some(self.current_days)
    }
}

pub fn shrink_days(days: i64) -> i64 {
    (days / 2).max(MIN_WINDOW_DAYS)
}
