//! Exponential backoff policy for notification delivery retries.
//!
//! The policy itself is pure arithmetic; which constants apply is worker
//! configuration (`selah-notifier`'s `NotifierConfig`), not engine logic.

use std::time::Duration;

/// Cap on the doubling exponent so the shift can never overflow. With any
/// realistic base the cap duration is reached long before this.
const MAX_EXPONENT: u32 = 20;

/// Exponential backoff with a delay cap and an attempt ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub base: Duration,
    /// Upper bound on any single delay.
    pub cap: Duration,
    /// Total delivery attempts allowed before a job is failed terminally.
    pub max_attempts: u32,
}

/// What to do with a job after a failed delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Schedule another attempt after the given delay.
    RetryAfter(Duration),
    /// The attempt ceiling is reached; fail the job terminally.
    GiveUp,
}

impl BackoffPolicy {
    /// Delay before the next attempt, given how many attempts have already
    /// been made (including the one that just failed).
    ///
    /// The first retry waits `base`, then doubles each time: `base * 2^(n-1)`
    /// clamped to `cap`.
    pub fn delay_after(&self, attempts_made: u32) -> Duration {
        let exp = attempts_made.saturating_sub(1).min(MAX_EXPONENT);
        let delay = self.base.saturating_mul(1u32 << exp);
        delay.min(self.cap)
    }

    /// Decide whether a job that has made `attempts_made` attempts gets
    /// another one.
    pub fn decide(&self, attempts_made: u32) -> RetryDecision {
        if attempts_made >= self.max_attempts {
            RetryDecision::GiveUp
        } else {
            RetryDecision::RetryAfter(self.delay_after(attempts_made))
        }
    }
}
