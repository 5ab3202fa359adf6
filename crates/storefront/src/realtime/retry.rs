//! Reconnection backoff policy for the hub channel.
//!
//! Implements exponential backoff with a ceiling. The first retry fires
//! immediately; subsequent delays double from 2s up to the 30s cap and stay
//! there for as long as the outage lasts.

use std::time::Duration;

/// Backoff policy for hub reconnection attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay before the first retry, in milliseconds.
    pub first_retry_ms: u64,
    /// Base delay doubled on each subsequent retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Ceiling for the exponential growth, in milliseconds.
    pub max_delay_ms: u64,
}

impl RetryPolicy {
    /// Delay to wait before retry number `attempt` (0-based).
    ///
    /// `attempt == 0` uses `first_retry_ms`; afterwards the delay is
    /// `base_delay_ms * 2^attempt`, capped at `max_delay_ms`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_millis(self.first_retry_ms);
        }

        let exp = 1u64
            .checked_shl(attempt)
            .and_then(|factor| self.base_delay_ms.checked_mul(factor))
            .unwrap_or(self.max_delay_ms);
        Duration::from_millis(exp.min(self.max_delay_ms))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            first_retry_ms: 0,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
        }
    }
}
