//! Transport retry policy.
//!
//! Retry here covers a *single* logical call: transient network failures
//! and 5xx responses are retried with exponential backoff, 4xx application
//! errors never are. Domain-level polling is a separate concern layered on
//! top and must not be conflated with this.

use std::time::Duration;

/// Exponential backoff policy for transport retries.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each attempt.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// The delay following `current`, doubled and capped.
    #[must_use]
    pub fn next_delay(&self, current: Duration) -> Duration {
        std::cmp::min(
            self.max_delay,
            Duration::from_secs_f64(current.as_secs_f64() * self.multiplier),
        )
    }
}

/// Whether a network-level error is worth another attempt.
pub(crate) fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout() || err.is_body()
}
