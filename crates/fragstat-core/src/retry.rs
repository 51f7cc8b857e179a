//! Bounded retries with exponential backoff.

use std::future::Future;
use std::time::Duration;

use crate::error::{FetchError, RetryError};

/// Backoff strategy between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Uses a fixed delay between retries.
    Fixed {
        /// Delay between retries.
        delay: Duration,
    },
    /// Doubles the delay after every failed attempt.
    ///
    /// The delay after attempt `n` (1-indexed) is `base * 2^(n-1)`, capped at `max`.
    Exponential {
        /// The delay after the first failed attempt.
        base: Duration,
        /// The maximum duration to wait between retries.
        max: Duration,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_secs(1),
            max: Duration::from_secs(30),
        }
    }
}

impl Backoff {
    /// Delay to wait after the given failed attempt.
    ///
    /// # Arguments
    ///
    /// * `attempt` - The attempt that just failed (1-based)
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay } => delay,
            Self::Exponential { base, max } => {
                let exponent = attempt.saturating_sub(1);
                let scale = 2_u32.checked_pow(exponent).unwrap_or(u32::MAX);
                base.checked_mul(scale).unwrap_or(max).min(max)
            }
        }
    }
}

/// Retry wrapper for one fallible upstream operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total invocations allowed, including the first one.
    pub max_attempts: u32,
    /// The backoff strategy to use between attempts.
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::default(),
        }
    }
}

impl RetryPolicy {
    /// Exponential policy with a generous cap.
    pub fn exponential(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Exponential {
                base: base_delay,
                max: Duration::from_secs(300),
            },
        }
    }

    /// Create a new retry configuration with fixed backoff.
    pub fn fixed(delay: Duration, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Fixed { delay },
        }
    }

    /// A single attempt, no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }

    /// Invokes `operation` until it succeeds, fails non-retryably, or runs out of attempts.
    ///
    /// The closure receives the 1-based attempt number. Success returns immediately with
    /// no extra delay. Errors whose [`FetchError::retryable`] is false surface as
    /// [`RetryError::Rejected`] on the attempt that produced them.
    pub async fn execute<T, F, Fut>(&self, mut operation: F) -> Result<T, RetryError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let error = match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if !error.retryable() {
                tracing::debug!(attempt, code = error.code(), "non-retryable failure");
                return Err(RetryError::Rejected(error));
            }

            if attempt >= max_attempts {
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: error,
                });
            }

            let delay = self.delay_for_attempt(attempt);
            tracing::warn!(
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "attempt failed; backing off"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
