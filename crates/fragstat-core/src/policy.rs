use std::time::Duration;

use crate::circuit_breaker::CircuitBreakerConfig;
use crate::retry::{Backoff, RetryPolicy};

/// Limits and resilience settings for one upstream stats provider.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamPolicy {
    /// Minimum spacing between any two outbound requests.
    pub min_request_interval: Duration,
    pub request_timeout: Duration,
    /// Upper bound on a single `Retry-After` pause after HTTP 429.
    pub max_retry_after: Duration,
    /// Pause used when a 429 carries no usable `Retry-After`.
    pub default_retry_after: Duration,
    pub retry: RetryPolicy,
    pub breaker: CircuitBreakerConfig,
}

impl UpstreamPolicy {
    /// fortnite-api.com allows 3 req/s; 2 req/s keeps a margin.
    pub fn fortnite_api_default() -> Self {
        Self {
            min_request_interval: Duration::from_millis(500),
            request_timeout: Duration::from_secs(10),
            max_retry_after: Duration::from_secs(60),
            default_retry_after: Duration::from_secs(60),
            retry: RetryPolicy {
                max_attempts: 3,
                backoff: Backoff::Exponential {
                    base: Duration::from_secs(1),
                    max: Duration::from_secs(30),
                },
            },
            breaker: CircuitBreakerConfig {
                failure_threshold: 5,
            },
        }
    }

    /// Zero spacing and a single attempt, for the in-process synthetic source.
    pub fn synthetic() -> Self {
        Self {
            min_request_interval: Duration::ZERO,
            retry: RetryPolicy::no_retry(),
            ..Self::fortnite_api_default()
        }
    }

    /// Clamp a server-requested pause to this policy's ceiling.
    pub fn retry_after_pause(&self, requested: Option<Duration>) -> Duration {
        requested
            .unwrap_or(self.default_retry_after)
            .min(self.max_retry_after)
    }
}

impl Default for UpstreamPolicy {
    fn default() -> Self {
        Self::fortnite_api_default()
    }
}
