use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

/// Runtime circuit state for upstream stats calls.
///
/// There is no half-open probe state: a single recorded success closes the breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
}

/// Circuit breaker threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
        }
    }
}

#[derive(Debug)]
struct CircuitInner {
    state: CircuitState,
    consecutive_failures: u32,
}

impl Default for CircuitInner {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
        }
    }
}

/// Thread-safe consecutive-failure breaker guarding refresh cycles.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<CircuitInner>,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config: CircuitBreakerConfig {
                failure_threshold: config.failure_threshold.max(1),
            },
            inner: Mutex::new(CircuitInner::default()),
        }
    }

    pub const fn config(&self) -> CircuitBreakerConfig {
        self.config
    }

    /// True iff the breaker is closed.
    pub fn should_attempt(&self) -> bool {
        self.lock().state == CircuitState::Closed
    }

    pub fn record_success(&self) {
        let mut inner = self.lock();
        if inner.state == CircuitState::Open {
            tracing::info!("circuit breaker closed after successful refresh");
        }
        inner.state = CircuitState::Closed;
        inner.consecutive_failures = 0;
    }

    pub fn record_failure(&self) {
        let mut inner = self.lock();
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);

        if inner.state == CircuitState::Closed
            && inner.consecutive_failures >= self.config.failure_threshold
        {
            inner.state = CircuitState::Open;
            tracing::warn!(
                consecutive_failures = inner.consecutive_failures,
                "circuit breaker opened"
            );
        }
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.lock().consecutive_failures
    }

    fn lock(&self) -> MutexGuard<'_, CircuitInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
