//! Minimum-spacing gate for outbound requests.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Single logical gate that spaces request grants by at least `min_interval`.
///
/// One instance must be shared by everything that talks to the same upstream (all
/// platforms, all cycles). Grants are serialized under one async mutex, held across
/// the wait, so concurrent callers queue instead of racing past the spacing.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_grant: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_grant: Mutex::new(None),
        }
    }

    /// Limiter expressed as a requests-per-second ceiling.
    pub fn per_second(max_requests: u32) -> Self {
        let safe_limit = max_requests.max(1);
        Self::new(Duration::from_secs_f64(1.0 / f64::from(safe_limit)))
    }

    pub const fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until `min_interval` has elapsed since the previous grant, then records and
    /// returns the new grant instant.
    pub async fn acquire(&self) -> Instant {
        let mut last_grant = self.last_grant.lock().await;

        if let Some(previous) = *last_grant {
            let ready_at = previous + self.min_interval;
            let now = Instant::now();
            if now < ready_at {
                tracing::debug!(
                    wait_ms = (ready_at - now).as_millis() as u64,
                    "rate limiter delaying request"
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }

        let granted = Instant::now();
        *last_grant = Some(granted);
        granted
    }

    /// Instant of the most recent grant, if any.
    pub async fn last_grant(&self) -> Option<Instant> {
        *self.last_grant.lock().await
    }
}
