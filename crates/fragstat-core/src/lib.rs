//! # Fragstat Core
//!
//! Data-acquisition and resilience layer for polling Fortnite player stats.
//!
//! ## Overview
//!
//! This crate provides everything between a scheduler and a presentation layer:
//!
//! - **Rate limiting** so a single logical client never exceeds the upstream ceiling
//! - **Bounded retries** with exponential backoff and typed retryability
//! - **Circuit breaker** that stops network calls while the upstream is unhealthy
//! - **Endpoint fetcher** that classifies HTTP outcomes, sanitizes payloads and builds records
//! - **Refresh coordinator** producing complete-or-failed snapshots
//! - **Aggregation** of weighted cross-platform/cross-mode roll-ups
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`aggregate`] | Roll-up metrics, selections and presets |
//! | [`circuit_breaker`] | Closed/open breaker over consecutive failures |
//! | [`config`] | Environment and JSON configuration |
//! | [`coordinator`] | Refresh cycle orchestration |
//! | [`domain`] | Player, platform, mode and stats record types |
//! | [`error`] | Error taxonomy |
//! | [`fetcher`] | Live stats endpoint source |
//! | [`http_client`] | HTTP client abstraction |
//! | [`policy`] | Upstream limits and resilience settings |
//! | [`rate_limiter`] | Minimum-spacing request gate |
//! | [`retry`] | Retry policy and backoff |
//! | [`sanitize`] | Payload repair |
//! | [`snapshot`] | Immutable per-cycle result |
//! | [`source`] | Stats source trait and synthetic source |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use fragstat_core::{aggregate, Metric, RefreshCoordinator, ReqwestHttpClient, Selection, StatsConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StatsConfig::from_env()?;
//!     let coordinator = RefreshCoordinator::from_config(&config, Arc::new(ReqwestHttpClient::new()))?;
//!
//!     let snapshot = coordinator.refresh(&config.refresh_request()?).await?;
//!     println!("K/D: {}", aggregate(&snapshot, &Selection::all(), Metric::Kd));
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │ Scheduler / CLI     │
//! └──────────┬──────────┘
//!            │ refresh(request)
//!            ▼
//! ┌─────────────────────┐     ┌──────────────────┐
//! │ RefreshCoordinator  │────▶│ Circuit Breaker  │
//! └──────────┬──────────┘     └──────────────────┘
//!            │ per platform
//!            ▼
//! ┌─────────────────────┐     ┌──────────────────┐
//! │ RetryPolicy         │────▶│ Rate Limiter     │
//! └──────────┬──────────┘     └──────────────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐     ┌──────────────────┐
//! │ StatsSource         │────▶│ HTTP Client      │
//! │ (fetcher/synthetic) │     │ (reqwest)        │
//! └──────────┬──────────┘     └──────────────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐     ┌──────────────────┐
//! │ Snapshot            │────▶│ Aggregator       │
//! └─────────────────────┘     └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use fragstat_core::{FetchErrorKind, RefreshError};
//!
//! fn describe(error: &RefreshError) -> &'static str {
//!     match error {
//!         RefreshError::BreakerOpen => "upstream unhealthy, skipped",
//!         RefreshError::Platform { source, .. } => match source.last_error().kind() {
//!             FetchErrorKind::Auth => "check the api key",
//!             FetchErrorKind::NotFound => "unknown player",
//!             _ => "upstream failure",
//!         },
//!         RefreshError::InvalidRequest(_) => "bad request",
//!     }
//! }
//! ```
//!
//! ## Security
//!
//! - API keys are never included in `Debug` output or logs
//! - Player ids are validated before they reach a request

pub mod aggregate;
pub mod circuit_breaker;
pub mod config;
pub mod coordinator;
pub mod domain;
pub mod error;
pub mod fetcher;
pub mod http_client;
pub mod policy;
pub mod rate_limiter;
pub mod retry;
pub mod sanitize;
pub mod snapshot;
pub mod source;

// Aggregation
pub use aggregate::{aggregate, rollup, AggregatePreset, Metric, Rollup, Selection};

// Circuit breaker
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};

// Configuration
pub use config::{SourceMode, StatsConfig};

// Coordination
pub use coordinator::{CoordinatorHealth, RefreshCoordinator, RefreshRequest};

// Domain models
pub use domain::{GameMode, Platform, PlayerId, StatsRecord, UtcDateTime};

// Error types
pub use error::{ConfigError, FetchError, FetchErrorKind, RefreshError, RetryError, ValidationError};

// Sources
pub use fetcher::{transform, EndpointFetcher};
pub use source::{PlatformStats, SourceKind, StatsSource, SyntheticSource};

// HTTP client types
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient,
};

pub use policy::UpstreamPolicy;
pub use rate_limiter::RateLimiter;
pub use retry::{Backoff, RetryPolicy};
pub use sanitize::sanitize;
pub use snapshot::{Snapshot, SnapshotBuilder};
