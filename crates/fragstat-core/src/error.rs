use std::fmt::{Display, Formatter};
use std::time::Duration;

use thiserror::Error;

use crate::domain::Platform;

/// Validation and contract errors exposed by `fragstat-core`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("player id cannot be empty")]
    EmptyPlayerId,
    #[error("player id length {len} must be between {min} and {max}")]
    PlayerIdLength { len: usize, min: usize, max: usize },
    #[error("player id contains invalid character '{ch}' at index {index}")]
    PlayerIdInvalidChar { ch: char, index: usize },

    #[error(
        "invalid platform '{value}', expected gamepad, keyboardMouse or touch \
         (aliases: pc, kbm, xbox, psn, switch, console, mobile)"
    )]
    InvalidPlatform { value: String },
    #[error("invalid game mode '{value}', expected one of solo, duo, trio, squad, ltm, overall")]
    InvalidGameMode { value: String },
    #[error("invalid metric '{value}'")]
    InvalidMetric { value: String },
    #[error("invalid aggregate preset '{value}'")]
    InvalidPreset { value: String },
    #[error("invalid data source '{value}', expected one of live, synthetic, live_with_fallback")]
    InvalidSourceMode { value: String },

    #[error("at least one platform must be requested")]
    EmptyPlatforms,
    #[error("at least one game mode must be requested")]
    EmptyModes,

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },
    #[error("win ratio {value} must be within 0..=1")]
    WinRatioOutOfRange { value: f64 },
}

/// Classification of a single upstream fetch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// HTTP 401, the API key was rejected.
    Auth,
    /// HTTP 404, the player does not exist or has private stats.
    NotFound,
    /// HTTP 429.
    RateLimited,
    /// HTTP 5xx.
    TransientServer,
    /// Application-level error payload, malformed body, or an unexpected status.
    Upstream,
    /// Connection failure or request timeout.
    Transport,
}

/// Structured fetch error consumed by the retry policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    kind: FetchErrorKind,
    message: String,
    retry_after: Option<Duration>,
}

impl FetchError {
    fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Auth, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::NotFound, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::RateLimited, message)
    }

    pub fn transient_server(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::TransientServer, message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Upstream, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Transport, message)
    }

    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    pub const fn kind(&self) -> FetchErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Pause the upstream asked for via `Retry-After`, if any.
    pub const fn retry_after(&self) -> Option<Duration> {
        self.retry_after
    }

    pub const fn retryable(&self) -> bool {
        !matches!(self.kind, FetchErrorKind::Auth | FetchErrorKind::NotFound)
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            FetchErrorKind::Auth => "fetch.auth",
            FetchErrorKind::NotFound => "fetch.not_found",
            FetchErrorKind::RateLimited => "fetch.rate_limited",
            FetchErrorKind::TransientServer => "fetch.transient_server",
            FetchErrorKind::Upstream => "fetch.upstream",
            FetchErrorKind::Transport => "fetch.transport",
        }
    }
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for FetchError {}

/// Outcome of a retried operation that never succeeded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RetryError {
    /// The error was classified non-retryable and surfaced on its first occurrence.
    #[error("non-retryable failure: {0}")]
    Rejected(FetchError),

    /// Every attempt failed with a retryable error.
    #[error("retries exhausted after {attempts} attempt(s): {last}")]
    Exhausted { attempts: u32, last: FetchError },
}

impl RetryError {
    /// The error returned by the final attempt.
    pub fn last_error(&self) -> &FetchError {
        match self {
            Self::Rejected(error) => error,
            Self::Exhausted { last, .. } => last,
        }
    }

    pub const fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}

/// Cycle-level refresh failure. A failed cycle never yields a partial snapshot.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RefreshError {
    #[error("circuit breaker is open; refresh skipped without contacting upstream")]
    BreakerOpen,

    #[error("platform '{platform}' failed: {source}")]
    Platform {
        platform: Platform,
        #[source]
        source: RetryError,
    },

    #[error(transparent)]
    InvalidRequest(#[from] ValidationError),
}

impl RefreshError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::BreakerOpen => "refresh.breaker_open",
            Self::Platform {
                source: RetryError::Exhausted { .. },
                ..
            } => "refresh.retries_exhausted",
            Self::Platform { .. } => "refresh.platform_failed",
            Self::InvalidRequest(_) => "refresh.invalid_request",
        }
    }
}

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting '{name}'")]
    Missing { name: &'static str },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}
