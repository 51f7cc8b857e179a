//! Refresh cycle orchestration.
//!
//! One cycle: breaker gate, then for each platform in order a rate-limited, retried
//! fetch, then exactly one breaker update. Any platform that cannot be fetched fails
//! the whole cycle and the previously published snapshot stays in place.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde::Serialize;

use crate::circuit_breaker::{CircuitBreaker, CircuitState};
use crate::config::{SourceMode, StatsConfig};
use crate::fetcher::EndpointFetcher;
use crate::http_client::HttpClient;
use crate::policy::UpstreamPolicy;
use crate::rate_limiter::RateLimiter;
use crate::retry::RetryPolicy;
use crate::snapshot::{Snapshot, SnapshotBuilder};
use crate::source::{SourceKind, StatsSource, SyntheticSource};
use crate::{ConfigError, GameMode, Platform, PlayerId, RefreshError, UtcDateTime, ValidationError};

/// Validated platform and mode lists for one cycle.
///
/// Both lists are non-empty and free of duplicates; request order is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshRequest {
    platforms: Vec<Platform>,
    modes: Vec<GameMode>,
}

impl RefreshRequest {
    pub fn new(
        platforms: impl IntoIterator<Item = Platform>,
        modes: impl IntoIterator<Item = GameMode>,
    ) -> Result<Self, ValidationError> {
        let platforms = dedup(platforms);
        if platforms.is_empty() {
            return Err(ValidationError::EmptyPlatforms);
        }
        let modes = dedup(modes);
        if modes.is_empty() {
            return Err(ValidationError::EmptyModes);
        }
        Ok(Self { platforms, modes })
    }

    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    pub fn modes(&self) -> &[GameMode] {
        &self.modes
    }
}

impl Default for RefreshRequest {
    fn default() -> Self {
        Self {
            platforms: vec![Platform::Gamepad, Platform::KeyboardMouse],
            modes: GameMode::DEFAULTS.to_vec(),
        }
    }
}

fn dedup<T: PartialEq>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut unique = Vec::new();
    for item in items {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    unique
}

/// Observable coordinator state for status output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinatorHealth {
    pub source: SourceKind,
    pub fallback_enabled: bool,
    pub circuit_state: CircuitState,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    pub last_success: Option<UtcDateTime>,
}

/// Drives refresh cycles against one primary source.
///
/// The rate limiter and breaker are owned here (behind `Arc`) and reused for every
/// cycle; share them between coordinators only when they poll the same upstream.
pub struct RefreshCoordinator {
    player: PlayerId,
    source: Arc<dyn StatsSource>,
    fallback: Option<Arc<dyn StatsSource>>,
    limiter: Arc<RateLimiter>,
    breaker: Arc<CircuitBreaker>,
    retry: RetryPolicy,
    latest: RwLock<Option<Arc<Snapshot>>>,
    last_error: Mutex<Option<String>>,
}

impl RefreshCoordinator {
    pub fn new(player: PlayerId, source: Arc<dyn StatsSource>, policy: &UpstreamPolicy) -> Self {
        Self {
            player,
            source,
            fallback: None,
            limiter: Arc::new(RateLimiter::new(policy.min_request_interval)),
            breaker: Arc::new(CircuitBreaker::new(policy.breaker)),
            retry: policy.retry,
            latest: RwLock::new(None),
            last_error: Mutex::new(None),
        }
    }

    /// Wires the configured source mode to a live fetcher, the synthetic source, or both.
    pub fn from_config(
        config: &StatsConfig,
        http_client: Arc<dyn HttpClient>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let policy = config.policy();
        let player = config.player_id.clone();
        let synthetic: Arc<dyn StatsSource> = Arc::new(SyntheticSource::new(player.clone()));

        if config.source == SourceMode::Synthetic {
            return Ok(Self::new(player, synthetic, &policy));
        }

        let api_key = config.require_api_key()?;
        let fetcher = EndpointFetcher::new(http_client, api_key, player.clone())
            .with_base_url(config.base_url.as_str())
            .with_account_type(config.account_type.as_str())
            .with_time_window(config.time_window.as_str())
            .with_policy(policy.clone());
        let coordinator = Self::new(player, Arc::new(fetcher), &policy);

        Ok(match config.source {
            SourceMode::LiveWithFallback => coordinator.with_fallback(synthetic),
            SourceMode::Live | SourceMode::Synthetic => coordinator,
        })
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn StatsSource>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn with_circuit_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.breaker = breaker;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn player(&self) -> &PlayerId {
        &self.player
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn circuit_breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Convenience entry point taking raw lists.
    pub async fn refresh_with(
        &self,
        platforms: &[Platform],
        modes: &[GameMode],
    ) -> Result<Arc<Snapshot>, RefreshError> {
        let request = RefreshRequest::new(platforms.iter().copied(), modes.iter().copied())?;
        self.refresh(&request).await
    }

    /// Runs one complete cycle.
    ///
    /// On success the snapshot is published as [`Self::latest`] and returned. On failure
    /// the published snapshot is untouched; with a fallback configured, a synthetic
    /// snapshot (`is_live() == false`) is returned instead of the error.
    pub async fn refresh(&self, request: &RefreshRequest) -> Result<Arc<Snapshot>, RefreshError> {
        if !self.breaker.should_attempt() {
            tracing::warn!(
                consecutive_failures = self.breaker.consecutive_failures(),
                "circuit breaker open; skipping upstream"
            );
            return self.fail_cycle(request, RefreshError::BreakerOpen).await;
        }

        match self.run_cycle(request).await {
            Ok(snapshot) => {
                self.breaker.record_success();
                let snapshot = Arc::new(snapshot);
                self.publish(Arc::clone(&snapshot));
                tracing::info!(
                    player = %self.player,
                    platforms = request.platforms().len(),
                    modes = request.modes().len(),
                    "refresh cycle completed"
                );
                Ok(snapshot)
            }
            Err(error) => {
                self.breaker.record_failure();
                tracing::warn!(
                    code = error.code(),
                    error = %error,
                    consecutive_failures = self.breaker.consecutive_failures(),
                    "refresh cycle failed"
                );
                self.fail_cycle(request, error).await
            }
        }
    }

    /// Last successfully published snapshot.
    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn health(&self) -> CoordinatorHealth {
        CoordinatorHealth {
            source: self.source.kind(),
            fallback_enabled: self.fallback.is_some(),
            circuit_state: self.breaker.state(),
            consecutive_failures: self.breaker.consecutive_failures(),
            last_error: self
                .last_error
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
            last_success: self.latest().map(|snapshot| snapshot.fetched_at()),
        }
    }

    async fn run_cycle(&self, request: &RefreshRequest) -> Result<Snapshot, RefreshError> {
        let source = self.source.as_ref();
        let modes = request.modes();
        let mut builder = SnapshotBuilder::new(
            self.player.clone(),
            request.platforms(),
            modes,
            source.kind().is_live(),
        );

        for &platform in request.platforms() {
            let stats = self
                .retry
                .execute(|attempt| async move {
                    self.limiter.acquire().await;
                    tracing::debug!(platform = %platform, attempt, "fetching platform stats");
                    source.fetch_platform(platform, modes).await
                })
                .await
                .map_err(|source| RefreshError::Platform { platform, source })?;
            builder.insert(platform, stats);
        }

        Ok(builder.build())
    }

    async fn fail_cycle(
        &self,
        request: &RefreshRequest,
        error: RefreshError,
    ) -> Result<Arc<Snapshot>, RefreshError> {
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = Some(error.to_string());

        let Some(fallback) = self.fallback.as_deref() else {
            return Err(error);
        };

        let mut builder = SnapshotBuilder::new(
            self.player.clone(),
            request.platforms(),
            request.modes(),
            false,
        );
        for &platform in request.platforms() {
            match fallback.fetch_platform(platform, request.modes()).await {
                Ok(stats) => {
                    builder.insert(platform, stats);
                }
                Err(fallback_error) => {
                    tracing::warn!(
                        platform = %platform,
                        error = %fallback_error,
                        "fallback source failed"
                    );
                    return Err(error);
                }
            }
        }

        tracing::warn!(code = error.code(), "serving fallback snapshot");
        Ok(Arc::new(builder.build()))
    }

    fn publish(&self, snapshot: Arc<Snapshot>) {
        *self.latest.write().unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("player", &self.player)
            .field("source", &self.source.kind())
            .field("fallback", &self.fallback.as_ref().map(|source| source.kind()))
            .field("limiter", &self.limiter)
            .field("breaker", &self.breaker)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    use tokio::time::Instant;

    use super::*;
    use crate::http_client::{HttpError, HttpRequest, HttpResponse};
    use crate::source::{FetchFuture, PlatformStats};
    use crate::{FetchError, StatsRecord};

    /// Source that replays scripted outcomes per platform and records grant times.
    struct ScriptedSource {
        script: Mutex<VecDeque<(Platform, Result<(), FetchError>)>>,
        calls: Mutex<Vec<(Platform, Instant)>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<(Platform, Result<(), FetchError>)>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(Platform, Instant)> {
            self.calls.lock().expect("calls lock").clone()
        }
    }

    impl StatsSource for ScriptedSource {
        fn kind(&self) -> SourceKind {
            SourceKind::Live
        }

        fn fetch_platform<'a>(
            &'a self,
            platform: Platform,
            modes: &'a [GameMode],
        ) -> FetchFuture<'a> {
            self.calls.lock().expect("calls lock").push((platform, Instant::now()));
            let (expected, outcome) = self
                .script
                .lock()
                .expect("script lock")
                .pop_front()
                .expect("unexpected fetch");
            assert_eq!(expected, platform);
            let stats = modes
                .iter()
                .map(|&mode| (mode, StatsRecord::empty(format!("{platform}_{mode}"))))
                .collect::<PlatformStats>();
            Box::pin(async move { outcome.map(|()| stats) })
        }
    }

    fn player() -> PlayerId {
        PlayerId::parse("test_player").expect("valid player id")
    }

    fn policy() -> UpstreamPolicy {
        UpstreamPolicy {
            retry: RetryPolicy::exponential(3, Duration::from_millis(100)),
            ..UpstreamPolicy::fortnite_api_default()
        }
    }

    fn both_platforms() -> RefreshRequest {
        RefreshRequest::new([Platform::Gamepad, Platform::KeyboardMouse], [GameMode::Solo])
            .expect("valid request")
    }

    #[test]
    fn request_rejects_empty_lists_and_drops_duplicates() {
        assert_eq!(
            RefreshRequest::new([], [GameMode::Solo]),
            Err(ValidationError::EmptyPlatforms)
        );
        assert_eq!(
            RefreshRequest::new([Platform::Gamepad], []),
            Err(ValidationError::EmptyModes)
        );

        let request = RefreshRequest::new(
            [Platform::KeyboardMouse, Platform::Gamepad, Platform::KeyboardMouse],
            [GameMode::Duo, GameMode::Duo],
        )
        .expect("valid request");
        assert_eq!(request.platforms(), &[Platform::KeyboardMouse, Platform::Gamepad]);
        assert_eq!(request.modes(), &[GameMode::Duo]);
    }

    #[tokio::test(start_paused = true)]
    async fn successful_cycle_publishes_snapshot_and_spaces_requests() {
        let source = Arc::new(ScriptedSource::new(vec![
            (Platform::Gamepad, Ok(())),
            (Platform::KeyboardMouse, Ok(())),
        ]));
        let coordinator = RefreshCoordinator::new(player(), source.clone(), &policy());

        let snapshot = coordinator.refresh(&both_platforms()).await.expect("cycle should succeed");

        assert!(snapshot.is_live());
        assert_eq!(snapshot.platforms(), &[Platform::Gamepad, Platform::KeyboardMouse]);
        assert!(snapshot.record(Platform::KeyboardMouse, GameMode::Solo).is_some());
        assert_eq!(coordinator.latest(), Some(snapshot));

        let calls = source.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[1].1 - calls[0].1 >= Duration::from_millis(500));
        assert_eq!(coordinator.health().consecutive_failures, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_consume_a_limiter_grant_each() {
        let source = Arc::new(ScriptedSource::new(vec![
            (Platform::Gamepad, Err(FetchError::transient_server("502"))),
            (Platform::Gamepad, Ok(())),
        ]));
        let coordinator = RefreshCoordinator::new(player(), source.clone(), &policy());
        let request = RefreshRequest::new([Platform::Gamepad], [GameMode::Solo]).expect("valid");

        coordinator.refresh(&request).await.expect("retry should recover");

        let calls = source.calls();
        assert_eq!(calls.len(), 2);
        // backoff is 100ms, but the limiter still enforces 500ms between grants
        assert!(calls[1].1 - calls[0].1 >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn second_platform_exhaustion_fails_whole_cycle_once() {
        let source = Arc::new(ScriptedSource::new(vec![
            (Platform::Gamepad, Ok(())),
            (Platform::KeyboardMouse, Err(FetchError::transient_server("500"))),
            (Platform::KeyboardMouse, Err(FetchError::transient_server("500"))),
            (Platform::KeyboardMouse, Err(FetchError::transient_server("500"))),
        ]));
        let coordinator = RefreshCoordinator::new(player(), source.clone(), &policy());

        let error = coordinator.refresh(&both_platforms()).await.expect_err("cycle must fail");

        assert_eq!(error.code(), "refresh.retries_exhausted");
        assert!(matches!(
            error,
            RefreshError::Platform {
                platform: Platform::KeyboardMouse,
                ..
            }
        ));
        assert_eq!(source.calls().len(), 4);
        assert_eq!(coordinator.circuit_breaker().consecutive_failures(), 1);
        assert_eq!(coordinator.latest(), None);
        assert!(coordinator.health().last_error.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_failure_aborts_remaining_platforms() {
        let source = Arc::new(ScriptedSource::new(vec![(
            Platform::Gamepad,
            Err(FetchError::not_found("no such player")),
        )]));
        let coordinator = RefreshCoordinator::new(player(), source.clone(), &policy());

        let error = coordinator.refresh(&both_platforms()).await.expect_err("cycle must fail");

        assert_eq!(error.code(), "refresh.platform_failed");
        assert_eq!(source.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn open_breaker_skips_the_network_without_accounting() {
        let source = Arc::new(ScriptedSource::new(Vec::new()));
        let coordinator = RefreshCoordinator::new(player(), source.clone(), &policy());
        for _ in 0..5 {
            coordinator.circuit_breaker().record_failure();
        }

        let error = coordinator.refresh(&both_platforms()).await.expect_err("cycle must fail");

        assert_eq!(error, RefreshError::BreakerOpen);
        assert!(source.calls().is_empty());
        assert_eq!(coordinator.circuit_breaker().consecutive_failures(), 5);
        assert_eq!(coordinator.health().circuit_state, CircuitState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_cycle_keeps_previous_snapshot() {
        let source = Arc::new(ScriptedSource::new(vec![
            (Platform::Gamepad, Ok(())),
            (Platform::Gamepad, Err(FetchError::auth("revoked"))),
        ]));
        let coordinator = RefreshCoordinator::new(player(), source, &policy());
        let request = RefreshRequest::new([Platform::Gamepad], [GameMode::Solo]).expect("valid");

        let first = coordinator.refresh(&request).await.expect("first cycle succeeds");
        coordinator.refresh(&request).await.expect_err("second cycle fails");

        assert_eq!(coordinator.latest(), Some(first));
    }

    #[tokio::test(start_paused = true)]
    async fn fallback_serves_synthetic_snapshot_when_live_cycle_fails() {
        let source = Arc::new(ScriptedSource::new(vec![(
            Platform::Gamepad,
            Err(FetchError::auth("revoked")),
        )]));
        let coordinator = RefreshCoordinator::new(player(), source, &policy())
            .with_fallback(Arc::new(SyntheticSource::new(player()).without_variation()));
        let request = RefreshRequest::new([Platform::Gamepad], [GameMode::Solo]).expect("valid");

        let snapshot = coordinator.refresh(&request).await.expect("fallback should serve");

        assert!(!snapshot.is_live());
        assert_eq!(
            snapshot.record(Platform::Gamepad, GameMode::Solo).map(|record| record.kills),
            Some(202)
        );
        assert_eq!(coordinator.circuit_breaker().consecutive_failures(), 1);
        assert_eq!(coordinator.latest(), None);
    }

    #[test]
    fn live_config_without_api_key_is_rejected() {
        let config = StatsConfig::new(player()).with_source(SourceMode::LiveWithFallback);
        let client: Arc<dyn HttpClient> = Arc::new(crate::http_client::ReqwestHttpClient::new());

        let error = RefreshCoordinator::from_config(&config, client).expect_err("must fail");
        assert!(matches!(error, ConfigError::Missing { .. }));
    }

    #[tokio::test]
    async fn synthetic_config_needs_no_http() {
        struct UnreachableHttpClient;

        impl HttpClient for UnreachableHttpClient {
            fn execute<'a>(
                &'a self,
                _request: HttpRequest,
            ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
                panic!("synthetic mode must not touch the network")
            }
        }

        let config = StatsConfig::new(player()).with_source(SourceMode::Synthetic);
        let coordinator =
            RefreshCoordinator::from_config(&config, Arc::new(UnreachableHttpClient))
                .expect("valid config");

        let snapshot = coordinator
            .refresh(&config.refresh_request().expect("valid request"))
            .await
            .expect("synthetic cycle succeeds");

        assert!(!snapshot.is_live());
        assert_eq!(snapshot.platforms(), &[Platform::Gamepad, Platform::KeyboardMouse]);
        assert_eq!(coordinator.health().source, SourceKind::Synthetic);
    }
}
