//! Live stats source backed by the fortnite-api.com `v2/stats/br/v2` endpoint.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::http_client::{HttpAuth, HttpClient, HttpRequest, HttpResponse};
use crate::policy::UpstreamPolicy;
use crate::sanitize::sanitize;
use crate::source::{FetchFuture, PlatformStats, SourceKind, StatsSource};
use crate::{FetchError, GameMode, Platform, PlayerId, StatsRecord, UtcDateTime};

pub const DEFAULT_BASE_URL: &str = "https://fortnite-api.com";
pub const STATS_PATH: &str = "/v2/stats/br/v2";
pub const DEFAULT_ACCOUNT_TYPE: &str = "epic";
pub const DEFAULT_TIME_WINDOW: &str = "lifetime";

/// Performs one authenticated stats request per platform and turns the payload into
/// per-mode [`StatsRecord`]s.
pub struct EndpointFetcher {
    http_client: Arc<dyn HttpClient>,
    auth: HttpAuth,
    player: PlayerId,
    base_url: String,
    account_type: String,
    time_window: String,
    policy: UpstreamPolicy,
}

impl EndpointFetcher {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        api_key: impl Into<String>,
        player: PlayerId,
    ) -> Self {
        Self {
            http_client,
            auth: HttpAuth::ApiKey(api_key.into()),
            player,
            base_url: DEFAULT_BASE_URL.to_owned(),
            account_type: DEFAULT_ACCOUNT_TYPE.to_owned(),
            time_window: DEFAULT_TIME_WINDOW.to_owned(),
            policy: UpstreamPolicy::fortnite_api_default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_account_type(mut self, account_type: impl Into<String>) -> Self {
        self.account_type = account_type.into();
        self
    }

    pub fn with_time_window(mut self, time_window: impl Into<String>) -> Self {
        self.time_window = time_window.into();
        self
    }

    pub fn with_policy(mut self, policy: UpstreamPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn player(&self) -> &PlayerId {
        &self.player
    }

    pub fn request_for(&self, platform: Platform) -> HttpRequest {
        HttpRequest::get(format!("{}{}", self.base_url, STATS_PATH))
            .with_query("name", self.player.as_str())
            .with_query("accountType", self.account_type.as_str())
            .with_query("timeWindow", self.time_window.as_str())
            .with_query("image", platform.image_key())
            .with_auth(&self.auth)
            .with_timeout(self.policy.request_timeout)
    }

    /// One request, no retries. A 429 pauses for the (capped) `Retry-After` before
    /// returning [`crate::FetchErrorKind::RateLimited`].
    pub async fn fetch(
        &self,
        platform: Platform,
        modes: &[GameMode],
    ) -> Result<PlatformStats, FetchError> {
        let request = self.request_for(platform);
        tracing::debug!(platform = %platform, "requesting stats");

        let response = self.http_client.execute(request).await.map_err(|error| {
            if error.timed_out() {
                FetchError::transport(format!(
                    "request to stats endpoint timed out: {}",
                    error.message()
                ))
            } else {
                FetchError::transport(format!(
                    "stats endpoint transport error: {}",
                    error.message()
                ))
            }
        })?;

        self.classify(&response).await?;

        let payload: Value = serde_json::from_str(&response.body)
            .map_err(|e| FetchError::upstream(format!("failed to parse stats response: {}", e)))?;

        transform(&sanitize(payload), &self.player, platform, modes)
    }

    async fn classify(&self, response: &HttpResponse) -> Result<(), FetchError> {
        match response.status {
            status if (200..300).contains(&status) => Ok(()),
            401 => Err(FetchError::auth("stats endpoint rejected the api key (401)")),
            404 => Err(FetchError::not_found(format!(
                "player '{}' not found or stats are private (404)",
                self.player
            ))),
            429 => {
                let pause = self.policy.retry_after_pause(response.retry_after());
                tracing::warn!(
                    pause_ms = pause.as_millis() as u64,
                    "stats endpoint rate limited the client; pausing"
                );
                tokio::time::sleep(pause).await;
                Err(FetchError::rate_limited("stats endpoint returned 429").with_retry_after(pause))
            }
            status @ 500..=599 => Err(FetchError::transient_server(format!(
                "stats endpoint returned status {}",
                status
            ))),
            status => Err(FetchError::upstream(format!(
                "stats endpoint returned unexpected status {}",
                status
            ))),
        }
    }
}

impl std::fmt::Debug for EndpointFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointFetcher")
            .field("auth", &self.auth)
            .field("player", &self.player)
            .field("base_url", &self.base_url)
            .field("account_type", &self.account_type)
            .field("time_window", &self.time_window)
            .finish_non_exhaustive()
    }
}

impl StatsSource for EndpointFetcher {
    fn kind(&self) -> SourceKind {
        SourceKind::Live
    }

    fn fetch_platform<'a>(&'a self, platform: Platform, modes: &'a [GameMode]) -> FetchFuture<'a> {
        Box::pin(self.fetch(platform, modes))
    }
}

/// Converts a (sanitized) stats payload into one record per requested mode.
///
/// A payload whose `status` is not 200, or that lacks a `data` object, is an
/// application-level error. Modes missing from the payload yield zeroed records.
pub fn transform(
    payload: &Value,
    player: &PlayerId,
    platform: Platform,
    modes: &[GameMode],
) -> Result<PlatformStats, FetchError> {
    let status = payload.get("status").and_then(Value::as_u64);
    if status != Some(200) {
        let message = payload
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(FetchError::upstream(format!("stats api returned error: {}", message)));
    }

    let data = payload
        .get("data")
        .and_then(Value::as_object)
        .ok_or_else(|| FetchError::upstream("stats payload has no data object"))?;

    let empty = Map::new();
    let platform_stats = data
        .get("stats")
        .and_then(|stats| stats.get(platform.image_key()))
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    Ok(modes
        .iter()
        .map(|&mode| {
            let stats = platform_stats
                .get(mode.as_str())
                .and_then(Value::as_object)
                .unwrap_or(&empty);
            (mode, record_from(stats, player, platform, mode))
        })
        .collect())
}

fn record_from(
    stats: &Map<String, Value>,
    player: &PlayerId,
    platform: Platform,
    mode: GameMode,
) -> StatsRecord {
    StatsRecord {
        id: StatsRecord::record_id(player, platform, mode),
        kills: count(stats, "kills"),
        matches: count(stats, "matches"),
        win_ratio: (ratio(stats, "winRate") / 100.0).clamp(0.0, 1.0),
        kd: ratio(stats, "kd"),
        kills_per_match: ratio(stats, "killsPerMatch"),
        top1: count(stats, "wins"),
        top3: count(stats, "top3"),
        top5: count(stats, "top5"),
        top6: count(stats, "top6"),
        top10: count(stats, "top10"),
        top12: count(stats, "top12"),
        top25: count(stats, "top25"),
        score: count(stats, "score"),
        score_per_match: ratio(stats, "scorePerMatch"),
        minutes_played: count(stats, "minutesPlayed"),
        last_modified: stats
            .get("lastModified")
            .and_then(Value::as_str)
            .and_then(UtcDateTime::from_upstream),
    }
}

fn count(stats: &Map<String, Value>, field: &str) -> u64 {
    match stats.get(field) {
        Some(value) => value
            .as_u64()
            .unwrap_or_else(|| ratio_value(value) as u64),
        None => 0,
    }
}

fn ratio(stats: &Map<String, Value>, field: &str) -> f64 {
    stats.get(field).map(ratio_value).unwrap_or(0.0)
}

fn ratio_value(value: &Value) -> f64 {
    match value.as_f64() {
        Some(number) if number.is_finite() && number >= 0.0 => number,
        _ => 0.0,
    }
}
