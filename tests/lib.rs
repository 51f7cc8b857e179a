// Shared fixtures for the behavior tests: a scripted HTTP upstream and payload builders.
use std::collections::{BTreeMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};

use serde_json::{json, Value};
use tokio::time::Instant;

pub use fragstat_core::{
    HttpClient, HttpError, HttpRequest, HttpResponse, PlayerId, StatsConfig, UpstreamPolicy,
};
pub use std::sync::Arc;

pub const PLAYER: &str = "test_player";

pub fn player() -> PlayerId {
    PlayerId::parse(PLAYER).expect("fixture player id is valid")
}

/// Live config with a dummy key, ready for `RefreshCoordinator::from_config`.
pub fn live_config() -> StatsConfig {
    StatsConfig::new(player()).with_api_key("test-key")
}

/// Upstream fake that replays responses per `image` bucket and records every request.
///
/// A bucket with no scripted responses left answers with a transport error.
#[derive(Debug, Default)]
pub struct ScriptedHttpClient {
    scripts: Mutex<BTreeMap<String, VecDeque<Result<HttpResponse, HttpError>>>>,
    requests: Mutex<Vec<(HttpRequest, Instant)>>,
}

impl ScriptedHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, image: &str, responses: Vec<Result<HttpResponse, HttpError>>) -> Self {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(image.to_owned())
            .or_default()
            .extend(responses);
        self
    }

    pub fn requests(&self) -> Vec<(HttpRequest, Instant)> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn request_count_for(&self, image: &str) -> usize {
        self.requests()
            .iter()
            .filter(|(request, _)| request.query_param("image") == Some(image))
            .count()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let image = request.query_param("image").unwrap_or_default().to_owned();
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((request, Instant::now()));
        let response = self
            .scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&image)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(HttpError::new(format!("no scripted response for '{image}'"))));
        Box::pin(async move { response })
    }
}

/// Upstream per-mode stats object with the fields roll-ups use.
pub fn mode_stats(kills: u64, matches: u64, wins: u64) -> Value {
    let win_rate = if matches == 0 {
        0.0
    } else {
        100.0 * wins as f64 / matches as f64
    };
    json!({
        "kills": kills,
        "matches": matches,
        "wins": wins,
        "winRate": win_rate,
        "kd": 0.0,
        "top10": wins * 2,
        "top25": wins * 3,
        "score": kills * 100,
        "minutesPlayed": matches * 12,
        "lastModified": "2024-03-01T12:30:00Z"
    })
}

/// Successful stats response body holding one platform bucket.
pub fn stats_body(image: &str, modes: &[(&str, Value)]) -> String {
    let modes: serde_json::Map<String, Value> = modes
        .iter()
        .map(|(mode, stats)| ((*mode).to_owned(), stats.clone()))
        .collect();
    json!({
        "status": 200,
        "data": {
            "account": { "id": "4735ce9132924caf8a5b17789b40f79c", "name": PLAYER },
            "stats": { image: modes }
        }
    })
    .to_string()
}

pub fn ok(body: String) -> Result<HttpResponse, HttpError> {
    Ok(HttpResponse::ok_json(body))
}

pub fn status(code: u16) -> Result<HttpResponse, HttpError> {
    Ok(HttpResponse::new(code, "{}"))
}
