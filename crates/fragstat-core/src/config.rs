//! Poller configuration loaded from the environment or a JSON file.

use std::fmt::{Display, Formatter};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::coordinator::RefreshRequest;
use crate::fetcher::{DEFAULT_ACCOUNT_TYPE, DEFAULT_BASE_URL, DEFAULT_TIME_WINDOW};
use crate::policy::UpstreamPolicy;
use crate::{ConfigError, GameMode, Platform, PlayerId, ValidationError};

pub const ENV_API_KEY: &str = "FRAGSTAT_API_KEY";
pub const ENV_PLAYER_ID: &str = "FRAGSTAT_PLAYER_ID";
pub const ENV_PLATFORMS: &str = "FRAGSTAT_PLATFORMS";
pub const ENV_MODES: &str = "FRAGSTAT_MODES";
pub const ENV_SOURCE: &str = "FRAGSTAT_SOURCE";
pub const ENV_BASE_URL: &str = "FRAGSTAT_BASE_URL";

pub const DEFAULT_SCAN_INTERVAL_SECS: u64 = 300;

/// Where refresh data comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    #[default]
    Live,
    Synthetic,
    /// Live, serving synthetic data whenever a live cycle cannot complete.
    LiveWithFallback,
}

impl SourceMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Synthetic => "synthetic",
            Self::LiveWithFallback => "live_with_fallback",
        }
    }

    pub const fn requires_api_key(self) -> bool {
        !matches!(self, Self::Synthetic)
    }
}

impl Display for SourceMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceMode {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "live" | "api" => Ok(Self::Live),
            "synthetic" | "mock" => Ok(Self::Synthetic),
            "live_with_fallback" | "hybrid" => Ok(Self::LiveWithFallback),
            _ => Err(ValidationError::InvalidSourceMode {
                value: value.to_owned(),
            }),
        }
    }
}

/// Everything a coordinator needs to poll one player.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsConfig {
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    pub player_id: PlayerId,
    #[serde(default = "default_platforms")]
    pub platforms: Vec<Platform>,
    #[serde(default = "default_modes")]
    pub modes: Vec<GameMode>,
    #[serde(default = "default_account_type")]
    pub account_type: String,
    #[serde(default = "default_time_window")]
    pub time_window: String,
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,
    #[serde(default)]
    pub source: SourceMode,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_platforms() -> Vec<Platform> {
    vec![Platform::Gamepad, Platform::KeyboardMouse]
}

fn default_modes() -> Vec<GameMode> {
    GameMode::DEFAULTS.to_vec()
}

fn default_account_type() -> String {
    DEFAULT_ACCOUNT_TYPE.to_owned()
}

fn default_time_window() -> String {
    DEFAULT_TIME_WINDOW.to_owned()
}

fn default_scan_interval_secs() -> u64 {
    DEFAULT_SCAN_INTERVAL_SECS
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

impl StatsConfig {
    pub fn new(player_id: PlayerId) -> Self {
        Self {
            api_key: None,
            player_id,
            platforms: default_platforms(),
            modes: default_modes(),
            account_type: default_account_type(),
            time_window: default_time_window(),
            scan_interval_secs: default_scan_interval_secs(),
            source: SourceMode::default(),
            base_url: default_base_url(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_source(mut self, source: SourceMode) -> Self {
        self.source = source;
        self
    }

    /// Reads `FRAGSTAT_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let player_id = read(ENV_PLAYER_ID).ok_or(ConfigError::Missing {
            name: ENV_PLAYER_ID,
        })?;
        let mut config = Self::new(PlayerId::parse(&player_id)?);

        config.api_key = read(ENV_API_KEY);
        if let Some(platforms) = read(ENV_PLATFORMS) {
            config.platforms = parse_list(&platforms)?;
        }
        if let Some(modes) = read(ENV_MODES) {
            config.modes = parse_list(&modes)?;
        }
        if let Some(source) = read(ENV_SOURCE) {
            config.source = source.parse()?;
        }
        if let Some(base_url) = read(ENV_BASE_URL) {
            config.base_url = base_url;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Parses a JSON document. An absent `api_key` is left empty so keys can stay out
    /// of files; see [`Self::with_env_api_key`].
    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Fills an absent API key from `FRAGSTAT_API_KEY`.
    pub fn with_env_api_key(mut self) -> Self {
        if self.api_key.is_none() {
            self.api_key = std::env::var(ENV_API_KEY)
                .ok()
                .filter(|value| !value.trim().is_empty());
        }
        self
    }

    /// The API key, required by every source mode except synthetic.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        match self.api_key.as_deref() {
            Some(key) => Ok(key),
            None if self.source.requires_api_key() => {
                Err(ConfigError::Missing { name: ENV_API_KEY })
            }
            None => Ok(""),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.platforms.is_empty() {
            return Err(ValidationError::EmptyPlatforms.into());
        }
        if self.modes.is_empty() {
            return Err(ValidationError::EmptyModes.into());
        }
        Ok(())
    }

    pub fn refresh_request(&self) -> Result<RefreshRequest, ValidationError> {
        RefreshRequest::new(self.platforms.iter().copied(), self.modes.iter().copied())
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs.max(1))
    }

    pub fn policy(&self) -> UpstreamPolicy {
        match self.source {
            SourceMode::Synthetic => UpstreamPolicy::synthetic(),
            SourceMode::Live | SourceMode::LiveWithFallback => {
                UpstreamPolicy::fortnite_api_default()
            }
        }
    }
}

impl std::fmt::Debug for StatsConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("player_id", &self.player_id)
            .field("platforms", &self.platforms)
            .field("modes", &self.modes)
            .field("account_type", &self.account_type)
            .field("time_window", &self.time_window)
            .field("scan_interval_secs", &self.scan_interval_secs)
            .field("source", &self.source)
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn parse_list<T>(value: &str) -> Result<Vec<T>, ValidationError>
where
    T: FromStr<Err = ValidationError>,
{
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::parse)
        .collect()
}
