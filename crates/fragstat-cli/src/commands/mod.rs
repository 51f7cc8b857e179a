mod health;
mod refresh;
mod rollup;
mod watch;

use std::sync::Arc;

use fragstat_core::{
    config, GameMode, Platform, PlayerId, RefreshCoordinator, RefreshRequest, ReqwestHttpClient,
    SourceMode, StatsConfig,
};

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// Loaded configuration plus the coordinator built from it.
pub struct Session {
    pub config: StatsConfig,
    pub request: RefreshRequest,
    pub coordinator: RefreshCoordinator,
}

impl Session {
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let config = load_config(cli)?;
        let request = config.refresh_request()?;
        let coordinator =
            RefreshCoordinator::from_config(&config, Arc::new(ReqwestHttpClient::new()))?;
        tracing::debug!(?config, "configuration loaded");

        Ok(Self {
            config,
            request,
            coordinator,
        })
    }
}

pub async fn run(cli: &Cli) -> Result<(), CliError> {
    let session = Session::from_cli(cli)?;

    match &cli.command {
        Command::Refresh => refresh::run(&session, cli.pretty).await,
        Command::Rollup(args) => rollup::run(args, &session, cli.pretty).await,
        Command::Watch(args) => watch::run(args, &session, cli.pretty).await,
        Command::Health => health::run(&session, cli.pretty).await,
    }
}

/// Config file (or environment), then command-line overrides.
fn load_config(cli: &Cli) -> Result<StatsConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => StatsConfig::from_json_file(path)?.with_env_api_key(),
        None => {
            let player = cli.player.clone();
            let source = cli.source.map(|source| SourceMode::from(source).as_str().to_owned());
            StatsConfig::from_lookup(|name| match name {
                config::ENV_PLAYER_ID if player.is_some() => player.clone(),
                config::ENV_SOURCE if source.is_some() => source.clone(),
                _ => std::env::var(name).ok(),
            })?
        }
    };

    if let Some(player) = &cli.player {
        config.player_id = PlayerId::parse(player)?;
    }
    if let Some(source) = cli.source {
        config.source = source.into();
    }
    if !cli.platforms.is_empty() {
        config.platforms = cli
            .platforms
            .iter()
            .map(|raw| raw.parse::<Platform>())
            .collect::<Result<Vec<_>, _>>()?;
    }
    if !cli.modes.is_empty() {
        config.modes = cli
            .modes
            .iter()
            .map(|raw| raw.parse::<GameMode>())
            .collect::<Result<Vec<_>, _>>()?;
    }

    config.validate()?;
    Ok(config)
}
