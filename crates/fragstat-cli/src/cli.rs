//! CLI argument definitions for fragstat.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `refresh` | Run one refresh cycle and print the snapshot |
//! | `rollup` | Run one refresh cycle and print aggregate roll-ups |
//! | `watch` | Refresh on the scan interval, printing roll-ups every cycle |
//! | `health` | Print coordinator health after one refresh cycle |
//!
//! # Configuration
//!
//! Settings come from `--config <file.json>` when given, otherwise from the
//! `FRAGSTAT_*` environment variables. Flags override either source.
//!
//! # Examples
//!
//! ```bash
//! FRAGSTAT_API_KEY=... FRAGSTAT_PLAYER_ID=Captain_Crunch88 fragstat refresh --pretty
//! fragstat --source synthetic --player Captain_Crunch88 rollup --preset console_all_modes
//! fragstat --config fragstat.json watch --cycles 12
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use fragstat_core::SourceMode;

/// Rate-limited Fortnite stats poller.
#[derive(Debug, Parser)]
#[command(name = "fragstat", author, version, about = "Rate-limited Fortnite stats poller")]
pub struct Cli {
    /// JSON config file. The API key may be omitted there and read from FRAGSTAT_API_KEY.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Player id, overriding the configured one.
    #[arg(long, global = true)]
    pub player: Option<String>,

    /// Platforms to poll (aliases such as pc, xbox, psn are accepted).
    #[arg(long = "platform", global = true, value_delimiter = ',')]
    pub platforms: Vec<String>,

    /// Game modes to poll.
    #[arg(long = "mode", global = true, value_delimiter = ',')]
    pub modes: Vec<String>,

    /// Data source, overriding the configured one.
    #[arg(long, global = true, value_enum)]
    pub source: Option<SourceSelector>,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceSelector {
    /// fortnite-api.com only.
    Live,
    /// Built-in baseline data, no network.
    Synthetic,
    /// Live, serving synthetic data when a cycle fails.
    LiveWithFallback,
}

impl From<SourceSelector> for SourceMode {
    fn from(value: SourceSelector) -> Self {
        match value {
            SourceSelector::Live => Self::Live,
            SourceSelector::Synthetic => Self::Synthetic,
            SourceSelector::LiveWithFallback => Self::LiveWithFallback,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one refresh cycle and print the snapshot.
    Refresh,

    /// Run one refresh cycle and print roll-ups.
    ///
    ///   fragstat rollup
    ///   fragstat rollup --preset pc_all_modes
    ///   fragstat rollup --preset all_platforms_solo --metric kd
    Rollup(RollupArgs),

    /// Act as a scheduling host: refresh every scan interval and print roll-ups.
    Watch(WatchArgs),

    /// Run one refresh cycle and print coordinator health.
    Health,
}

#[derive(Debug, Clone, Args)]
pub struct RollupArgs {
    /// Preset to compute; all presets when omitted.
    #[arg(long)]
    pub preset: Option<String>,

    /// Single metric to print instead of the full roll-up.
    #[arg(long)]
    pub metric: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct WatchArgs {
    /// Number of cycles to run.
    #[arg(long, default_value_t = 1)]
    pub cycles: u32,

    /// Seconds between cycles, overriding the configured scan interval.
    #[arg(long)]
    pub interval_secs: Option<u64>,

    #[command(flatten)]
    pub rollup: RollupArgs,
}
