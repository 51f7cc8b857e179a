use serde::Serialize;

use fragstat_core::{aggregate, rollup, AggregatePreset, Metric, Rollup, Snapshot};

use crate::cli::RollupArgs;
use crate::error::CliError;
use crate::output;

use super::Session;

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RollupResponseData {
    Presets {
        live: bool,
        rollups: Vec<Rollup>,
    },
    Metric {
        live: bool,
        preset: AggregatePreset,
        metric: Metric,
        value: f64,
    },
}

pub async fn run(args: &RollupArgs, session: &Session, pretty: bool) -> Result<(), CliError> {
    let snapshot = session.coordinator.refresh(&session.request).await?;
    output::render(&build(args, &snapshot)?, pretty)
}

/// Roll-ups selected by `args`: every preset, one preset, or one metric of a preset.
pub fn build(args: &RollupArgs, snapshot: &Snapshot) -> Result<RollupResponseData, CliError> {
    let preset = args
        .preset
        .as_deref()
        .map(str::parse::<AggregatePreset>)
        .transpose()?;
    let metric = args.metric.as_deref().map(str::parse::<Metric>).transpose()?;

    Ok(match (preset, metric) {
        (preset, Some(metric)) => {
            let preset = preset.unwrap_or(AggregatePreset::AllPlatformsAllModes);
            RollupResponseData::Metric {
                live: snapshot.is_live(),
                preset,
                metric,
                value: aggregate(snapshot, &preset.selection(), metric),
            }
        }
        (Some(preset), None) => RollupResponseData::Presets {
            live: snapshot.is_live(),
            rollups: vec![rollup(snapshot, preset)],
        },
        (None, None) => RollupResponseData::Presets {
            live: snapshot.is_live(),
            rollups: AggregatePreset::ALL
                .into_iter()
                .map(|preset| rollup(snapshot, preset))
                .collect(),
        },
    })
}
