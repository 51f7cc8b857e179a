use std::sync::Arc;
use std::time::Duration;

use fragstat_core::Snapshot;

use crate::cli::WatchArgs;
use crate::error::CliError;
use crate::output;

use super::rollup;
use super::Session;

/// Minimal scheduling host: one cycle per interval, printing roll-ups of the newest
/// good snapshot. Failed cycles are logged and the previous snapshot is reused.
pub async fn run(args: &WatchArgs, session: &Session, pretty: bool) -> Result<(), CliError> {
    let interval = args
        .interval_secs
        .map(Duration::from_secs)
        .unwrap_or_else(|| session.config.scan_interval())
        .max(Duration::from_secs(1));
    let cycles = args.cycles.max(1);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let mut served: Option<Arc<Snapshot>> = None;
    for cycle in 1..=cycles {
        ticker.tick().await;

        match session.coordinator.refresh(&session.request).await {
            Ok(snapshot) => served = Some(snapshot),
            Err(error) => {
                tracing::warn!(
                    cycle,
                    code = error.code(),
                    error = %error,
                    "cycle failed; keeping last snapshot"
                );
                served = session.coordinator.latest().or(served);
            }
        }

        match &served {
            Some(snapshot) => output::render(&rollup::build(&args.rollup, snapshot)?, pretty)?,
            None => tracing::warn!(cycle, "no snapshot available yet"),
        }
    }

    if served.is_none() {
        return Err(CliError::NoSnapshot { cycles });
    }
    Ok(())
}
