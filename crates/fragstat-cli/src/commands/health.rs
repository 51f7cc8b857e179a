use serde::Serialize;

use fragstat_core::{CoordinatorHealth, RefreshError};

use crate::error::CliError;
use crate::output;

use super::Session;

#[derive(Debug, Serialize)]
struct HealthResponseData {
    refreshed: bool,
    error_code: Option<&'static str>,
    health: CoordinatorHealth,
}

/// Probes the upstream with one cycle; a failed cycle is reported, not raised.
pub async fn run(session: &Session, pretty: bool) -> Result<(), CliError> {
    let outcome = session.coordinator.refresh(&session.request).await;
    let error_code = outcome.as_ref().err().map(RefreshError::code);

    output::render(
        &HealthResponseData {
            refreshed: outcome.is_ok(),
            error_code,
            health: session.coordinator.health(),
        },
        pretty,
    )
}
