use serde::Serialize;

use fragstat_core::Snapshot;

use crate::error::CliError;
use crate::output;

use super::Session;

#[derive(Debug, Serialize)]
struct RefreshResponseData<'a> {
    snapshot: &'a Snapshot,
}

pub async fn run(session: &Session, pretty: bool) -> Result<(), CliError> {
    let snapshot = session.coordinator.refresh(&session.request).await?;
    output::render(
        &RefreshResponseData {
            snapshot: snapshot.as_ref(),
        },
        pretty,
    )
}
