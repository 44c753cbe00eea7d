use anyhow::{Context, Result};
use google_calendar::types::SendUpdates;
use lnsync_core::remote::protocol::CreateEvent;

use crate::commands::client_for;
use crate::convert::ToGoogle;
use crate::retry::with_retry;

/// Returns the id Google assigned to the new event.
pub async fn handle(cmd: CreateEvent) -> Result<String> {
    let client = client_for(&cmd.params).await?;
    let google_event = cmd.event.to_google();

    let created = with_retry("insert event", || async {
        Ok(client
            .events()
            .insert(
                &cmd.calendar_id,
                0,
                0,
                false,
                SendUpdates::None,
                false,
                &google_event,
            )
            .await
            .with_context(|| format!("Failed to create event: {}", &google_event.summary))?
            .body)
    })
    .await?;

    Ok(created.id)
}
