use anyhow::{Context, Result};
use google_calendar::types::SendUpdates;
use lnsync_core::remote::protocol::DeleteEvent;

use crate::commands::client_for;
use crate::retry::with_retry;

pub async fn handle(cmd: DeleteEvent) -> Result<()> {
    let client = client_for(&cmd.params).await?;

    let result = with_retry("delete event", || async {
        client
            .events()
            .delete(&cmd.calendar_id, &cmd.event_id, false, SendUpdates::None)
            .await
            .map(|_| ())
            .map_err(anyhow::Error::from)
    })
    .await;

    match result {
        Ok(()) => Ok(()),
        Err(e) if is_already_gone(&e) => {
            tracing::debug!(event_id = %cmd.event_id, "event already deleted");
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to delete event: {}", cmd.event_id)),
    }
}

fn is_already_gone(err: &anyhow::Error) -> bool {
    let message = err.to_string();
    message.contains("410") || message.contains("Gone")
}
