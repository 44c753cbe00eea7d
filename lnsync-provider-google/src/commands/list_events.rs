use anyhow::{Context, Result};
use google_calendar::types::OrderBy;
use lnsync_core::adapter::EventPage;
use lnsync_core::event::{DestinationEvent, EventStatus};
use lnsync_core::remote::protocol::ListEvents;

use crate::commands::client_for;
use crate::convert::FromGoogle;
use crate::retry::with_retry;

/// Lists the whole window in one page; `list_all` follows Google's page
/// tokens itself.
pub async fn handle(cmd: ListEvents) -> Result<EventPage> {
    let client = client_for(&cmd.params).await?;

    let time_min = cmd.from.to_rfc3339();
    let time_max = cmd.to.to_rfc3339();

    let google_events = with_retry("list events", || async {
        Ok(client
            .events()
            .list_all(
                &cmd.calendar_id,
                "",
                0,
                OrderBy::default(),
                &[],
                "", // search query
                &[],
                false,
                false,
                true, // expand recurring events into instances
                &time_max,
                &time_min,
                "",
                "",
            )
            .await
            .context("Failed to fetch events")?
            .body)
    })
    .await?;

    let mut events = Vec::with_capacity(google_events.len());
    for google_event in google_events {
        let id = google_event.id.clone();
        match DestinationEvent::from_google(google_event) {
            Ok(event) if event.status == EventStatus::Cancelled => {}
            Ok(event) => events.push(event),
            Err(e) => tracing::warn!(event_id = %id, error = %e, "skipping unreadable event"),
        }
    }

    Ok(EventPage {
        events,
        next_page_token: None,
    })
}
