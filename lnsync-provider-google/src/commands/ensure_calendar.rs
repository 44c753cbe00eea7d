use anyhow::{Context, Result};
use lnsync_core::adapter::CalendarHandle;
use lnsync_core::remote::protocol::EnsureCalendar;

use crate::commands::client_for;
use crate::commands::find_calendar::lookup;
use crate::convert::FromGoogle;

pub async fn handle(cmd: EnsureCalendar) -> Result<CalendarHandle> {
    let client = client_for(&cmd.params).await?;

    if let Some(existing) = lookup(&client, &cmd.name).await? {
        tracing::debug!(calendar = %existing.id, "found destination calendar");
        return CalendarHandle::from_google(existing);
    }

    tracing::info!(name = %cmd.name, "creating destination calendar");

    let new_calendar = google_calendar::types::Calendar {
        summary: cmd.name.clone(),
        time_zone: cmd.time_zone.clone().unwrap_or_default(),
        ..Default::default()
    };

    // Not retried: a lost response would leave a second calendar behind
    let created = client
        .calendars()
        .insert(&new_calendar)
        .await
        .with_context(|| format!("Failed to create calendar: {}", cmd.name))?
        .body;

    CalendarHandle::from_google(created)
}
