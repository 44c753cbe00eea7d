use anyhow::{Context, Result};
use google_calendar::Client;
use google_calendar::types::{CalendarListEntry, MinAccessRole};
use lnsync_core::adapter::CalendarHandle;
use lnsync_core::remote::protocol::FindCalendar;

use crate::commands::client_for;
use crate::convert::FromGoogle;
use crate::retry::with_retry;

pub async fn handle(cmd: FindCalendar) -> Result<Option<CalendarHandle>> {
    let client = client_for(&cmd.params).await?;

    lookup(&client, &cmd.name)
        .await?
        .map(CalendarHandle::from_google)
        .transpose()
}

/// The calendar list entry whose summary is `name`, if any.
pub async fn lookup(client: &Client, name: &str) -> Result<Option<CalendarListEntry>> {
    let calendars = with_retry("list calendars", || async {
        Ok(client
            .calendar_list()
            .list_all(MinAccessRole::default(), false, false)
            .await
            .context("Failed to fetch calendars")?
            .body)
    })
    .await?;

    Ok(find_by_summary(calendars, name))
}

fn find_by_summary(calendars: Vec<CalendarListEntry>, name: &str) -> Option<CalendarListEntry> {
    calendars
        .into_iter()
        .find(|c| !c.deleted && c.summary == name)
}
