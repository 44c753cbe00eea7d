//! The two sides of a sync pass.
//!
//! The orchestrator only talks to these traits. Concrete adapters run a
//! provider binary, read an export file, or (in tests) hold events in
//! memory.

mod export_file;
mod provider;

pub use export_file::ExportFileSource;
pub use provider::{ProviderDestination, ProviderSource};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::entry::CalendarEntry;
use crate::error::{SyncError, SyncResult};
use crate::event::{DestinationEvent, EventDraft, EventStatus};
use crate::window::SyncWindow;

/// A destination calendar found or created by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarHandle {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub time_zone: Option<String>,
}

/// One page of a destination listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventPage {
    pub events: Vec<DestinationEvent>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Normalized entries whose start falls inside `window`.
    async fn fetch_entries(&self, window: &SyncWindow) -> SyncResult<Vec<CalendarEntry>>;
}

#[async_trait]
pub trait DestinationAdapter: Send + Sync {
    /// The calendar called `name`, if it exists. Never creates it.
    async fn find_calendar(&self, name: &str) -> SyncResult<Option<CalendarHandle>>;

    async fn ensure_calendar(&self, name: &str) -> SyncResult<CalendarHandle>;

    async fn list_events_page(
        &self,
        calendar: &CalendarHandle,
        window: &SyncWindow,
        page_token: Option<&str>,
    ) -> SyncResult<EventPage>;

    /// Every live event in `window`, following continuation tokens until
    /// the listing is exhausted. Cancelled events are dropped.
    async fn list_events(
        &self,
        calendar: &CalendarHandle,
        window: &SyncWindow,
    ) -> SyncResult<Vec<DestinationEvent>> {
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self
                .list_events_page(calendar, window, page_token.as_deref())
                .await?;
            pages += 1;
            tracing::debug!(page = pages, count = page.events.len(), "listed event page");

            events.extend(
                page.events
                    .into_iter()
                    .filter(|e| e.status != EventStatus::Cancelled),
            );

            match page.next_page_token {
                Some(next) if page_token.as_deref() == Some(next.as_str()) => {
                    return Err(SyncError::DestFetch(format!(
                        "listing repeated page token '{}'",
                        next
                    )));
                }
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        Ok(events)
    }

    /// Insert a new event, returning its destination id.
    async fn create_event(&self, calendar: &CalendarHandle, draft: &EventDraft) -> SyncResult<String>;

    async fn delete_event(&self, calendar: &CalendarHandle, event_id: &str) -> SyncResult<()>;
}
