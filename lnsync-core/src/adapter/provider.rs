//! Adapters backed by provider binaries.

use async_trait::async_trait;

use crate::adapter::{CalendarHandle, DestinationAdapter, EventPage, SourceAdapter};
use crate::entry::CalendarEntry;
use crate::error::{SyncError, SyncResult};
use crate::event::EventDraft;
use crate::normalize;
use crate::remote::protocol::{
    CreateEvent, DeleteEvent, EnsureCalendar, FindCalendar, ListEntries, ListEvents,
};
use crate::remote::{CallSettings, Provider, ProviderParams};
use crate::window::SyncWindow;

type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Reads Notes documents from a source provider such as `lnsync-provider-notes`.
pub struct ProviderSource {
    provider: Provider,
    params: ProviderParams,
    settings: CallSettings,
}

impl ProviderSource {
    pub fn new(provider: Provider, params: ProviderParams, settings: CallSettings) -> Self {
        ProviderSource {
            provider,
            params,
            settings,
        }
    }
}

#[async_trait]
impl SourceAdapter for ProviderSource {
    async fn fetch_entries(&self, window: &SyncWindow) -> SyncResult<Vec<CalendarEntry>> {
        let records = self
            .provider
            .call(
                ListEntries {
                    params: JsonMap::from(&self.params),
                    from: window.min_start,
                    to: window.max_end,
                },
                &self.settings,
            )
            .await
            .map_err(|e| SyncError::SourceFetch(e.to_string()))?;

        tracing::debug!(provider = self.provider.name(), records = records.len(), "fetched source records");

        Ok(normalize::normalize_all(records, window).entries)
    }
}

/// Writes to a destination calendar through a provider such as
/// `lnsync-provider-google`.
pub struct ProviderDestination {
    provider: Provider,
    params: ProviderParams,
    settings: CallSettings,
    time_zone: Option<String>,
}

impl ProviderDestination {
    pub fn new(provider: Provider, params: ProviderParams, settings: CallSettings) -> Self {
        ProviderDestination {
            provider,
            params,
            settings,
            time_zone: None,
        }
    }

    /// Time zone to use if the calendar has to be created.
    pub fn with_time_zone(mut self, time_zone: Option<String>) -> Self {
        self.time_zone = time_zone;
        self
    }

    fn params(&self) -> JsonMap {
        JsonMap::from(&self.params)
    }
}

#[async_trait]
impl DestinationAdapter for ProviderDestination {
    async fn find_calendar(&self, name: &str) -> SyncResult<Option<CalendarHandle>> {
        self.provider
            .call(
                FindCalendar {
                    params: self.params(),
                    name: name.to_string(),
                },
                &self.settings,
            )
            .await
    }

    async fn ensure_calendar(&self, name: &str) -> SyncResult<CalendarHandle> {
        self.provider
            .call(
                EnsureCalendar {
                    params: self.params(),
                    name: name.to_string(),
                    time_zone: self.time_zone.clone(),
                },
                &self.settings,
            )
            .await
    }

    async fn list_events_page(
        &self,
        calendar: &CalendarHandle,
        window: &SyncWindow,
        page_token: Option<&str>,
    ) -> SyncResult<EventPage> {
        self.provider
            .call(
                ListEvents {
                    params: self.params(),
                    calendar_id: calendar.id.clone(),
                    from: window.min_start,
                    to: window.max_end,
                    page_token: page_token.map(str::to_string),
                },
                &self.settings,
            )
            .await
            .map_err(|e| SyncError::DestFetch(e.to_string()))
    }

    async fn create_event(&self, calendar: &CalendarHandle, draft: &EventDraft) -> SyncResult<String> {
        self.provider
            .call(
                CreateEvent {
                    params: self.params(),
                    calendar_id: calendar.id.clone(),
                    event: draft.clone(),
                },
                &self.settings,
            )
            .await
            .map_err(|e| SyncError::DestWrite(format!("create '{}': {}", draft.summary, e)))
    }

    async fn delete_event(&self, calendar: &CalendarHandle, event_id: &str) -> SyncResult<()> {
        self.provider
            .call(
                DeleteEvent {
                    params: self.params(),
                    calendar_id: calendar.id.clone(),
                    event_id: event_id.to_string(),
                },
                &self.settings,
            )
            .await
            .map_err(|e| SyncError::DestWrite(format!("delete {}: {}", event_id, e)))
    }
}
