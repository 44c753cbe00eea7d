//! JSON protocol spoken between lnsync and provider binaries over
//! stdin/stdout. One request line in, one response line out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::adapter::{CalendarHandle, EventPage};
use crate::entry::NativeRecord;
use crate::event::EventDraft;

pub trait ProviderCommand: Serialize {
    type Response: DeserializeOwned;
    fn command() -> Command;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Authenticate,
    ListEntries,
    FindCalendar,
    EnsureCalendar,
    ListEvents,
    CreateEvent,
    DeleteEvent,
}

/// Request sent from lnsync to a provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub command: Command,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Response sent from a provider to lnsync.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response<T> {
    Success { data: T },
    Error { error: String },
}

impl<T: Serialize> Response<T> {
    pub fn success(data: T) -> String {
        serde_json::to_string(&Response::Success { data })
            .unwrap_or_else(|e| Response::<()>::error(&format!("Failed to serialize response: {}", e)))
    }
}

impl Response<()> {
    pub fn error(msg: &str) -> String {
        serde_json::json!({ "status": "error", "error": msg }).to_string()
    }
}

/// Run the provider's interactive login.
#[derive(Debug, Serialize, Deserialize)]
pub struct Authenticate {
    #[serde(flatten)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl ProviderCommand for Authenticate {
    type Response = String; // Account identifier (e.g., email)
    fn command() -> Command {
        Command::Authenticate
    }
}

/// List raw calendar documents from a source provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListEntries {
    #[serde(flatten)]
    pub params: serde_json::Map<String, serde_json::Value>,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl ProviderCommand for ListEntries {
    type Response = Vec<NativeRecord>;
    fn command() -> Command {
        Command::ListEntries
    }
}

/// Look the destination calendar up by name without creating it.
#[derive(Debug, Serialize, Deserialize)]
pub struct FindCalendar {
    #[serde(flatten)]
    pub params: serde_json::Map<String, serde_json::Value>,
    pub name: String,
}

impl ProviderCommand for FindCalendar {
    type Response = Option<CalendarHandle>;
    fn command() -> Command {
        Command::FindCalendar
    }
}

/// Find the destination calendar by name, creating it if missing.
#[derive(Debug, Serialize, Deserialize)]
pub struct EnsureCalendar {
    #[serde(flatten)]
    pub params: serde_json::Map<String, serde_json::Value>,
    pub name: String,
    /// Time zone for a newly created calendar.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl ProviderCommand for EnsureCalendar {
    type Response = CalendarHandle;
    fn command() -> Command {
        Command::EnsureCalendar
    }
}

/// List one page of events within a time range.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListEvents {
    #[serde(flatten)]
    pub params: serde_json::Map<String, serde_json::Value>,
    pub calendar_id: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
}

impl ProviderCommand for ListEvents {
    type Response = EventPage;
    fn command() -> Command {
        Command::ListEvents
    }
}

/// Create a new event.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateEvent {
    #[serde(flatten)]
    pub params: serde_json::Map<String, serde_json::Value>,
    pub calendar_id: String,
    pub event: EventDraft,
}

impl ProviderCommand for CreateEvent {
    type Response = String; // Destination-assigned event id
    fn command() -> Command {
        Command::CreateEvent
    }
}

/// Delete an event by ID.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteEvent {
    #[serde(flatten)]
    pub params: serde_json::Map<String, serde_json::Value>,
    pub calendar_id: String,
    pub event_id: String,
}

impl ProviderCommand for DeleteEvent {
    type Response = ();
    fn command() -> Command {
        Command::DeleteEvent
    }
}
