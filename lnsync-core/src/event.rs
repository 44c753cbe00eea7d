//! Destination-side event types.
//!
//! Providers convert their API objects into these types, and the
//! reconciler only ever sees them.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// An event as it currently exists on the destination calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationEvent {
    /// Destination-assigned id, used for deletes.
    pub id: String,
    /// Unique identifier field carrying the embedded sync key.
    pub ical_uid: String,
    pub summary: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub reminders: Reminders,
    #[serde(default)]
    pub visibility: Visibility,
}

impl DestinationEvent {
    pub fn has_location(&self) -> bool {
        self.location.as_deref().is_some_and(|l| !l.is_empty())
    }
}

/// A new event to be inserted on the destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    pub ical_uid: String,
    pub summary: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
    pub reminders: Reminders,
    pub visibility: Visibility,
}

impl EventDraft {
    /// The event the destination holds once this draft is inserted as `id`.
    pub fn into_event(self, id: String) -> DestinationEvent {
        DestinationEvent {
            id,
            ical_uid: self.ical_uid,
            summary: self.summary,
            description: self.description,
            location: self.location,
            start: self.start,
            end: self.end,
            status: EventStatus::Confirmed,
            reminders: self.reminders,
            visibility: self.visibility,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventTime {
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventTime::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M UTC")),
            EventTime::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl EventTime {
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            EventTime::DateTime(dt) => *dt,
            EventTime::Date(d) => d.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    #[default]
    Confirmed,
    Tentative,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Default,
    Private,
}

/// Reminder settings of an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminders {
    /// Whether the calendar's default reminders apply.
    pub use_default: bool,
    #[serde(default)]
    pub overrides: Vec<Reminder>,
}

impl Default for Reminders {
    fn default() -> Self {
        Reminders {
            use_default: true,
            overrides: Vec::new(),
        }
    }
}

impl Reminders {
    /// True when the event carries its own reminder instead of the defaults.
    pub fn has_override(&self) -> bool {
        !self.use_default && !self.overrides.is_empty()
    }
}

/// A popup reminder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    /// Minutes before the event to trigger
    pub minutes: i64,
}
