//! Calendar entries read from the Notes side.
//!
//! `NativeRecord` is the raw document shape handed over by a source
//! provider. `CalendarEntry` is its normalized form: one value per
//! occurrence, immutable once built.

use std::fmt;

use chrono::{DateTime, Days, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::event::EventTime;

/// The kind of a calendar entry. Drives date handling on the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Appointment,
    Meeting,
    Reminder,
    AllDayEvent,
    Anniversary,
    Task,
}

impl EntryKind {
    /// Kinds that are synced as date-only events.
    pub fn is_all_day(&self) -> bool {
        matches!(
            self,
            EntryKind::AllDayEvent | EntryKind::Anniversary | EntryKind::Task
        )
    }

    /// Single-letter code used inside sync keys.
    pub fn code(&self) -> char {
        match self {
            EntryKind::Appointment => 'A',
            EntryKind::Meeting => 'M',
            EntryKind::Reminder => 'R',
            EntryKind::AllDayEvent => 'D',
            EntryKind::Anniversary => 'N',
            EntryKind::Task => 'T',
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "A" => Some(EntryKind::Appointment),
            "M" => Some(EntryKind::Meeting),
            "R" => Some(EntryKind::Reminder),
            "D" => Some(EntryKind::AllDayEvent),
            "N" => Some(EntryKind::Anniversary),
            "T" => Some(EntryKind::Task),
            _ => None,
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntryKind::Appointment => "appointment",
            EntryKind::Meeting => "meeting",
            EntryKind::Reminder => "reminder",
            EntryKind::AllDayEvent => "all-day event",
            EntryKind::Anniversary => "anniversary",
            EntryKind::Task => "task",
        };
        write!(f, "{}", name)
    }
}

/// A normalized calendar entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub source_id: String,
    pub kind: EntryKind,
    pub subject: String,
    pub body: Option<String>,
    pub location: Option<String>,
    pub room: Option<String>,
    pub start_at: DateTime<FixedOffset>,
    pub end_at: DateTime<FixedOffset>,
    /// Set when this entry is one expanded occurrence of a repeating record.
    pub occurrence: bool,
    pub modified_at: DateTime<Utc>,
    pub has_alarm: bool,
    /// Minutes before `start_at`.
    pub alarm_offset_minutes: u32,
    pub is_private: bool,
    pub chairperson: Option<String>,
    pub required_attendees: Option<String>,
    pub optional_attendees: Option<String>,
}

impl CalendarEntry {
    /// Location and room folded into a single string.
    pub fn where_string(&self) -> Option<String> {
        match (self.location.as_deref(), self.room.as_deref()) {
            (Some(location), Some(room)) => Some(format!("{}, {}", location, room)),
            (Some(location), None) => Some(location.to_string()),
            (None, Some(room)) => Some(room.to_string()),
            (None, None) => None,
        }
    }

    /// Start as sent to the destination.
    pub fn start_time(&self) -> EventTime {
        if self.kind.is_all_day() {
            EventTime::Date(self.start_at.date_naive())
        } else {
            EventTime::DateTime(self.start_at.with_timezone(&Utc))
        }
    }

    /// End as sent to the destination. Date-only ends are exclusive, so
    /// they land one day after the source's end date.
    pub fn end_time(&self) -> EventTime {
        if self.kind.is_all_day() {
            let end = self.end_at.date_naive();
            EventTime::Date(end.checked_add_days(Days::new(1)).unwrap_or(end))
        } else {
            EventTime::DateTime(self.end_at.with_timezone(&Utc))
        }
    }
}

/// A calendar document as exported by a Notes source provider.
///
/// Field names follow the document items they are read from. Empty
/// strings are treated the same as missing items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeRecord {
    pub universal_id: String,
    pub last_modified: Option<DateTime<Utc>>,
    /// Document form, `Appointment` or `Task`.
    pub form: Option<String>,
    /// `0` appointment, `1` anniversary, `2` all-day event, `3` meeting, `4` reminder.
    pub appointment_type: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub location: Option<String>,
    pub room: Option<String>,
    /// `$Alarm`
    pub alarm: Option<String>,
    /// `$AlarmOffset`, minutes relative to the start. May use a decimal comma.
    pub alarm_offset: Option<String>,
    pub org_confidential: Option<String>,
    pub required_attendees: Option<String>,
    pub optional_attendees: Option<String>,
    pub chair: Option<String>,
    pub appt_unid: Option<String>,
    pub start_date_time: Vec<DateTime<FixedOffset>>,
    pub calendar_date_time: Vec<DateTime<FixedOffset>>,
    pub end_date_time: Vec<DateTime<FixedOffset>>,
    pub end_date: Option<DateTime<FixedOffset>>,
}
