//! Turns raw Notes calendar documents into `CalendarEntry` values.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, Utc};
use regex::Regex;

use crate::entry::{CalendarEntry, EntryKind, NativeRecord};
use crate::error::{SyncError, SyncResult};
use crate::text;
use crate::window::SyncWindow;

const NO_SUBJECT: &str = "<no subject>";

/// Links to external calendars carry a URL in their appointment UNID.
static EXTERNAL_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(https?|notes):").expect("EXTERNAL_LINK regex should compile")
});

/// Result of normalizing a batch of records.
#[derive(Debug, Default)]
pub struct Normalized {
    pub entries: Vec<CalendarEntry>,
    pub rejected: Vec<SyncError>,
}

/// Normalize every record, collecting the ones that could not be read
/// instead of failing the batch.
pub fn normalize_all(records: Vec<NativeRecord>, window: &SyncWindow) -> Normalized {
    let mut normalized = Normalized::default();

    for record in records {
        match normalize(&record, window) {
            Ok(entries) => normalized.entries.extend(entries),
            Err(e) => {
                tracing::warn!(error = %e, "skipping source record");
                normalized.rejected.push(e);
            }
        }
    }

    tracing::debug!(
        entries = normalized.entries.len(),
        rejected = normalized.rejected.len(),
        "normalized source records"
    );

    normalized
}

/// Normalize one record into zero or more entries.
///
/// Repeating records expand into one entry per occurrence inside the
/// window. Records linking to external calendars produce nothing.
pub fn normalize(record: &NativeRecord, window: &SyncWindow) -> SyncResult<Vec<CalendarEntry>> {
    let source_id = record.universal_id.trim();
    if source_id.is_empty() {
        return Err(SyncError::malformed("<unknown>", "record has no universal id"));
    }
    let malformed = |reason: &str| SyncError::malformed(source_id, reason);

    if non_empty(&record.appt_unid).is_some_and(is_external_link) {
        tracing::debug!(source_id, "ignoring link to external calendar");
        return Ok(Vec::new());
    }

    let kind = entry_kind(record).map_err(|reason| malformed(&reason))?;
    let modified_at = record
        .last_modified
        .ok_or_else(|| malformed("record has no last-modified time"))?;

    let starts = if !record.start_date_time.is_empty() {
        &record.start_date_time
    } else if !record.calendar_date_time.is_empty() {
        &record.calendar_date_time
    } else {
        return Err(malformed("no start date"));
    };

    let template = EntryTemplate {
        source_id: source_id.to_string(),
        kind,
        modified_at,
        record,
    };

    // Only StartDateTime marks a repeating record. The CalendarDateTime
    // fallback (tasks) always yields a single entry at its first value.
    let repeating = record.start_date_time.len() > 1;

    if repeating {
        let ends = if record.end_date_time.is_empty() {
            tracing::debug!(source_id, "no end dates on repeating record, using start dates");
            starts
        } else if record.end_date_time.len() != starts.len() {
            return Err(malformed("repeating start and end dates do not pair up"));
        } else {
            &record.end_date_time
        };

        Ok(starts
            .iter()
            .zip(ends)
            .filter(|(start, _)| window.contains(*start))
            .map(|(start, end)| template.build(*start, *end, true))
            .collect())
    } else {
        let start = starts[0];
        let end = record
            .end_date_time
            .first()
            .copied()
            .or(record.end_date)
            .unwrap_or(start);

        if window.contains(&start) {
            Ok(vec![template.build(start, end, false)])
        } else {
            Ok(Vec::new())
        }
    }
}

struct EntryTemplate<'a> {
    source_id: String,
    kind: EntryKind,
    modified_at: DateTime<Utc>,
    record: &'a NativeRecord,
}

impl EntryTemplate<'_> {
    fn build(
        &self,
        start_at: DateTime<FixedOffset>,
        end_at: DateTime<FixedOffset>,
        occurrence: bool,
    ) -> CalendarEntry {
        let record = self.record;
        let has_alarm = non_empty(&record.alarm).is_some();

        CalendarEntry {
            source_id: self.source_id.clone(),
            kind: self.kind,
            subject: non_empty(&record.subject)
                .map(text::clean_subject)
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| NO_SUBJECT.to_string()),
            body: non_empty(&record.body).map(|b| b.replace('\r', "")),
            location: non_empty(&record.location).map(str::to_string),
            room: non_empty(&record.room).map(str::to_string),
            start_at,
            end_at: if self.kind == EntryKind::Reminder {
                start_at
            } else {
                end_at
            },
            occurrence,
            modified_at: self.modified_at,
            has_alarm,
            alarm_offset_minutes: if has_alarm {
                non_empty(&record.alarm_offset)
                    .and_then(alarm_minutes_before)
                    .unwrap_or(0)
            } else {
                0
            },
            is_private: non_empty(&record.org_confidential) == Some("1"),
            chairperson: non_empty(&record.chair).map(str::to_string),
            required_attendees: non_empty(&record.required_attendees).map(str::to_string),
            optional_attendees: non_empty(&record.optional_attendees).map(str::to_string),
        }
    }
}

fn entry_kind(record: &NativeRecord) -> Result<EntryKind, String> {
    match non_empty(&record.form) {
        None | Some("Appointment") => {
            match non_empty(&record.appointment_type) {
                Some("0") => Ok(EntryKind::Appointment),
                Some("1") => Ok(EntryKind::Anniversary),
                Some("2") => Ok(EntryKind::AllDayEvent),
                Some("3") => Ok(EntryKind::Meeting),
                Some("4") => Ok(EntryKind::Reminder),
                Some(other) => Err(format!("unknown appointment type '{}'", other)),
                None => Err("appointment has no appointment type".to_string()),
            }
        }
        Some("Task") => Ok(EntryKind::Task),
        Some(other) => Err(format!("unsupported form '{}'", other)),
    }
}

/// Notes stores the alarm as minutes relative to the start, negative
/// meaning before. Some locales write a decimal comma, and long offsets
/// come back as values like `-94.9999999999998`.
fn alarm_minutes_before(raw: &str) -> Option<u32> {
    let offset: f64 = raw.trim().replace(',', ".").parse().ok()?;
    let before = -offset.round();
    if before.is_finite() && before > 0.0 {
        Some(before.min(f64::from(u32::MAX)) as u32)
    } else {
        Some(0)
    }
}

fn is_external_link(unid: &str) -> bool {
    EXTERNAL_LINK.is_match(unid)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}
