//! How a `CalendarEntry` is rendered on the destination.
//!
//! The same functions feed both event creation and the equivalence
//! check, so an event created from an entry always compares equal to it
//! under the same options.

use crate::config::SyncOptions;
use crate::entry::CalendarEntry;
use crate::event::{EventDraft, Reminder, Reminders, Visibility};
use crate::sync_key::SyncKey;
use crate::text;

/// Subject as it should appear on the destination.
pub fn subject(entry: &CalendarEntry, options: &SyncOptions) -> String {
    match &options.subject_override {
        Some(value) => text::truncate(value, text::MAX_SUBJECT_CHARS),
        None => text::clean_subject(&entry.subject),
    }
}

/// Description as it should appear on the destination. Empty when
/// nothing is synced into it.
pub fn description(entry: &CalendarEntry, options: &SyncOptions) -> String {
    let mut lines: Vec<String> = Vec::new();

    if options.sync_attendees {
        let labelled = [
            ("Chairperson", &entry.chairperson),
            ("Required", &entry.required_attendees),
            ("Optional", &entry.optional_attendees),
        ];
        for (label, names) in labelled {
            if let Some(names) = names {
                lines.push(format!("{}: {}", label, text::plain_names(names)));
            }
        }
    }

    let mut description = lines.join("\n");

    if let (true, Some(body)) = (options.sync_description, &entry.body) {
        if !description.is_empty() {
            description.push_str("\n\n\n");
        }
        description.push_str(body.replace('\r', "").trim());
    }

    text::truncate(&description, text::MAX_DESCRIPTION_CHARS)
}

/// Location as it should appear on the destination.
pub fn location(entry: &CalendarEntry, options: &SyncOptions) -> Option<String> {
    if !options.sync_location {
        return None;
    }
    entry
        .where_string()
        .map(|w| text::strip_control(&w))
        .filter(|w| !w.is_empty())
}

pub fn reminders(entry: &CalendarEntry, options: &SyncOptions) -> Reminders {
    if !options.sync_alarms {
        return Reminders::default();
    }

    Reminders {
        use_default: false,
        overrides: if entry.has_alarm {
            vec![Reminder {
                minutes: i64::from(entry.alarm_offset_minutes),
            }]
        } else {
            Vec::new()
        },
    }
}

pub fn visibility(entry: &CalendarEntry) -> Visibility {
    if entry.is_private {
        Visibility::Private
    } else {
        Visibility::Default
    }
}

/// Build the event to insert for `entry`, tagged with a fresh unique id
/// that embeds `key`.
pub fn draft_event(entry: &CalendarEntry, key: &SyncKey, options: &SyncOptions) -> EventDraft {
    let description = description(entry, options);

    EventDraft {
        ical_uid: key.attach_to(),
        summary: subject(entry, options),
        description: (!description.is_empty()).then_some(description),
        location: location(entry, options),
        start: entry.start_time(),
        end: entry.end_time(),
        reminders: reminders(entry, options),
        visibility: visibility(entry),
    }
}
