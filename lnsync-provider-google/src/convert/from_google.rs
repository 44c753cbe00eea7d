use anyhow::{Result, bail};
use lnsync_core::adapter::CalendarHandle;
use lnsync_core::event::{DestinationEvent, EventStatus, EventTime, Reminder, Reminders, Visibility};

use super::FromGoogle;

impl FromGoogle<google_calendar::types::Event> for DestinationEvent {
    fn from_google(event: google_calendar::types::Event) -> Result<Self> {
        let Some(start) = event.start.as_ref().and_then(event_time_from_google) else {
            bail!("Event {} has no start time", event.id);
        };
        let Some(end) = event.end.as_ref().and_then(event_time_from_google) else {
            bail!("Event {} has no end time", event.id);
        };

        let status = match event.status.as_str() {
            "tentative" => EventStatus::Tentative,
            "cancelled" => EventStatus::Cancelled,
            _ => EventStatus::Confirmed,
        };

        let visibility = match event.visibility.as_str() {
            "private" | "confidential" => Visibility::Private,
            _ => Visibility::Default,
        };

        let reminders = match event.reminders {
            Some(rem) => Reminders {
                use_default: rem.use_default,
                overrides: rem
                    .overrides
                    .iter()
                    .map(|r| Reminder { minutes: r.minutes })
                    .collect(),
            },
            None => Reminders::default(),
        };

        Ok(DestinationEvent {
            id: event.id,
            ical_uid: event.i_cal_uid,
            summary: event.summary,
            description: non_empty(event.description),
            location: non_empty(event.location),
            start,
            end,
            status,
            reminders,
            visibility,
        })
    }
}

impl FromGoogle<google_calendar::types::CalendarListEntry> for CalendarHandle {
    fn from_google(entry: google_calendar::types::CalendarListEntry) -> Result<Self> {
        Ok(CalendarHandle {
            id: entry.id,
            name: entry.summary,
            time_zone: non_empty(entry.time_zone),
        })
    }
}

impl FromGoogle<google_calendar::types::Calendar> for CalendarHandle {
    fn from_google(calendar: google_calendar::types::Calendar) -> Result<Self> {
        if calendar.id.is_empty() {
            bail!("Google returned calendar '{}' without an id", calendar.summary);
        }
        Ok(CalendarHandle {
            id: calendar.id,
            name: calendar.summary,
            time_zone: non_empty(calendar.time_zone),
        })
    }
}

fn event_time_from_google(time: &google_calendar::types::EventDateTime) -> Option<EventTime> {
    match (time.date_time, time.date) {
        (Some(dt), _) => Some(EventTime::DateTime(dt)),
        (None, Some(d)) => Some(EventTime::Date(d)),
        (None, None) => None,
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}
