use lnsync_core::event::{EventDraft, EventTime, Visibility};

use super::ToGoogle;

impl ToGoogle<google_calendar::types::Event> for EventDraft {
    fn to_google(&self) -> google_calendar::types::Event {
        let visibility = match self.visibility {
            Visibility::Private => "private",
            Visibility::Default => "default",
        };

        let reminders = google_calendar::types::Reminders {
            use_default: self.reminders.use_default,
            overrides: self
                .reminders
                .overrides
                .iter()
                .map(|r| google_calendar::types::EventReminder {
                    method: "popup".to_string(),
                    minutes: r.minutes,
                })
                .collect(),
        };

        // Google assigns the event id; only the iCal UID is ours
        google_calendar::types::Event {
            i_cal_uid: self.ical_uid.clone(),
            summary: self.summary.clone(),
            description: self.description.clone().unwrap_or_default(),
            location: self.location.clone().unwrap_or_default(),
            start: Some(self.start.to_google()),
            end: Some(self.end.to_google()),
            status: "confirmed".to_string(),
            visibility: visibility.to_string(),
            reminders: Some(reminders),
            ..Default::default()
        }
    }
}

impl ToGoogle<google_calendar::types::EventDateTime> for EventTime {
    fn to_google(&self) -> google_calendar::types::EventDateTime {
        match self {
            EventTime::Date(d) => google_calendar::types::EventDateTime {
                date: Some(*d),
                date_time: None,
                time_zone: String::new(),
            },
            EventTime::DateTime(dt) => google_calendar::types::EventDateTime {
                date: None,
                date_time: Some(*dt),
                time_zone: String::new(),
            },
        }
    }
}
