//! The sync window: the span of time a pass looks at on both sides.

use chrono::{DateTime, Days, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Inclusive time range `[min_start, max_end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncWindow {
    pub min_start: DateTime<Utc>,
    pub max_end: DateTime<Utc>,
}

impl SyncWindow {
    pub fn new(min_start: DateTime<Utc>, max_end: DateTime<Utc>) -> Self {
        SyncWindow { min_start, max_end }
    }

    /// From midnight `days_past` days before `now` to 23:59:59 `days_future`
    /// days after it, in `now`'s time zone.
    pub fn around<Tz: TimeZone>(now: &DateTime<Tz>, days_past: u32, days_future: u32) -> Self {
        let today = now.date_naive();
        let first = today
            .checked_sub_days(Days::new(days_past.into()))
            .unwrap_or(today);
        let last = today
            .checked_add_days(Days::new(days_future.into()))
            .unwrap_or(today);

        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);

        SyncWindow {
            min_start: local_to_utc(&now.timezone(), first.and_time(NaiveTime::MIN)),
            max_end: local_to_utc(&now.timezone(), last.and_time(end_of_day)),
        }
    }

    pub fn contains<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> bool {
        let at = at.with_timezone(&Utc);
        at >= self.min_start && at <= self.max_end
    }
}

// Local times skipped by a DST jump fall back to reading the wall time as UTC.
fn local_to_utc<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}
