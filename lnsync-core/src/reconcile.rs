//! Diff between the Notes entries of a pass and the events already on
//! the destination calendar.
//!
//! Entries and events are paired by sync key. A pair whose rendered
//! fields still agree under the current options is left alone; anything
//! else is replaced: the stale event is deleted and the entry created
//! again. Destination events without a sync key belong to someone else
//! and never show up in the plan.
//!
//! Start and end times are not part of the comparison. A time change on
//! the Notes side also bumps the modified time, which changes the key.

use std::collections::HashMap;
use std::fmt;

use crate::config::SyncOptions;
use crate::entry::CalendarEntry;
use crate::error::SyncError;
use crate::event::DestinationEvent;
use crate::render;
use crate::sync_key::SyncKey;

/// An entry that has no equivalent event yet.
#[derive(Debug, Clone)]
pub struct PendingCreate {
    pub entry: CalendarEntry,
    pub key: SyncKey,
}

/// What a pass has to do to bring the destination in line.
#[derive(Debug, Default)]
pub struct SyncPlan {
    pub to_create: Vec<PendingCreate>,
    pub to_delete: Vec<DestinationEvent>,
    /// Pairs that matched and need no change.
    pub unchanged: usize,
    /// Destination events not owned by lnsync.
    pub foreign: usize,
    /// Entries that could not be keyed. Skipped.
    pub rejected: Vec<SyncError>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_delete.is_empty()
    }
}

/// Why a candidate pair is not equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mismatch {
    Subject,
    Location,
    Reminder,
    Description,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = match self {
            Mismatch::Subject => "subject",
            Mismatch::Location => "location",
            Mismatch::Reminder => "reminder",
            Mismatch::Description => "description",
        };
        write!(f, "{} differs", field)
    }
}

/// Build the plan for one pass.
///
/// Entries are visited in order. For each one the first unmatched event
/// with the same key that is also equivalent is claimed; duplicates on
/// the destination are therefore tolerated and the extras deleted.
pub fn reconcile(
    entries: Vec<CalendarEntry>,
    events: Vec<DestinationEvent>,
    options: &SyncOptions,
) -> SyncPlan {
    let mut plan = SyncPlan::default();

    let mut owned: Vec<DestinationEvent> = Vec::with_capacity(events.len());
    let mut by_key: HashMap<SyncKey, Vec<usize>> = HashMap::new();

    for event in events {
        match SyncKey::extract(&event.ical_uid) {
            Some(key) => {
                by_key.entry(key).or_default().push(owned.len());
                owned.push(event);
            }
            None => plan.foreign += 1,
        }
    }

    let mut claimed = vec![false; owned.len()];

    for entry in entries {
        let key = match SyncKey::encode(&entry) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(error = %e, "cannot key source entry");
                plan.rejected.push(e);
                continue;
            }
        };

        let matched = by_key.get(&key).and_then(|candidates| {
            candidates.iter().copied().find(|&idx| {
                if claimed[idx] {
                    return false;
                }
                match compare(&entry, &owned[idx], options) {
                    Ok(()) => true,
                    Err(mismatch) => {
                        tracing::debug!(%key, %mismatch, "candidate not equivalent");
                        false
                    }
                }
            })
        });

        match matched {
            Some(idx) => {
                claimed[idx] = true;
                plan.unchanged += 1;
            }
            None => plan.to_create.push(PendingCreate { entry, key }),
        }
    }

    plan.to_delete = owned
        .into_iter()
        .zip(claimed)
        .filter(|(_, claimed)| !claimed)
        .map(|(event, _)| event)
        .collect();

    tracing::debug!(
        create = plan.to_create.len(),
        delete = plan.to_delete.len(),
        unchanged = plan.unchanged,
        foreign = plan.foreign,
        "reconciled"
    );

    plan
}

/// Whether `event` is what `entry` would be rendered as under `options`.
pub fn is_equivalent(entry: &CalendarEntry, event: &DestinationEvent, options: &SyncOptions) -> bool {
    compare(entry, event, options).is_ok()
}

/// Compare field by field, stopping at the first difference.
pub fn compare(
    entry: &CalendarEntry,
    event: &DestinationEvent,
    options: &SyncOptions,
) -> Result<(), Mismatch> {
    if event.summary != render::subject(entry, options) {
        return Err(Mismatch::Subject);
    }

    // Only presence is compared; the destination may reformat the text.
    if event.has_location() != render::location(entry, options).is_some() {
        return Err(Mismatch::Location);
    }

    let wants_override = options.sync_alarms && entry.has_alarm;
    if event.reminders.has_override() != wants_override {
        return Err(Mismatch::Reminder);
    }

    if event.description.as_deref().unwrap_or_default() != render::description(entry, options) {
        return Err(Mismatch::Description);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::tests::{sample_entry, ts};
    use crate::event::{EventStatus, EventTime, Reminder, Reminders, Visibility};
    use chrono::{Duration, TimeZone, Utc};

    /// Play a plan against an in-memory calendar, the way a destination would.
    fn apply(
        plan: SyncPlan,
        mut calendar: Vec<DestinationEvent>,
        options: &SyncOptions,
    ) -> Vec<DestinationEvent> {
        calendar.retain(|event| !plan.to_delete.iter().any(|d| d.id == event.id));
        for pending in plan.to_create {
            let draft = render::draft_event(&pending.entry, &pending.key, options);
            calendar.push(draft.into_event(format!("evt-{}", pending.key)));
        }
        calendar
    }

    fn synced(entries: &[CalendarEntry], options: &SyncOptions) -> Vec<DestinationEvent> {
        let plan = reconcile(entries.to_vec(), Vec::new(), options);
        apply(plan, Vec::new(), options)
    }

    fn foreign_event() -> DestinationEvent {
        DestinationEvent {
            id: "g1".into(),
            ical_uid: "7kukuqrr2oh2mtvb2rfbf0c2bk@google.com".into(),
            summary: "Dentist".into(),
            description: None,
            location: None,
            start: EventTime::DateTime(Utc.with_ymd_and_hms(2024, 3, 5, 8, 0, 0).unwrap()),
            end: EventTime::DateTime(Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap()),
            status: EventStatus::Confirmed,
            reminders: Reminders::default(),
            visibility: Visibility::Default,
        }
    }

    fn three_entries() -> Vec<CalendarEntry> {
        let mut second = sample_entry("B2");
        second.subject = "Review".into();
        second.location = Some("HQ".into());
        second.has_alarm = true;
        second.alarm_offset_minutes = 10;

        let mut third = sample_entry("C3");
        third.subject = "Offsite".into();
        third.body = Some("Bring laptop".into());

        vec![sample_entry("A1"), second, third]
    }

    #[test]
    fn test_fresh_destination_creates_everything() {
        let options = SyncOptions::default();
        let plan = reconcile(three_entries(), Vec::new(), &options);

        assert_eq!(plan.to_create.len(), 3);
        assert!(plan.to_delete.is_empty());
        assert_eq!(plan.unchanged, 0);
    }

    #[test]
    fn test_no_changes_is_a_no_op() {
        let options = SyncOptions::default();
        let calendar = synced(&three_entries(), &options);

        let plan = reconcile(three_entries(), calendar, &options);
        assert!(plan.is_empty(), "{:?}", plan);
        assert_eq!(plan.unchanged, 3);
    }

    #[test]
    fn test_edit_replaces_event() {
        let options = SyncOptions::default();
        let calendar = synced(&three_entries(), &options);

        let mut entries = three_entries();
        entries[1].subject = "Review (moved)".into();
        entries[1].modified_at = entries[1].modified_at + Duration::hours(1);

        let plan = reconcile(entries, calendar, &options);
        assert_eq!(plan.to_create.len(), 1);
        assert_eq!(plan.to_create[0].entry.subject, "Review (moved)");
        assert_eq!(plan.to_delete.len(), 1);
        assert_eq!(plan.to_delete[0].summary, "Review");
        assert_eq!(plan.unchanged, 2);
    }

    #[test]
    fn test_removed_entry_is_deleted() {
        let options = SyncOptions::default();
        let calendar = synced(&three_entries(), &options);

        let mut entries = three_entries();
        entries.remove(0);

        let plan = reconcile(entries, calendar, &options);
        assert!(plan.to_create.is_empty());
        assert_eq!(plan.to_delete.len(), 1);
        assert_eq!(plan.to_delete[0].summary, "Team sync");
    }

    #[test]
    fn test_foreign_events_are_never_touched() {
        let options = SyncOptions::default();
        let mut calendar = synced(&three_entries(), &options);
        calendar.push(foreign_event());

        let plan = reconcile(three_entries(), calendar.clone(), &options);
        assert!(plan.is_empty());
        assert_eq!(plan.foreign, 1);

        // Even with no source entries at all
        let plan = reconcile(Vec::new(), calendar, &options);
        assert_eq!(plan.to_delete.len(), 3);
        assert!(plan.to_delete.iter().all(|e| e.id != "g1"));
        assert_eq!(plan.foreign, 1);
    }

    #[test]
    fn test_applying_a_plan_converges() {
        let options = SyncOptions::default();
        let mut calendar = synced(&three_entries(), &options);
        calendar.push(foreign_event());

        let mut entries = three_entries();
        entries[0].modified_at = entries[0].modified_at + Duration::minutes(1);
        entries.push(sample_entry("D4"));

        let plan = reconcile(entries.clone(), calendar.clone(), &options);
        let calendar = apply(plan, calendar, &options);

        let plan = reconcile(entries, calendar, &options);
        assert!(plan.is_empty());
        assert_eq!(plan.unchanged, 4);
        assert_eq!(plan.foreign, 1);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let options = SyncOptions::default();
        let calendar = synced(&three_entries()[..2], &options);

        let first = reconcile(three_entries(), calendar.clone(), &options);
        let second = reconcile(three_entries(), calendar, &options);

        assert_eq!(first.to_create.len(), second.to_create.len());
        assert_eq!(
            first.to_create.iter().map(|p| &p.key).collect::<Vec<_>>(),
            second.to_create.iter().map(|p| &p.key).collect::<Vec<_>>()
        );
        assert_eq!(first.to_delete, second.to_delete);
    }

    #[test]
    fn test_alarm_option_change_recreates_alarmed_entries() {
        let on = SyncOptions::default();
        let calendar = synced(&three_entries(), &on);

        let off = SyncOptions {
            sync_alarms: false,
            ..Default::default()
        };
        let plan = reconcile(three_entries(), calendar, &off);

        assert_eq!(plan.to_create.len(), 1);
        assert_eq!(plan.to_create[0].entry.source_id, "B2");
        assert_eq!(plan.to_delete.len(), 1);
    }

    #[test]
    fn test_location_option_change() {
        let on = SyncOptions::default();
        let calendar = synced(&three_entries(), &on);

        let off = SyncOptions {
            sync_location: false,
            ..Default::default()
        };
        let plan = reconcile(three_entries(), calendar, &off);
        assert_eq!(plan.to_create.len(), 1);
        assert_eq!(plan.to_create[0].entry.source_id, "B2");
    }

    #[test]
    fn test_subject_override_change_recreates_all() {
        let on = SyncOptions::default();
        let calendar = synced(&three_entries(), &on);

        let anonymous = SyncOptions {
            subject_override: Some("Busy".into()),
            ..Default::default()
        };
        let plan = reconcile(three_entries(), calendar, &anonymous);
        assert_eq!(plan.to_create.len(), 3);
        assert_eq!(plan.to_delete.len(), 3);
    }

    #[test]
    fn test_description_option_change() {
        let on = SyncOptions::default();
        let calendar = synced(&three_entries(), &on);

        let off = SyncOptions {
            sync_description: false,
            ..Default::default()
        };
        let plan = reconcile(three_entries(), calendar, &off);
        assert_eq!(plan.to_create.len(), 1);
        assert_eq!(plan.to_create[0].entry.source_id, "C3");
    }

    #[test]
    fn test_reminder_comparison() {
        let options = SyncOptions::default();
        let mut entry = sample_entry("A1");
        entry.has_alarm = true;
        entry.alarm_offset_minutes = 15;

        let key = SyncKey::encode(&entry).unwrap();
        let mut event = render::draft_event(&entry, &key, &options).into_event("x".into());
        assert_eq!(compare(&entry, &event, &options), Ok(()));

        // A user-edited reminder time is still an override
        event.reminders.overrides = vec![Reminder { minutes: 5 }];
        assert_eq!(compare(&entry, &event, &options), Ok(()));

        event.reminders = Reminders::default();
        assert_eq!(compare(&entry, &event, &options), Err(Mismatch::Reminder));

        entry.has_alarm = false;
        assert_eq!(compare(&entry, &event, &options), Ok(()));

        event.reminders.use_default = false;
        event.reminders.overrides = vec![Reminder { minutes: 5 }];
        assert_eq!(compare(&entry, &event, &options), Err(Mismatch::Reminder));
    }

    #[test]
    fn test_comparison_fails_fast_on_subject() {
        let options = SyncOptions::default();
        let entry = sample_entry("A1");
        let key = SyncKey::encode(&entry).unwrap();
        let mut event = render::draft_event(&entry, &key, &options).into_event("x".into());

        event.summary = "Changed".into();
        event.description = Some("Also changed".into());
        assert_eq!(compare(&entry, &event, &options), Err(Mismatch::Subject));

        event.summary = "Team sync".into();
        assert_eq!(compare(&entry, &event, &options), Err(Mismatch::Description));
    }

    #[test]
    fn test_empty_location_counts_as_none() {
        let options = SyncOptions::default();
        let entry = sample_entry("A1");
        let key = SyncKey::encode(&entry).unwrap();
        let mut event = render::draft_event(&entry, &key, &options).into_event("x".into());

        event.location = Some(String::new());
        assert!(is_equivalent(&entry, &event, &options));

        event.location = Some("Somewhere".into());
        assert!(!is_equivalent(&entry, &event, &options));
    }

    #[test]
    fn test_duplicate_events_keep_one() {
        let options = SyncOptions::default();
        let entries = vec![sample_entry("A1")];
        let mut calendar = synced(&entries, &options);

        let key = SyncKey::encode(&entries[0]).unwrap();
        let duplicate = render::draft_event(&entries[0], &key, &options).into_event("dup".into());
        calendar.push(duplicate);

        let plan = reconcile(entries, calendar, &options);
        assert!(plan.to_create.is_empty());
        assert_eq!(plan.unchanged, 1);
        assert_eq!(plan.to_delete.len(), 1);
        assert_eq!(plan.to_delete[0].id, "dup");
    }

    #[test]
    fn test_occurrences_match_individually() {
        let options = SyncOptions::default();
        let mut first = sample_entry("R1");
        first.occurrence = true;
        let mut second = first.clone();
        second.start_at = ts(2024, 3, 11, 10, 0);
        second.end_at = ts(2024, 3, 11, 11, 0);

        let calendar = synced(&[first.clone(), second.clone()], &options);

        // The series loses its second occurrence
        let plan = reconcile(vec![first], calendar, &options);
        assert_eq!(plan.unchanged, 1);
        assert_eq!(plan.to_delete.len(), 1);
        assert_eq!(plan.to_delete[0].start, second.start_time());
    }

    #[test]
    fn test_time_change_without_modification_is_not_detected() {
        let options = SyncOptions::default();
        let calendar = synced(&[sample_entry("A1")], &options);

        let mut moved = sample_entry("A1");
        moved.start_at = ts(2024, 3, 4, 15, 0);
        moved.end_at = ts(2024, 3, 4, 16, 0);

        let plan = reconcile(vec![moved], calendar, &options);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_unkeyable_entries_are_rejected() {
        let options = SyncOptions::default();
        let plan = reconcile(vec![sample_entry("bad id")], Vec::new(), &options);
        assert!(plan.to_create.is_empty());
        assert_eq!(plan.rejected.len(), 1);
    }
}
