//! One sync pass: fetch both sides, reconcile, then delete and create.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::adapter::{CalendarHandle, DestinationAdapter, SourceAdapter};
use crate::config::SyncOptions;
use crate::entry::CalendarEntry;
use crate::error::{SyncError, SyncResult};
use crate::event::DestinationEvent;
use crate::reconcile::{self, SyncPlan};
use crate::render;
use crate::status::{StatusSink, format_elapsed};
use crate::window::SyncWindow;

/// Outcome of a completed pass.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub created: usize,
    pub deleted: usize,
    pub unchanged: usize,
    pub foreign: usize,
    /// Per-item failures. The pass carried on past each of them.
    pub errors: Vec<SyncError>,
    pub elapsed: Duration,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Deletes and creates the destination refused. The next pass tries
    /// them again.
    pub fn failed_writes(&self) -> usize {
        self.errors
            .iter()
            .filter(|e| matches!(e, SyncError::DestWrite(_)))
            .count()
    }

    /// Source entries that were dropped before any write was attempted.
    pub fn rejected(&self) -> usize {
        self.errors.len() - self.failed_writes()
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} deleted, {} unchanged",
            self.created, self.deleted, self.unchanged
        )?;
        if !self.errors.is_empty() {
            write!(f, ", {} failed", self.errors.len())?;
        }
        Ok(())
    }
}

/// Runs sync passes between one source and one destination calendar.
///
/// Only one pass runs at a time; a second caller gets
/// [`SyncError::AlreadyRunning`] instead of waiting.
pub struct Syncer {
    source: Box<dyn SourceAdapter>,
    destination: Box<dyn DestinationAdapter>,
    status: Arc<dyn StatusSink>,
    calendar_name: String,
    running: Mutex<()>,
}

impl Syncer {
    pub fn new(
        source: Box<dyn SourceAdapter>,
        destination: Box<dyn DestinationAdapter>,
        status: Arc<dyn StatusSink>,
        calendar_name: impl Into<String>,
    ) -> Self {
        Syncer {
            source,
            destination,
            status,
            calendar_name: calendar_name.into(),
            running: Mutex::new(()),
        }
    }

    /// Run a pass to completion.
    pub async fn run_once(&self, window: &SyncWindow, options: &SyncOptions) -> SyncResult<SyncReport> {
        self.run_cancellable(window, options, &CancellationToken::new())
            .await
    }

    /// Run a pass that `cancel` may abort until the first change is made
    /// on the destination. From then on the pass runs to the end.
    pub async fn run_cancellable(
        &self,
        window: &SyncWindow,
        options: &SyncOptions,
        cancel: &CancellationToken,
    ) -> SyncResult<SyncReport> {
        let _guard = self
            .running
            .try_lock()
            .map_err(|_| SyncError::AlreadyRunning)?;
        let started = Instant::now();

        let (calendar, plan) = self.prepare(window, options, cancel).await?;
        let mut report = self.apply(&calendar, plan, options).await;
        report.elapsed = started.elapsed();

        tracing::info!(
            created = report.created,
            deleted = report.deleted,
            unchanged = report.unchanged,
            failed = report.errors.len(),
            "sync finished"
        );

        Ok(report)
    }

    /// Fetch and reconcile without changing anything.
    pub async fn plan(
        &self,
        window: &SyncWindow,
        options: &SyncOptions,
        cancel: &CancellationToken,
    ) -> SyncResult<SyncPlan> {
        let _guard = self
            .running
            .try_lock()
            .map_err(|_| SyncError::AlreadyRunning)?;

        self.prepare_dry_run(window, options, cancel).await
    }

    /// Run a pass and always close the transcript: the counts on success,
    /// an error block on failure, and the total time either way.
    pub async fn run_and_report(
        &self,
        window: &SyncWindow,
        options: &SyncOptions,
        cancel: &CancellationToken,
    ) -> SyncResult<SyncReport> {
        let started = Instant::now();
        let result = self.run_cancellable(window, options, cancel).await;

        match &result {
            Ok(report) => {
                self.status.append_line(&format!("Summary: {}", report));
                let failed_writes = report.failed_writes();
                if failed_writes > 0 {
                    self.status.append_line(&format!(
                        "{} changes could not be applied, they will be retried next sync",
                        failed_writes
                    ));
                }
                let rejected = report.rejected();
                if rejected > 0 {
                    self.status.append_line(&format!(
                        "{} Lotus entries were skipped because they cannot be synced",
                        rejected
                    ));
                }
            }
            Err(e) => {
                self.status.append_line("");
                self.status.append_line("=== ERROR ===");
                self.status.append_line("There was an error synchronizing.");
                self.status.append_line(&e.to_string());
            }
        }

        self.status.append_line(&format!(
            "Finished sync ({} total)",
            format_elapsed(started.elapsed())
        ));

        result
    }

    async fn prepare(
        &self,
        window: &SyncWindow,
        options: &SyncOptions,
        cancel: &CancellationToken,
    ) -> SyncResult<(CalendarHandle, SyncPlan)> {
        let entries = self.fetch_entries(window, cancel).await?;

        self.status.append_timed_start("Connecting to destination calendar");
        let calendar = cancellable(cancel, self.destination.ensure_calendar(&self.calendar_name))
            .await
            .map_err(|e| as_dest_fetch(e, &self.calendar_name))?;
        self.status.append_timed_finish();
        self.describe_calendar(&calendar);

        let events = self.fetch_events(&calendar, window, cancel).await?;
        let plan = self.compare(entries, events, options, cancel)?;

        Ok((calendar, plan))
    }

    /// Like `prepare`, but a missing calendar is left missing and treated
    /// as empty.
    async fn prepare_dry_run(
        &self,
        window: &SyncWindow,
        options: &SyncOptions,
        cancel: &CancellationToken,
    ) -> SyncResult<SyncPlan> {
        let entries = self.fetch_entries(window, cancel).await?;

        self.status.append_timed_start("Looking up destination calendar");
        let calendar = cancellable(cancel, self.destination.find_calendar(&self.calendar_name))
            .await
            .map_err(|e| as_dest_fetch(e, &self.calendar_name))?;
        self.status.append_timed_finish();

        let events = match calendar {
            Some(calendar) => {
                self.describe_calendar(&calendar);
                self.fetch_events(&calendar, window, cancel).await?
            }
            None => {
                self.status.append_line(&format!(
                    "Destination calendar '{}' does not exist yet",
                    self.calendar_name
                ));
                Vec::new()
            }
        };

        self.compare(entries, events, options, cancel)
    }

    async fn fetch_entries(
        &self,
        window: &SyncWindow,
        cancel: &CancellationToken,
    ) -> SyncResult<Vec<CalendarEntry>> {
        let status = &self.status;

        status.append_line(&format!(
            "Date range: {} thru {}",
            window.min_start.format("%Y-%m-%d %H:%M UTC"),
            window.max_end.format("%Y-%m-%d %H:%M UTC")
        ));

        status.append_timed_start("Getting Lotus Notes calendar entries");
        let entries = cancellable(cancel, self.source.fetch_entries(window))
            .await
            .map_err(as_source_fetch)?;
        status.append_timed_finish();
        status.append_line(&format!("{} Lotus entries found within date range", entries.len()));

        Ok(entries)
    }

    fn describe_calendar(&self, calendar: &CalendarHandle) {
        self.status.append_diagnostic(&format!(
            "Destination calendar: {} ({})",
            calendar.name,
            calendar.time_zone.as_deref().unwrap_or("unknown time zone")
        ));
    }

    async fn fetch_events(
        &self,
        calendar: &CalendarHandle,
        window: &SyncWindow,
        cancel: &CancellationToken,
    ) -> SyncResult<Vec<DestinationEvent>> {
        self.status.append_timed_start("Getting destination calendar entries");
        let events = cancellable(cancel, self.destination.list_events(calendar, window))
            .await
            .map_err(|e| as_dest_fetch(e, &calendar.name))?;
        self.status.append_timed_finish();
        self.status.append_line(&format!(
            "{} destination entries found within date range",
            events.len()
        ));

        Ok(events)
    }

    fn compare(
        &self,
        entries: Vec<CalendarEntry>,
        events: Vec<DestinationEvent>,
        options: &SyncOptions,
        cancel: &CancellationToken,
    ) -> SyncResult<SyncPlan> {
        let status = &self.status;

        status.append_timed_start("Comparing Lotus Notes and destination calendar entries");
        let plan = reconcile::reconcile(entries, events, options);
        status.append_timed_finish();
        status.append_line(&format!(
            "{} entries to create. {} entries to delete.",
            plan.to_create.len(),
            plan.to_delete.len()
        ));
        if plan.foreign > 0 {
            status.append_diagnostic(&format!(
                "{} entries not created by lnsync were left alone",
                plan.foreign
            ));
        }

        // Last point where the pass can still be abandoned cleanly
        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        Ok(plan)
    }

    async fn apply(&self, calendar: &CalendarHandle, plan: SyncPlan, options: &SyncOptions) -> SyncReport {
        let status = &self.status;
        let mut report = SyncReport {
            unchanged: plan.unchanged,
            foreign: plan.foreign,
            errors: plan.rejected,
            ..Default::default()
        };

        if !plan.to_delete.is_empty() {
            status.append_timed_start("Deleting old destination calendar entries");
            for event in &plan.to_delete {
                match self.destination.delete_event(calendar, &event.id).await {
                    Ok(()) => {
                        report.deleted += 1;
                        status.append_diagnostic(&format!(
                            "Delete #{}. Subject: {}  Start: {}",
                            report.deleted, event.summary, event.start
                        ));
                    }
                    Err(e) => {
                        tracing::warn!(event_id = %event.id, error = %e, "delete failed");
                        status.append_line(&format!("Could not delete '{}': {}", event.summary, e));
                        report.errors.push(e);
                    }
                }
            }
            status.append_timed_finish();
            status.append_line(&format!("{} destination entries deleted", report.deleted));
        }

        if !plan.to_create.is_empty() {
            status.append_timed_start("Creating new destination calendar entries");
            for pending in &plan.to_create {
                let draft = render::draft_event(&pending.entry, &pending.key, options);
                match self.destination.create_event(calendar, &draft).await {
                    Ok(id) => {
                        report.created += 1;
                        status.append_diagnostic(&format!(
                            "Create #{}. Subject: {}  Start: {}  Type: {}",
                            report.created, draft.summary, draft.start, pending.entry.kind
                        ));
                        tracing::debug!(%id, key = %pending.key, "created event");
                    }
                    Err(e) => {
                        tracing::warn!(key = %pending.key, error = %e, "create failed");
                        status.append_line(&format!("Could not create '{}': {}", draft.summary, e));
                        report.errors.push(e);
                    }
                }
            }
            status.append_timed_finish();
            status.append_line(&format!("{} destination entries created", report.created));
        }

        report
    }
}

async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = SyncResult<T>>,
) -> SyncResult<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SyncError::Cancelled),
        result = fut => result,
    }
}

fn as_source_fetch(e: SyncError) -> SyncError {
    match e {
        SyncError::SourceFetch(_) | SyncError::Cancelled => e,
        other => SyncError::SourceFetch(other.to_string()),
    }
}

fn as_dest_fetch(e: SyncError, calendar: &str) -> SyncError {
    match e {
        SyncError::DestFetch(_) | SyncError::Cancelled => e,
        other => SyncError::DestFetch(format!("calendar '{}': {}", calendar, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::EventPage;
    use crate::entry::tests::sample_entry;
    use crate::event::{EventDraft, EventStatus, EventTime, Reminders, Visibility};
    use crate::status::Transcript;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::collections::HashSet;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticSource {
        entries: StdMutex<Vec<CalendarEntry>>,
        fail: bool,
    }

    impl StaticSource {
        fn new(entries: Vec<CalendarEntry>) -> Self {
            StaticSource {
                entries: StdMutex::new(entries),
                fail: false,
            }
        }

        fn failing() -> Self {
            StaticSource {
                entries: StdMutex::new(Vec::new()),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl SourceAdapter for Arc<StaticSource> {
        async fn fetch_entries(&self, _window: &SyncWindow) -> SyncResult<Vec<CalendarEntry>> {
            if self.fail {
                return Err(SyncError::Provider("notes server unreachable".into()));
            }
            Ok(self.entries.lock().unwrap().clone())
        }
    }

    #[derive(Default)]
    struct MemoryDestination {
        events: StdMutex<Vec<DestinationEvent>>,
        ops: StdMutex<Vec<String>>,
        page_size: usize,
        fail_list: bool,
        fail_deletes: HashSet<String>,
        fail_creates: HashSet<String>,
        next_id: AtomicUsize,
        /// No calendar exists until `ensure_calendar` makes one.
        calendar_missing: bool,
        ensure_calls: AtomicUsize,
    }

    impl MemoryDestination {
        fn new() -> Self {
            MemoryDestination {
                page_size: 2,
                ..Default::default()
            }
        }

        fn events(&self) -> Vec<DestinationEvent> {
            self.events.lock().unwrap().clone()
        }

        fn ops(&self) -> Vec<String> {
            self.ops.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DestinationAdapter for Arc<MemoryDestination> {
        async fn find_calendar(&self, name: &str) -> SyncResult<Option<CalendarHandle>> {
            if self.calendar_missing && self.ensure_calls.load(Ordering::SeqCst) == 0 {
                return Ok(None);
            }
            Ok(Some(CalendarHandle {
                id: "cal-1".into(),
                name: name.to_string(),
                time_zone: Some("Europe/Berlin".into()),
            }))
        }

        async fn ensure_calendar(&self, name: &str) -> SyncResult<CalendarHandle> {
            self.ensure_calls.fetch_add(1, Ordering::SeqCst);
            Ok(CalendarHandle {
                id: "cal-1".into(),
                name: name.to_string(),
                time_zone: Some("Europe/Berlin".into()),
            })
        }

        async fn list_events_page(
            &self,
            _calendar: &CalendarHandle,
            _window: &SyncWindow,
            page_token: Option<&str>,
        ) -> SyncResult<EventPage> {
            if self.fail_list {
                return Err(SyncError::Provider("503 Service Unavailable".into()));
            }

            let offset: usize = page_token.map(|t| t.parse().unwrap()).unwrap_or(0);
            let events = self.events.lock().unwrap();
            let end = (offset + self.page_size).min(events.len());

            Ok(EventPage {
                events: events[offset..end].to_vec(),
                next_page_token: (end < events.len()).then(|| end.to_string()),
            })
        }

        async fn create_event(&self, _calendar: &CalendarHandle, draft: &EventDraft) -> SyncResult<String> {
            if self.fail_creates.contains(&draft.summary) {
                return Err(SyncError::DestWrite(format!("create '{}': quota", draft.summary)));
            }
            let id = format!("evt{}", self.next_id.fetch_add(1, Ordering::SeqCst));
            self.events.lock().unwrap().push(draft.clone().into_event(id.clone()));
            self.ops.lock().unwrap().push(format!("create {}", draft.summary));
            Ok(id)
        }

        async fn delete_event(&self, _calendar: &CalendarHandle, event_id: &str) -> SyncResult<()> {
            if self.fail_deletes.contains(event_id) {
                return Err(SyncError::DestWrite(format!("delete {}: 500", event_id)));
            }
            let mut events = self.events.lock().unwrap();
            let summary = events
                .iter()
                .find(|e| e.id == event_id)
                .map(|e| e.summary.clone())
                .unwrap_or_default();
            events.retain(|e| e.id != event_id);
            self.ops.lock().unwrap().push(format!("delete {}", summary));
            Ok(())
        }
    }

    fn window() -> SyncWindow {
        SyncWindow::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 31, 23, 59, 59).unwrap(),
        )
    }

    fn entries() -> Vec<CalendarEntry> {
        ["A1", "B2", "C3", "D4", "E5"]
            .iter()
            .map(|id| {
                let mut entry = sample_entry(id);
                entry.subject = format!("Entry {}", id);
                entry
            })
            .collect()
    }

    fn foreign_event(id: &str) -> DestinationEvent {
        DestinationEvent {
            id: id.into(),
            ical_uid: format!("{}@google.com", id),
            summary: "Personal".into(),
            description: None,
            location: None,
            start: EventTime::DateTime(Utc.with_ymd_and_hms(2024, 3, 2, 8, 0, 0).unwrap()),
            end: EventTime::DateTime(Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap()),
            status: EventStatus::Confirmed,
            reminders: Reminders::default(),
            visibility: Visibility::Default,
        }
    }

    fn syncer(
        source: &Arc<StaticSource>,
        destination: &Arc<MemoryDestination>,
        status: &Arc<Transcript>,
    ) -> Syncer {
        Syncer::new(
            Box::new(source.clone()),
            Box::new(destination.clone()),
            status.clone(),
            "Lotus Notes",
        )
    }

    #[tokio::test]
    async fn test_first_and_second_pass() {
        let source = Arc::new(StaticSource::new(entries()));
        let destination = Arc::new(MemoryDestination::new());
        let status = Arc::new(Transcript::new(false));
        let syncer = syncer(&source, &destination, &status);
        let options = SyncOptions::default();

        let report = syncer.run_once(&window(), &options).await.unwrap();
        assert_eq!(report.created, 5);
        assert_eq!(report.deleted, 0);
        assert!(report.is_clean());
        assert_eq!(destination.events().len(), 5);

        // Listing spans three pages of two; a second pass must see all five
        let report = syncer.run_once(&window(), &options).await.unwrap();
        assert_eq!(report.created, 0);
        assert_eq!(report.deleted, 0);
        assert_eq!(report.unchanged, 5);
        assert_eq!(report.to_string(), "0 created, 0 deleted, 5 unchanged");
    }

    #[tokio::test]
    async fn test_edit_deletes_before_creating() {
        let source = Arc::new(StaticSource::new(entries()));
        let destination = Arc::new(MemoryDestination::new());
        let status = Arc::new(Transcript::new(false));
        let syncer = syncer(&source, &destination, &status);
        let options = SyncOptions::default();

        syncer.run_once(&window(), &options).await.unwrap();

        {
            let mut entries = source.entries.lock().unwrap();
            entries[2].subject = "Entry C3 (moved)".into();
            entries[2].modified_at = entries[2].modified_at + chrono::Duration::hours(2);
        }

        let report = syncer.run_once(&window(), &options).await.unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(report.deleted, 1);
        assert_eq!(report.unchanged, 4);

        let ops = destination.ops();
        let tail = &ops[ops.len() - 2..];
        assert_eq!(tail, ["delete Entry C3", "create Entry C3 (moved)"]);
    }

    #[tokio::test]
    async fn test_foreign_events_survive() {
        let source = Arc::new(StaticSource::new(Vec::new()));
        let destination = Arc::new(MemoryDestination::new());
        destination.events.lock().unwrap().push(foreign_event("f1"));
        destination.events.lock().unwrap().push(foreign_event("f2"));
        let status = Arc::new(Transcript::new(false));

        let report = syncer(&source, &destination, &status)
            .run_once(&window(), &SyncOptions::default())
            .await
            .unwrap();

        assert_eq!(report.deleted, 0);
        assert_eq!(report.foreign, 2);
        assert_eq!(destination.events().len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_events_are_ignored() {
        let source = Arc::new(StaticSource::new(entries()));
        let destination = Arc::new(MemoryDestination::new());
        let status = Arc::new(Transcript::new(false));
        let syncer = syncer(&source, &destination, &status);
        let options = SyncOptions::default();

        syncer.run_once(&window(), &options).await.unwrap();
        for event in destination.events.lock().unwrap().iter_mut() {
            event.status = EventStatus::Cancelled;
        }

        // Cancelled copies don't count as present, so everything is created again
        let report = syncer.run_once(&window(), &options).await.unwrap();
        assert_eq!(report.created, 5);
        assert_eq!(report.deleted, 0);
    }

    #[tokio::test]
    async fn test_source_failure_is_fatal() {
        let source = Arc::new(StaticSource::failing());
        let destination = Arc::new(MemoryDestination::new());
        let status = Arc::new(Transcript::new(false));

        let result = syncer(&source, &destination, &status)
            .run_once(&window(), &SyncOptions::default())
            .await;

        assert!(matches!(result, Err(SyncError::SourceFetch(_))));
        assert!(destination.ops().is_empty());
    }

    #[tokio::test]
    async fn test_destination_listing_failure_is_fatal() {
        let source = Arc::new(StaticSource::new(entries()));
        let destination = Arc::new(MemoryDestination {
            fail_list: true,
            ..MemoryDestination::new()
        });
        let status = Arc::new(Transcript::new(false));

        let result = syncer(&source, &destination, &status)
            .run_once(&window(), &SyncOptions::default())
            .await;

        assert!(matches!(result, Err(SyncError::DestFetch(_))));
        assert!(destination.ops().is_empty());
    }

    #[tokio::test]
    async fn test_item_failures_do_not_stop_the_batch() {
        let source = Arc::new(StaticSource::new(entries()));
        let destination = Arc::new(MemoryDestination {
            fail_creates: HashSet::from(["Entry B2".to_string()]),
            ..MemoryDestination::new()
        });
        let status = Arc::new(Transcript::new(false));
        let syncer = syncer(&source, &destination, &status);

        let report = syncer.run_once(&window(), &SyncOptions::default()).await.unwrap();
        assert_eq!(report.created, 4);
        assert_eq!(report.errors.len(), 1);
        assert!(matches!(report.errors[0], SyncError::DestWrite(_)));
        assert_eq!(report.to_string(), "4 created, 0 deleted, 0 unchanged, 1 failed");
    }

    #[tokio::test]
    async fn test_failed_delete_is_retried_next_pass() {
        let source = Arc::new(StaticSource::new(entries()));
        let seed = Arc::new(MemoryDestination::new());
        let status = Arc::new(Transcript::new(false));
        syncer(&source, &seed, &status)
            .run_once(&window(), &SyncOptions::default())
            .await
            .unwrap();

        let stuck_id = seed.events()[0].id.clone();
        let destination = Arc::new(MemoryDestination {
            events: StdMutex::new(seed.events()),
            fail_deletes: HashSet::from([stuck_id]),
            ..MemoryDestination::new()
        });

        source.entries.lock().unwrap().clear();
        let report = syncer(&source, &destination, &status)
            .run_once(&window(), &SyncOptions::default())
            .await
            .unwrap();

        assert_eq!(report.deleted, 4);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(destination.events().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_before_changes() {
        let source = Arc::new(StaticSource::new(entries()));
        let destination = Arc::new(MemoryDestination::new());
        let status = Arc::new(Transcript::new(false));
        let syncer = syncer(&source, &destination, &status);

        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = syncer
            .run_cancellable(&window(), &SyncOptions::default(), &cancel)
            .await;
        assert!(matches!(result, Err(SyncError::Cancelled)));
        assert!(destination.ops().is_empty());

        // The guard is released after a cancelled pass
        assert!(syncer.run_once(&window(), &SyncOptions::default()).await.is_ok());
    }

    #[tokio::test]
    async fn test_overlapping_pass_is_refused() {
        let source = Arc::new(StaticSource::new(entries()));
        let destination = Arc::new(MemoryDestination::new());
        let status = Arc::new(Transcript::new(false));
        let syncer = syncer(&source, &destination, &status);

        let _held = syncer.running.lock().await;
        let result = syncer.run_once(&window(), &SyncOptions::default()).await;
        assert!(matches!(result, Err(SyncError::AlreadyRunning)));
    }

    #[tokio::test]
    async fn test_plan_changes_nothing() {
        let source = Arc::new(StaticSource::new(entries()));
        let destination = Arc::new(MemoryDestination::new());
        let status = Arc::new(Transcript::new(false));

        let plan = syncer(&source, &destination, &status)
            .plan(&window(), &SyncOptions::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(plan.to_create.len(), 5);
        assert!(destination.ops().is_empty());
        assert_eq!(destination.ensure_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_plan_leaves_missing_calendar_alone() {
        let source = Arc::new(StaticSource::new(entries()));
        let destination = Arc::new(MemoryDestination {
            calendar_missing: true,
            ..MemoryDestination::new()
        });
        let status = Arc::new(Transcript::new(false));
        let syncer = syncer(&source, &destination, &status);

        let plan = syncer
            .plan(&window(), &SyncOptions::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(plan.to_create.len(), 5);
        assert!(plan.to_delete.is_empty());
        assert_eq!(destination.ensure_calls.load(Ordering::SeqCst), 0);
        assert!(
            status
                .lines()
                .iter()
                .any(|l| l == "Destination calendar 'Lotus Notes' does not exist yet")
        );

        // A real pass creates the calendar, after which the plan sees its events
        syncer.run_once(&window(), &SyncOptions::default()).await.unwrap();
        assert_eq!(destination.ensure_calls.load(Ordering::SeqCst), 1);

        let plan = syncer
            .plan(&window(), &SyncOptions::default(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.unchanged, 5);
    }

    #[tokio::test]
    async fn test_report_closes_transcript() {
        let source = Arc::new(StaticSource::new(entries()));
        let destination = Arc::new(MemoryDestination::new());
        let status = Arc::new(Transcript::new(false));

        syncer(&source, &destination, &status)
            .run_and_report(&window(), &SyncOptions::default(), &CancellationToken::new())
            .await
            .unwrap();

        let lines = status.lines();
        assert!(lines.iter().any(|l| l == "5 Lotus entries found within date range"));
        assert!(lines.iter().any(|l| l == "5 destination entries created"));
        assert!(lines.iter().any(|l| l == "Summary: 5 created, 0 deleted, 0 unchanged"));
        assert!(lines.last().unwrap().starts_with("Finished sync ("));
        assert!(!lines.iter().any(|l| l.starts_with("   ")));
    }

    #[tokio::test]
    async fn test_report_separates_rejected_from_failed_writes() {
        let mut entries = entries();
        entries.push(sample_entry("bad id"));
        let source = Arc::new(StaticSource::new(entries));
        let destination = Arc::new(MemoryDestination {
            fail_creates: HashSet::from(["Entry B2".to_string()]),
            ..MemoryDestination::new()
        });
        let status = Arc::new(Transcript::new(false));

        let report = syncer(&source, &destination, &status)
            .run_and_report(&window(), &SyncOptions::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.failed_writes(), 1);
        assert_eq!(report.rejected(), 1);

        let lines = status.lines();
        assert!(lines.iter().any(|l| l == "Summary: 4 created, 0 deleted, 0 unchanged, 2 failed"));
        assert!(
            lines
                .iter()
                .any(|l| l == "1 changes could not be applied, they will be retried next sync")
        );
        assert!(
            lines
                .iter()
                .any(|l| l == "1 Lotus entries were skipped because they cannot be synced")
        );
    }

    #[tokio::test]
    async fn test_report_on_failure() {
        let source = Arc::new(StaticSource::failing());
        let destination = Arc::new(MemoryDestination::new());
        let status = Arc::new(Transcript::new(true));

        let result = syncer(&source, &destination, &status)
            .run_and_report(&window(), &SyncOptions::default(), &CancellationToken::new())
            .await;
        assert!(result.is_err());

        let lines = status.lines();
        assert!(lines.iter().any(|l| l == "=== ERROR ==="));
        assert!(lines.iter().any(|l| l.contains("notes server unreachable")));
        assert!(lines.last().unwrap().starts_with("Finished sync ("));
    }
}
