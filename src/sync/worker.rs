use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::SyncConfig;
use crate::lock::{Lock, LockGuard, LockManager, TICK_LOCK};
use crate::model::ModelStore;
use crate::outbox::{
    BackoffSchedule, ChangePayload, EntryPatch, OutboxEntry, OutboxQueue, PayloadEnvelope,
    PayloadError,
};
use crate::remote::{
    ConcurrencyToken, DirectoryService, FieldMask, RecordField, RemoteError, RemoteRecord,
};

use super::{
    ConflictPolicy, EntryOutcome, GroupClassifier, PayloadMerger, PendingSample, ReportSlot,
    SyncError, SyncStatus, TickOutcome, TickStats, Verdict, WorkerRunReport,
};

/// Entries shown in the status readout.
const STATUS_SAMPLE: usize = 5;

enum Applied {
    Done,
    Conflict(String),
    Invalid(PayloadError),
}

/// Applies due outbox entries to the remote directory, one tick at a time.
///
/// Ticks are serialized through the tick lock: a tick that finds it held
/// returns [`TickOutcome::Busy`] without touching anything.
pub struct TickWorker<S, D, L> {
    queue: OutboxQueue<S>,
    directory: D,
    locks: L,
    clock: Arc<dyn Clock>,
    merger: PayloadMerger,
    classifier: GroupClassifier,
    batch_size: usize,
    max_attempts: u32,
    backoff: BackoffSchedule,
    reports: ReportSlot,
}

impl<S, D, L> TickWorker<S, D, L> {
    /// Set the maximum entries processed per tick.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Set the number of failed attempts after which an entry is given up.
    /// Values below one are raised to one.
    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max.max(1);
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffSchedule) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn queue(&self) -> &OutboxQueue<S> {
        &self.queue
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Report of the last completed tick.
    pub fn last_report(&self) -> Option<WorkerRunReport> {
        self.reports.latest()
    }
}

impl<S, D, L> TickWorker<S, D, L>
where
    S: ModelStore,
    D: DirectoryService,
    L: LockManager,
{
    pub fn new(
        store: S,
        directory: D,
        locks: L,
        clock: Arc<dyn Clock>,
        config: &SyncConfig,
    ) -> Self {
        Self {
            queue: OutboxQueue::new(store, Arc::clone(&clock)),
            directory,
            locks,
            clock,
            merger: PayloadMerger::new(config.field_keys.clone(), config.link_base_url.as_deref()),
            classifier: GroupClassifier::new(config.groups.clone()),
            batch_size: config.batch_per_tick,
            max_attempts: config.max_attempts.max(1),
            backoff: config.backoff.clone(),
            reports: ReportSlot::default(),
        }
    }

    /// Run one tick: process up to a batch of due entries, oldest first.
    pub fn tick(&self) -> TickOutcome {
        let started_at = self.clock.now();
        let mut stats = TickStats::default();

        let result = match self.acquire() {
            Ok(Some(guard)) => {
                let result = self.run_batch(started_at, &mut stats);
                drop(guard);
                result
            }
            Ok(None) => {
                debug!("tick lock held elsewhere, skipping");
                return TickOutcome::Busy;
            }
            Err(err) => Err(err),
        };

        let report = WorkerRunReport {
            started_at,
            finished_at: self.clock.now(),
            stats,
            error: result.err().map(|err| err.to_string()),
        };
        match &report.error {
            None => info!(
                processed = stats.processed,
                done = stats.done,
                retry = stats.retry,
                conflict = stats.conflict,
                skipped = stats.skipped,
                errors = stats.errors,
                "tick finished"
            ),
            Some(err) => warn!(error = %err, processed = stats.processed, "tick aborted"),
        }

        self.reports.store(report.clone());
        TickOutcome::Completed(report)
    }

    /// Pending count, last report and a sample of open entries.
    pub fn status(&self) -> Result<SyncStatus, SyncError> {
        Ok(SyncStatus {
            pending: self.queue.count_pending()?,
            last_report: self.last_report(),
            sample: self
                .queue
                .sample_pending(STATUS_SAMPLE)?
                .iter()
                .map(PendingSample::from)
                .collect(),
        })
    }

    fn acquire(&self) -> Result<Option<LockGuard<L::Lock>>, SyncError> {
        let lock = self.locks.get_lock(TICK_LOCK)?;
        if lock.try_lock()? {
            Ok(Some(LockGuard::acquired(lock)))
        } else {
            Ok(None)
        }
    }

    fn run_batch(&self, now: DateTime<Utc>, stats: &mut TickStats) -> Result<(), SyncError> {
        let due = self.queue.scan_due(now)?;
        for entry in due.into_iter().take(self.batch_size) {
            let outcome = self.process_entry(&entry, now)?;
            stats.record(outcome);
        }
        Ok(())
    }

    fn process_entry(
        &self,
        entry: &OutboxEntry,
        now: DateTime<Utc>,
    ) -> Result<EntryOutcome, SyncError> {
        if entry.remote_id.trim().is_empty() {
            self.queue
                .write_patch(&entry.id, EntryPatch::skipped(now, "missing remote id"))?;
            debug!(outbox_id = %entry.id, "skipped entry without remote id");
            return Ok(EntryOutcome::Skipped);
        }

        let envelope = match PayloadEnvelope::parse(&entry.payload) {
            Ok(envelope) => envelope,
            Err(err) => return self.skip_payload(entry, now, err),
        };

        match self.apply(entry, envelope) {
            Ok(Applied::Done) => {
                self.queue.write_patch(&entry.id, EntryPatch::done(now))?;
                debug!(outbox_id = %entry.id, remote_id = %entry.remote_id, "applied");
                Ok(EntryOutcome::Done)
            }
            Ok(Applied::Conflict(reason)) => {
                info!(outbox_id = %entry.id, remote_id = %entry.remote_id, "remote changed since enqueue, dropping change");
                self.queue
                    .write_patch(&entry.id, EntryPatch::conflict(now, reason))?;
                Ok(EntryOutcome::Conflict)
            }
            Ok(Applied::Invalid(err)) => self.skip_payload(entry, now, err),
            Err(err) => {
                let attempts = entry
                    .attempts
                    .saturating_add(1)
                    .min(self.max_attempts)
                    .max(entry.attempts);
                let next_try_at = self.next_try_at(now, attempts);
                if attempts >= self.max_attempts {
                    warn!(outbox_id = %entry.id, attempts, error = %err, "giving up on entry");
                    self.queue.write_patch(
                        &entry.id,
                        EntryPatch::exhausted(attempts, now, err.to_string()),
                    )?;
                    Ok(EntryOutcome::Exhausted)
                } else if let Some(next_try_at) = next_try_at {
                    warn!(outbox_id = %entry.id, attempts, error = %err, %next_try_at, "apply failed, will retry");
                    self.queue.write_patch(
                        &entry.id,
                        EntryPatch::retry(attempts, next_try_at, err.to_string()),
                    )?;
                    Ok(EntryOutcome::Retry)
                } else {
                    warn!(outbox_id = %entry.id, attempts, error = %err, "retry time out of range, giving up");
                    self.queue.write_patch(
                        &entry.id,
                        EntryPatch::exhausted(
                            attempts,
                            now,
                            format!("{} (retry time out of range)", err),
                        ),
                    )?;
                    Ok(EntryOutcome::Exhausted)
                }
            }
        }
    }

    fn next_try_at(&self, now: DateTime<Utc>, attempts: u32) -> Option<DateTime<Utc>> {
        let delay = chrono::Duration::from_std(self.backoff.backoff_for(attempts)).ok()?;
        now.checked_add_signed(delay)
    }

    fn skip_payload(
        &self,
        entry: &OutboxEntry,
        now: DateTime<Utc>,
        err: PayloadError,
    ) -> Result<EntryOutcome, SyncError> {
        self.queue
            .write_patch(&entry.id, EntryPatch::skipped(now, err.to_string()))?;
        debug!(outbox_id = %entry.id, error = %err, "skipped unusable payload");
        Ok(EntryOutcome::Skipped)
    }

    /// Read, check, merge and write one change. Errors are transient.
    ///
    /// The conflict check runs before any payload field is interpreted, so a
    /// stale entry is a conflict whatever its payload holds.
    fn apply(&self, entry: &OutboxEntry, envelope: PayloadEnvelope) -> Result<Applied, RemoteError> {
        let remote_id = entry.remote_id.trim();
        let read_mask = if envelope.is_link_only() {
            FieldMask::new()
                .with(RecordField::Metadata)
                .with(RecordField::CustomFields)
        } else {
            FieldMask::new()
                .with(RecordField::Metadata)
                .with(RecordField::CustomFields)
                .with(RecordField::Events)
                .with(RecordField::Memberships)
        };
        let current = self.directory.get(remote_id, &read_mask)?;

        let token = ConcurrencyToken::current(&current.sources);
        if let Verdict::Conflict {
            baseline,
            current: latest,
        } = ConflictPolicy::check(entry.baseline.as_ref(), token.as_ref())
        {
            return Ok(Applied::Conflict(format!(
                "remote record changed (baseline {}, now {})",
                baseline, latest
            )));
        }
        let payload = match ChangePayload::try_from(envelope) {
            Ok(payload) => payload,
            Err(err) => return Ok(Applied::Invalid(err)),
        };
        if current.sources.is_empty() {
            return Err(RemoteError::MissingMetadata(remote_id.to_string()));
        }

        let mut update = RemoteRecord {
            remote_id: remote_id.to_string(),
            etag: current.etag.clone(),
            sources: current.sources.clone(),
            custom_fields: self
                .merger
                .merge_custom_fields(&current.custom_fields, &payload),
            ..RemoteRecord::default()
        };
        let mut update_mask = FieldMask::new().with(RecordField::CustomFields);
        if let ChangePayload::Normal(change) = &payload {
            update.events = self.merger.merge_events(&current.events, change);
            update_mask = update_mask.with(RecordField::Events);
        }

        self.directory.patch(remote_id, &update, &update_mask)?;

        if let ChangePayload::Normal(change) = &payload {
            if let Some(icon) = change.icon.as_deref() {
                if let Err(err) =
                    self.classifier
                        .classify(&self.directory, remote_id, icon, &current.memberships)
                {
                    warn!(remote_id, icon, error = %err, "group classification failed");
                }
            }
        }

        Ok(Applied::Done)
    }
}
