use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::outbox::{OutboxEntry, OutboxStatus};

/// How one entry ended up after a tick looked at it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryOutcome {
    Done,
    Conflict,
    /// Validation failure (no remote id, unreadable payload).
    Skipped,
    /// Transient failure, scheduled again.
    Retry,
    /// Transient failure on the last allowed attempt.
    Exhausted,
}

/// Per-tick counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TickStats {
    pub processed: usize,
    pub done: usize,
    pub retry: usize,
    pub conflict: usize,
    pub skipped: usize,
    /// Failed apply attempts, whether retried or given up.
    pub errors: usize,
}

impl TickStats {
    pub fn record(&mut self, outcome: EntryOutcome) {
        self.processed += 1;
        match outcome {
            EntryOutcome::Done => self.done += 1,
            EntryOutcome::Conflict => self.conflict += 1,
            EntryOutcome::Skipped => self.skipped += 1,
            EntryOutcome::Retry => {
                self.retry += 1;
                self.errors += 1;
            }
            EntryOutcome::Exhausted => {
                self.skipped += 1;
                self.errors += 1;
            }
        }
    }
}

/// Result of one completed tick.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WorkerRunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stats: TickStats,
    /// Set when the tick was aborted by a process-level error.
    pub error: Option<String>,
}

impl WorkerRunReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// What a call to `tick` did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Another tick holds the lock; nothing was done.
    Busy,
    Completed(WorkerRunReport),
}

impl TickOutcome {
    pub fn report(&self) -> Option<&WorkerRunReport> {
        match self {
            TickOutcome::Busy => None,
            TickOutcome::Completed(report) => Some(report),
        }
    }
}

/// Holds the most recent report.
#[derive(Debug, Default)]
pub struct ReportSlot {
    latest: RwLock<Option<WorkerRunReport>>,
}

impl ReportSlot {
    pub fn store(&self, report: WorkerRunReport) {
        match self.latest.write() {
            Ok(mut latest) => *latest = Some(report),
            Err(poisoned) => *poisoned.into_inner() = Some(report),
        }
    }

    pub fn latest(&self) -> Option<WorkerRunReport> {
        match self.latest.read() {
            Ok(latest) => latest.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// An open entry as shown in the status readout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PendingSample {
    pub outbox_id: String,
    pub local_id: String,
    pub remote_id: String,
    pub status: OutboxStatus,
    pub attempts: u32,
    pub next_try_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl From<&OutboxEntry> for PendingSample {
    fn from(entry: &OutboxEntry) -> Self {
        Self {
            outbox_id: entry.id.clone(),
            local_id: entry.local_id.clone(),
            remote_id: entry.remote_id.clone(),
            status: entry.status,
            attempts: entry.attempts,
            next_try_at: entry.next_try_at,
            last_error: entry.last_error.clone(),
        }
    }
}

/// Queue depth plus the last tick, for operators.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    pub pending: usize,
    pub last_report: Option<WorkerRunReport>,
    pub sample: Vec<PendingSample>,
}
