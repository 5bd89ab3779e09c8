//! Sync - the tick worker and the rules it applies.
//!
//! - `TickWorker`: drains due outbox entries into the remote directory
//! - `ConflictPolicy`: remote wins when the baseline token moved
//! - `PayloadMerger`: rebuilds managed custom fields and events
//! - `GroupClassifier`: keeps the record in its category group
//! - `SyncWorkerThread`: runs ticks on an interval

mod conflict;
mod error;
mod groups;
mod merge;
mod report;
mod thread;
mod worker;

pub use conflict::{ConflictPolicy, Verdict};
pub use error::SyncError;
pub use groups::{Category, GroupClassifier, GroupError};
pub use merge::{DeepLink, PayloadMerger};
pub use report::{
    EntryOutcome, PendingSample, ReportSlot, SyncStatus, TickOutcome, TickStats, WorkerRunReport,
};
pub use thread::{SchedulerStats, SyncWorkerThread};
pub use worker::TickWorker;
