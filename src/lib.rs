//! Outbox-based synchronization of a local contact ledger with a remote
//! directory service.
//!
//! Saves never write to the remote. [`ContactSaver::save`] records the edit
//! in the ledger and appends a change to the [`OutboxQueue`]; a
//! [`TickWorker`] later applies due changes under a remote-wins conflict
//! policy, with bounded retries and explicit terminal states.

extern crate self as tribu_sync;

pub mod clock;
pub mod config;
pub mod ledger;
pub mod lock;
pub mod model;
pub mod outbox;
pub mod remote;
pub mod sync;

#[cfg(feature = "http")]
pub mod http;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, FieldKeys, GroupDirectory, SyncConfig};
pub use ledger::{
    BackfillProgress, Cadence, Contact, ContactSaver, Ledger, LinkBackfill, NextContactStatus,
    SaveError, SaveOutcome, SaveRequest, Scores,
};
pub use lock::{InMemoryLock, InMemoryLockManager, Lock, LockError, LockGuard, LockManager};
pub use model::{Collection, InMemoryModelStore, Model, ModelError, ModelStore, StoreExt, Versioned};
pub use outbox::{
    BackoffSchedule, ChangePayload, EntryPatch, LinkOnlyChange, NormalChange, OutboxEntry,
    OutboxQueue, OutboxStatus, PayloadEnvelope, PayloadError, QueueError,
};
pub use remote::{
    ConcurrencyToken, DirectoryService, FieldMask, InMemoryDirectory, RecordField, RemoteError,
    RemoteRecord,
};
pub use sync::{
    Category, ConflictPolicy, PayloadMerger, SyncError, SyncStatus, SyncWorkerThread, TickOutcome,
    TickStats, TickWorker, Verdict, WorkerRunReport,
};
pub use tribu_sync_macros::Model;
