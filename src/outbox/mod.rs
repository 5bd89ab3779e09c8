//! Outbox - durable queue of pending remote changes.
//!
//! - `OutboxEntry`: one queued change with its lifecycle status
//! - `EntryPatch`: partial update applied through the status state machine
//! - `ChangePayload` / `PayloadEnvelope`: in-memory and stored change forms
//! - `OutboxQueue`: enqueue, scan due entries, write patches
//! - `BackoffSchedule`: retry delay per attempt count

mod backoff;
mod entry;
mod error;
mod payload;
mod queue;

pub use backoff::BackoffSchedule;
pub use entry::{EntryPatch, OutboxEntry, OutboxStatus};
pub use error::QueueError;
pub use payload::{
    ChangePayload, EnvelopeDims, LinkOnlyChange, NormalChange, PayloadEnvelope, PayloadError,
};
pub use queue::OutboxQueue;
