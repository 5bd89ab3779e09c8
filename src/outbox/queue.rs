use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::clock::Clock;
use crate::model::{ModelStore, StoreExt};
use crate::remote::ConcurrencyToken;

use super::{ChangePayload, EntryPatch, OutboxEntry, OutboxStatus, QueueError};

/// Durable ordered store of outbox entries.
///
/// Scans come back in storage order, which is enqueue order.
pub struct OutboxQueue<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: ModelStore> OutboxQueue<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Append a `Pending` entry with zero attempts. Returns the new entry id.
    pub fn enqueue(
        &self,
        local_id: &str,
        remote_id: &str,
        baseline: Option<ConcurrencyToken>,
        payload: &ChangePayload,
    ) -> Result<String, QueueError> {
        let entry = OutboxEntry {
            id: Uuid::new_v4().to_string(),
            created_at: self.clock.now(),
            local_id: local_id.to_string(),
            remote_id: remote_id.trim().to_string(),
            baseline,
            payload: payload.encode()?,
            status: OutboxStatus::Pending,
            attempts: 0,
            next_try_at: None,
            last_error: None,
            applied_at: None,
        };

        self.store.collection::<OutboxEntry>().insert(&entry)?;
        debug!(
            outbox_id = %entry.id,
            local_id = %entry.local_id,
            link_only = payload.is_link_only(),
            "enqueued change"
        );
        Ok(entry.id)
    }

    /// Number of entries still waiting to be applied (`Pending` or `Retry`).
    pub fn count_pending(&self) -> Result<usize, QueueError> {
        Ok(self
            .store
            .collection::<OutboxEntry>()
            .find(&|e| e.status.is_open())?
            .len())
    }

    /// Open entries whose retry time (if any) has passed, oldest first.
    pub fn scan_due(&self, now: DateTime<Utc>) -> Result<Vec<OutboxEntry>, QueueError> {
        Ok(self
            .store
            .collection::<OutboxEntry>()
            .find(&|e| e.is_due(now))?
            .into_iter()
            .map(|v| v.data)
            .collect())
    }

    /// Update one entry through the status state machine.
    ///
    /// The write is a versioned update, so a concurrent writer surfaces as
    /// `QueueError::Store(ModelError::ConcurrencyConflict)`.
    pub fn write_patch(&self, id: &str, patch: EntryPatch) -> Result<OutboxEntry, QueueError> {
        let repo = self.store.collection::<OutboxEntry>();
        let current = repo
            .get(id)?
            .ok_or_else(|| QueueError::NotFound(id.to_string()))?;

        let mut entry = current.data;
        entry.apply(patch)?;
        repo.update(&entry, current.version)?;
        Ok(entry)
    }

    pub fn get(&self, id: &str) -> Result<Option<OutboxEntry>, QueueError> {
        Ok(self
            .store
            .collection::<OutboxEntry>()
            .get(id)?
            .map(|v| v.data))
    }

    /// Every entry regardless of status, in storage order.
    pub fn entries(&self) -> Result<Vec<OutboxEntry>, QueueError> {
        Ok(self
            .store
            .collection::<OutboxEntry>()
            .all()?
            .into_iter()
            .map(|v| v.data)
            .collect())
    }

    /// Up to `limit` open entries, oldest first.
    pub fn sample_pending(&self, limit: usize) -> Result<Vec<OutboxEntry>, QueueError> {
        Ok(self
            .store
            .collection::<OutboxEntry>()
            .find(&|e| e.status.is_open())?
            .into_iter()
            .take(limit)
            .map(|v| v.data)
            .collect())
    }
}
