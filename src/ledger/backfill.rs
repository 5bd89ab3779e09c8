use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use tribu_sync_macros::Model;

use crate::clock::Clock;
use crate::model::{ModelStore, StoreExt};
use crate::outbox::{ChangePayload, LinkOnlyChange, OutboxQueue, QueueError};

use super::Ledger;

const CURSOR_ID: &str = "link-backfill";

/// Persisted position of the link backfill in ledger order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Model)]
#[model(collection = "cursors")]
struct BackfillCursor {
    id: String,
    next_index: usize,
}

/// Progress after one backfill batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BackfillProgress {
    pub enqueued: usize,
    pub next_index: usize,
    /// Every ledger row has been visited.
    pub done: bool,
    pub pending: usize,
}

/// Queues link-only changes for every linked contact, a batch at a time.
///
/// The cursor is stored next to the ledger, so batches resume where the last
/// one stopped. Entries carry no baseline.
pub struct LinkBackfill<S> {
    ledger: Ledger<S>,
    queue: OutboxQueue<S>,
    store: S,
}

impl<S: ModelStore + Clone> LinkBackfill<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            ledger: Ledger::new(store.clone()),
            queue: OutboxQueue::new(store.clone(), clock),
            store,
        }
    }

    /// Enqueue up to `batch_size` (at least one) link-only changes.
    pub fn enqueue_batch(&self, batch_size: usize) -> Result<BackfillProgress, QueueError> {
        let limit = batch_size.max(1);
        let contacts = self.ledger.contacts()?;
        let mut index = self.cursor()?;
        let mut enqueued = 0;

        while index < contacts.len() && enqueued < limit {
            let contact = &contacts[index];
            index += 1;
            let Some(remote_id) = contact.linked_remote_id() else {
                continue;
            };
            let change = ChangePayload::LinkOnly(LinkOnlyChange {
                local_id: contact.local_id.clone(),
                remote_id: remote_id.to_string(),
            });
            self.queue.enqueue(&contact.local_id, remote_id, None, &change)?;
            enqueued += 1;
        }

        self.store.collection::<BackfillCursor>().save(&BackfillCursor {
            id: CURSOR_ID.to_string(),
            next_index: index,
        })?;

        let progress = BackfillProgress {
            enqueued,
            next_index: index,
            done: index >= contacts.len(),
            pending: self.queue.count_pending()?,
        };
        info!(
            enqueued = progress.enqueued,
            next_index = progress.next_index,
            done = progress.done,
            "link backfill batch"
        );
        Ok(progress)
    }

    /// Start the next batch from the first ledger row again.
    pub fn reset(&self) -> Result<(), QueueError> {
        self.store.collection::<BackfillCursor>().save(&BackfillCursor {
            id: CURSOR_ID.to_string(),
            next_index: 0,
        })?;
        Ok(())
    }

    fn cursor(&self) -> Result<usize, QueueError> {
        Ok(self
            .store
            .collection::<BackfillCursor>()
            .get(CURSOR_ID)?
            .map(|v| v.data.next_index)
            .unwrap_or(0))
    }
}
