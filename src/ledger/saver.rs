use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::config::SyncConfig;
use crate::lock::{Lock, LockGuard, LockManager, LEDGER_LOCK};
use crate::model::ModelStore;
use crate::outbox::{ChangePayload, NormalChange, OutboxQueue};
use crate::remote::{ConcurrencyToken, DirectoryService, FieldMask, RecordField};

use super::{Cadence, Contact, Ledger, NextContactStatus, SaveError, Scores};

/// An edit of one contact as submitted by a client.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SaveRequest {
    pub local_id: String,
    /// Remote record id; falls back to the one already on the ledger row.
    pub remote_id: Option<String>,
    pub display_name: String,
    pub scores: Scores,
    pub cadence: Cadence,
    /// Explicit next-contact date. When absent one is proposed from the
    /// cadence.
    pub next_contact: Option<NaiveDate>,
    /// Remote token the client saw when it loaded the record.
    pub baseline: Option<ConcurrencyToken>,
    /// Whether the client changed anything since loading.
    pub dirty: bool,
    /// When the client loaded the data it edited.
    pub loaded_at: Option<DateTime<Utc>>,
}

/// Result of a successful save.
#[derive(Clone, Debug, PartialEq)]
pub struct SaveOutcome {
    pub contact: Contact,
    /// Queued change, if the contact is linked to a remote record.
    pub outbox_id: Option<String>,
    pub next_contact_status: NextContactStatus,
    pub proposed_next_contact: Option<NaiveDate>,
    /// Open outbox entries after this save.
    pub pending: usize,
}

/// The enqueue path: writes the ledger row and queues the remote change.
///
/// Never talks to the remote for writes; the tick worker does that later.
pub struct ContactSaver<S, D, L> {
    ledger: Ledger<S>,
    queue: OutboxQueue<S>,
    directory: D,
    locks: L,
    clock: Arc<dyn Clock>,
    config: SyncConfig,
}

impl<S, D, L> ContactSaver<S, D, L>
where
    S: ModelStore + Clone,
    D: DirectoryService,
    L: LockManager,
{
    pub fn new(store: S, directory: D, locks: L, clock: Arc<dyn Clock>, config: SyncConfig) -> Self {
        Self {
            ledger: Ledger::new(store.clone()),
            queue: OutboxQueue::new(store, Arc::clone(&clock)),
            directory,
            locks,
            clock,
            config,
        }
    }

    pub fn ledger(&self) -> &Ledger<S> {
        &self.ledger
    }

    pub fn save(&self, request: SaveRequest) -> Result<SaveOutcome, SaveError> {
        let local_id = request.local_id.trim().to_string();
        if local_id.is_empty() {
            return Err(SaveError::Invalid("local id is required".into()));
        }

        let lock = self.locks.get_lock(LEDGER_LOCK)?;
        if !lock.try_lock_for(self.config.lock_timeout)? {
            return Err(SaveError::LockTimeout);
        }
        let _guard = LockGuard::acquired(lock);

        let now = self.clock.now();
        self.check_fresh(&request, now)?;

        let existing = self.ledger.get(&local_id)?;
        let remote_id = request
            .remote_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .or_else(|| {
                existing
                    .as_ref()
                    .and_then(|c| c.linked_remote_id().map(str::to_string))
            });

        let today = now.date_naive();
        let next_contact = if request.cadence == Cadence::Birthday {
            self.check_birthday(remote_id.as_deref())?;
            None
        } else {
            request
                .next_contact
                .or_else(|| request.cadence.propose_next_contact(today))
        };

        let contact = Contact {
            local_id: local_id.clone(),
            remote_id: remote_id.clone(),
            display_name: request.display_name.trim().to_string(),
            scores: request.scores,
            cadence: request.cadence,
            total: request.scores.total(),
            icon: request.scores.category().map(|c| c.icon().to_string()),
            next_contact,
            updated_at: Some(now),
        };
        self.ledger.put(&contact)?;

        let outbox_id = match remote_id.as_deref() {
            Some(remote_id) => {
                let baseline = request
                    .baseline
                    .clone()
                    .or_else(|| self.live_token(remote_id));
                let change = ChangePayload::Normal(NormalChange {
                    local_id: contact.local_id.clone(),
                    remote_id: remote_id.to_string(),
                    display_name: contact.display_name.clone(),
                    scores: contact.scores,
                    cadence: contact.cadence,
                    total: contact.total,
                    icon: contact.icon.clone(),
                    next_contact: contact.next_contact,
                });
                Some(self.queue.enqueue(&local_id, remote_id, baseline, &change)?)
            }
            None => None,
        };

        info!(
            local_id = %local_id,
            queued = outbox_id.is_some(),
            cadence = %contact.cadence,
            "saved contact"
        );

        Ok(SaveOutcome {
            next_contact_status: NextContactStatus::of(contact.next_contact, contact.cadence, today),
            proposed_next_contact: contact.cadence.propose_next_contact(today),
            outbox_id,
            pending: self.queue.count_pending()?,
            contact,
        })
    }

    fn check_fresh(&self, request: &SaveRequest, now: DateTime<Utc>) -> Result<(), SaveError> {
        if !request.dirty {
            return Ok(());
        }
        let loaded_at = request
            .loaded_at
            .ok_or_else(|| SaveError::StaleEdit("edit has no load timestamp".into()))?;
        let age = (now - loaded_at).to_std().unwrap_or_default();
        if age > self.config.stale_edit {
            return Err(SaveError::StaleEdit(format!(
                "loaded {}s ago, limit is {}s",
                age.as_secs(),
                self.config.stale_edit.as_secs()
            )));
        }
        Ok(())
    }

    fn check_birthday(&self, remote_id: Option<&str>) -> Result<(), SaveError> {
        let remote_id = remote_id.ok_or_else(|| {
            SaveError::BirthdayUnverifiable("contact has no remote record".into())
        })?;
        let mask = FieldMask::new().with(RecordField::Birthdays);
        let record = self
            .directory
            .get(remote_id, &mask)
            .map_err(|e| SaveError::BirthdayUnverifiable(e.to_string()))?;
        if !record.has_birthday_month_day() {
            return Err(SaveError::BirthdayMissing(remote_id.to_string()));
        }
        Ok(())
    }

    /// Best-effort read of the remote token; a failed read means no baseline.
    fn live_token(&self, remote_id: &str) -> Option<ConcurrencyToken> {
        let mask = FieldMask::new().with(RecordField::Metadata);
        match self.directory.get(remote_id, &mask) {
            Ok(record) => ConcurrencyToken::current(&record.sources),
            Err(err) => {
                debug!(remote_id, error = %err, "no baseline token, skipping conflict check");
                None
            }
        }
    }
}
