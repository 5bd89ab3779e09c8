use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tribu_sync_macros::Model;

use crate::remote::ConcurrencyToken;

use super::QueueError;

/// Lifecycle status of an outbox entry.
///
/// `Pending` and `Retry` are the only non-terminal states.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutboxStatus {
    #[default]
    Pending,
    Retry,
    Done,
    Conflict,
    Skipped,
}

impl OutboxStatus {
    pub fn is_open(self) -> bool {
        matches!(self, OutboxStatus::Pending | OutboxStatus::Retry)
    }

    pub fn is_terminal(self) -> bool {
        !self.is_open()
    }

    /// Whether the worker may move an entry from `self` to `to`.
    pub fn can_transition_to(self, to: OutboxStatus) -> bool {
        self.is_open() && to != OutboxStatus::Pending
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OutboxStatus::Pending => "PENDING",
            OutboxStatus::Retry => "RETRY",
            OutboxStatus::Done => "DONE",
            OutboxStatus::Conflict => "CONFLICT",
            OutboxStatus::Skipped => "SKIPPED",
        }
    }
}

impl fmt::Display for OutboxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One queued intent to mutate one remote record.
///
/// Field names on the wire follow the outbox storage layout
/// (`OutboxId`, `CreatedAt`, `LocalId`, ...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Model)]
#[model(collection = "outbox")]
#[serde(rename_all = "PascalCase")]
pub struct OutboxEntry {
    #[model(id)]
    #[serde(rename = "OutboxId")]
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub local_id: String,
    pub remote_id: String,
    /// Remote concurrency token captured at enqueue time. `None` skips the
    /// conflict check.
    #[serde(rename = "BaselineToken", default)]
    pub baseline: Option<ConcurrencyToken>,
    /// Serialized `PayloadEnvelope`.
    #[serde(rename = "PayloadEnvelope")]
    pub payload: String,
    pub status: OutboxStatus,
    pub attempts: u32,
    #[serde(default)]
    pub next_try_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_error: Option<String>,
    #[serde(default)]
    pub applied_at: Option<DateTime<Utc>>,
}

impl OutboxEntry {
    /// Due entries are open and either have no retry time or a retry time
    /// that has passed.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status.is_open() && self.next_try_at.map_or(true, |at| at <= now)
    }

    /// Apply a partial update, enforcing the status state machine.
    ///
    /// Terminal entries are immutable; attempts never decrease; leaving
    /// `Retry` clears `next_try_at`.
    pub fn apply(&mut self, patch: EntryPatch) -> Result<(), QueueError> {
        if self.status.is_terminal() {
            return Err(QueueError::Terminal {
                id: self.id.clone(),
                status: self.status,
            });
        }

        if let Some(to) = patch.status {
            if !self.status.can_transition_to(to) {
                return Err(QueueError::InvalidTransition {
                    id: self.id.clone(),
                    from: self.status,
                    to,
                });
            }
        }

        if let Some(attempts) = patch.attempts {
            if attempts < self.attempts {
                return Err(QueueError::AttemptsDecreased {
                    id: self.id.clone(),
                    current: self.attempts,
                    requested: attempts,
                });
            }
            self.attempts = attempts;
        }

        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(next_try_at) = patch.next_try_at {
            self.next_try_at = next_try_at;
        }
        if let Some(last_error) = patch.last_error {
            self.last_error = last_error;
        }
        if let Some(applied_at) = patch.applied_at {
            self.applied_at = Some(applied_at);
        }

        if self.status != OutboxStatus::Retry {
            self.next_try_at = None;
        }

        Ok(())
    }
}

/// Partial update of an entry's mutable fields. `None` leaves a field as is.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntryPatch {
    pub status: Option<OutboxStatus>,
    pub attempts: Option<u32>,
    pub next_try_at: Option<Option<DateTime<Utc>>>,
    pub last_error: Option<Option<String>>,
    pub applied_at: Option<DateTime<Utc>>,
}

impl EntryPatch {
    pub fn done(now: DateTime<Utc>) -> Self {
        Self {
            status: Some(OutboxStatus::Done),
            last_error: Some(None),
            applied_at: Some(now),
            ..Default::default()
        }
    }

    pub fn conflict(now: DateTime<Utc>, reason: impl Into<String>) -> Self {
        Self {
            status: Some(OutboxStatus::Conflict),
            last_error: Some(Some(reason.into())),
            applied_at: Some(now),
            ..Default::default()
        }
    }

    pub fn skipped(now: DateTime<Utc>, reason: impl Into<String>) -> Self {
        Self {
            status: Some(OutboxStatus::Skipped),
            last_error: Some(Some(reason.into())),
            applied_at: Some(now),
            ..Default::default()
        }
    }

    /// Failed attempt with attempts left: schedule the next try.
    pub fn retry(attempts: u32, next_try_at: DateTime<Utc>, error: impl Into<String>) -> Self {
        Self {
            status: Some(OutboxStatus::Retry),
            attempts: Some(attempts),
            next_try_at: Some(Some(next_try_at)),
            last_error: Some(Some(error.into())),
            ..Default::default()
        }
    }

    /// Failed attempt that used up the last allowed try.
    pub fn exhausted(attempts: u32, now: DateTime<Utc>, error: impl Into<String>) -> Self {
        Self {
            status: Some(OutboxStatus::Skipped),
            attempts: Some(attempts),
            next_try_at: Some(None),
            last_error: Some(Some(error.into())),
            applied_at: Some(now),
        }
    }
}
