use std::fmt;

use crate::lock::LockError;
use crate::model::ModelError;
use crate::outbox::QueueError;

/// Why a save was refused or failed.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveError {
    /// The request itself is unusable.
    Invalid(String),
    /// The edit was made on data loaded too long ago; reload and retry.
    StaleEdit(String),
    /// The ledger lock could not be taken within the configured wait.
    LockTimeout,
    /// Birthday cadence requested but the remote birthday cannot be checked.
    BirthdayUnverifiable(String),
    /// Birthday cadence requested but the remote record has no month/day.
    BirthdayMissing(String),
    Lock(LockError),
    Store(ModelError),
    Queue(QueueError),
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::Invalid(msg) => write!(f, "invalid save request: {}", msg),
            SaveError::StaleEdit(msg) => write!(f, "stale edit: {}", msg),
            SaveError::LockTimeout => write!(f, "timed out waiting for the ledger lock"),
            SaveError::BirthdayUnverifiable(msg) => {
                write!(f, "cannot verify birthday: {}", msg)
            }
            SaveError::BirthdayMissing(id) => {
                write!(f, "birthday cadence needs a birthday (month/day) on {}", id)
            }
            SaveError::Lock(err) => write!(f, "{}", err),
            SaveError::Store(err) => write!(f, "{}", err),
            SaveError::Queue(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for SaveError {}

impl From<LockError> for SaveError {
    fn from(err: LockError) -> Self {
        SaveError::Lock(err)
    }
}

impl From<ModelError> for SaveError {
    fn from(err: ModelError) -> Self {
        SaveError::Store(err)
    }
}

impl From<QueueError> for SaveError {
    fn from(err: QueueError) -> Self {
        SaveError::Queue(err)
    }
}
