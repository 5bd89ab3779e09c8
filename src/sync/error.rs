use std::fmt;

use crate::lock::LockError;
use crate::outbox::QueueError;

/// Process-level failure that aborts a tick.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncError {
    Queue(QueueError),
    Lock(LockError),
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::Queue(err) => write!(f, "{}", err),
            SyncError::Lock(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncError::Queue(err) => Some(err),
            SyncError::Lock(err) => Some(err),
        }
    }
}

impl From<QueueError> for SyncError {
    fn from(err: QueueError) -> Self {
        SyncError::Queue(err)
    }
}

impl From<LockError> for SyncError {
    fn from(err: LockError) -> Self {
        SyncError::Lock(err)
    }
}
