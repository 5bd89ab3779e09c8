use std::fmt;

use crate::model::ModelError;

use super::{OutboxStatus, PayloadError};

/// Errors raised by the outbox queue.
///
/// `Store` failures are process-level: the tick that hit one aborts.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueError {
    Store(ModelError),
    NotFound(String),
    Terminal {
        id: String,
        status: OutboxStatus,
    },
    InvalidTransition {
        id: String,
        from: OutboxStatus,
        to: OutboxStatus,
    },
    AttemptsDecreased {
        id: String,
        current: u32,
        requested: u32,
    },
    Payload(PayloadError),
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueError::Store(err) => write!(f, "outbox store error: {}", err),
            QueueError::NotFound(id) => write!(f, "outbox entry not found: {}", id),
            QueueError::Terminal { id, status } => {
                write!(f, "outbox entry {} is terminal ({})", id, status)
            }
            QueueError::InvalidTransition { id, from, to } => {
                write!(f, "outbox entry {}: cannot move {} -> {}", id, from, to)
            }
            QueueError::AttemptsDecreased {
                id,
                current,
                requested,
            } => write!(
                f,
                "outbox entry {}: attempts cannot go from {} to {}",
                id, current, requested
            ),
            QueueError::Payload(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for QueueError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QueueError::Store(err) => Some(err),
            QueueError::Payload(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ModelError> for QueueError {
    fn from(err: ModelError) -> Self {
        QueueError::Store(err)
    }
}

impl From<PayloadError> for QueueError {
    fn from(err: PayloadError) -> Self {
        QueueError::Payload(err)
    }
}
