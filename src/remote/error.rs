use std::fmt;

/// Errors from a [`DirectoryService`](super::DirectoryService).
///
/// All of them are transient from the tick worker's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    NotFound(String),
    /// The record changed since it was read.
    StaleEtag(String),
    /// The service refused the request.
    Rejected(String),
    Transport(String),
    /// A read came back without source metadata.
    MissingMetadata(String),
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteError::NotFound(id) => write!(f, "remote record not found: {}", id),
            RemoteError::StaleEtag(id) => write!(f, "stale etag for {}", id),
            RemoteError::Rejected(msg) => write!(f, "remote rejected request: {}", msg),
            RemoteError::Transport(msg) => write!(f, "remote transport error: {}", msg),
            RemoteError::MissingMetadata(id) => write!(f, "no source metadata on {}", id),
        }
    }
}

impl std::error::Error for RemoteError {}
