//! Remote directory - the independently editable record service we push to.
//!
//! The sync engine only needs four calls: a masked read, a masked etag-checked
//! write, and group membership add/remove. [`InMemoryDirectory`] implements
//! all of them in-process.

mod error;
mod in_memory;
mod record;
mod token;

use std::sync::Arc;

pub use error::RemoteError;
pub use in_memory::{DirectoryOp, InMemoryDirectory};
pub use record::{
    CalendarDate, CustomField, FieldMask, RecordEvent, RecordField, RecordSource, RemoteRecord,
    SourceKind,
};
pub use token::ConcurrencyToken;

/// Access to the remote record service.
pub trait DirectoryService: Send + Sync {
    /// Read a record, returning only the fields in `mask`.
    fn get(&self, remote_id: &str, mask: &FieldMask) -> Result<RemoteRecord, RemoteError>;

    /// Replace the fields in `mask` with those of `record`.
    ///
    /// `record.etag` must match the stored etag, otherwise
    /// [`RemoteError::StaleEtag`].
    fn patch(
        &self,
        remote_id: &str,
        record: &RemoteRecord,
        mask: &FieldMask,
    ) -> Result<(), RemoteError>;

    fn add_member(&self, remote_id: &str, group_id: &str) -> Result<(), RemoteError>;

    fn remove_member(&self, remote_id: &str, group_id: &str) -> Result<(), RemoteError>;
}

impl<T: DirectoryService + ?Sized> DirectoryService for Arc<T> {
    fn get(&self, remote_id: &str, mask: &FieldMask) -> Result<RemoteRecord, RemoteError> {
        (**self).get(remote_id, mask)
    }

    fn patch(
        &self,
        remote_id: &str,
        record: &RemoteRecord,
        mask: &FieldMask,
    ) -> Result<(), RemoteError> {
        (**self).patch(remote_id, record, mask)
    }

    fn add_member(&self, remote_id: &str, group_id: &str) -> Result<(), RemoteError> {
        (**self).add_member(remote_id, group_id)
    }

    fn remove_member(&self, remote_id: &str, group_id: &str) -> Result<(), RemoteError> {
        (**self).remove_member(remote_id, group_id)
    }
}
