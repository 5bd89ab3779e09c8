//! Typed, versioned record storage.
//!
//! The outbox queue, the ledger and the backfill cursor all persist their
//! rows through a [`ModelStore`]. Every write bumps a row version, and scans
//! return rows in the order they were first written, which is what makes
//! "oldest first" the natural order of the outbox.
//!
//! ```ignore
//! #[derive(Clone, Serialize, Deserialize, Model)]
//! #[model(collection = "contacts")]
//! struct Contact {
//!     #[model(id)]
//!     local_id: String,
//! }
//!
//! let store = InMemoryModelStore::new();
//! store.collection::<Contact>().save(&contact)?;
//! let row = store.collection::<Contact>().get("c-1")?;
//! ```

mod collection;
mod in_memory;

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

pub use collection::{Collection, StoreExt};
pub use in_memory::InMemoryModelStore;

/// A record type with a collection name and a string id.
pub trait Model: Serialize + DeserializeOwned + Clone + Send + Sync {
    const COLLECTION: &'static str;

    fn id(&self) -> &str;
}

/// A stored row and the version it was read or written at.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub data: T,
    pub version: u64,
}

/// Row storage with optimistic versioning.
///
/// `scan` must return rows in first-write order; rewriting a row keeps its
/// place.
pub trait ModelStore: Send + Sync {
    fn load<M: Model>(&self, id: &str) -> Result<Option<Versioned<M>>, ModelError>;

    /// Write without a version check, creating the row if needed.
    fn upsert<M: Model>(&self, model: &M) -> Result<Versioned<M>, ModelError>;

    /// Create a row at version 1. An existing row is a conflict.
    fn insert<M: Model>(&self, model: &M) -> Result<Versioned<M>, ModelError>;

    /// Replace a row that is still at `expected_version`.
    fn update<M: Model>(&self, model: &M, expected_version: u64)
        -> Result<Versioned<M>, ModelError>;

    fn scan<M: Model>(&self, keep: &dyn Fn(&M) -> bool) -> Result<Vec<Versioned<M>>, ModelError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// The row changed since it was read.
    ConcurrencyConflict {
        collection: String,
        id: String,
        expected: u64,
        actual: u64,
    },
    Serde(String),
    Storage(String),
    NotFound { collection: String, id: String },
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::ConcurrencyConflict {
                collection,
                id,
                expected,
                actual,
            } => write!(
                f,
                "{}/{} is at version {}, expected {}",
                collection, id, actual, expected
            ),
            ModelError::Serde(msg) => write!(f, "row encoding failed: {}", msg),
            ModelError::Storage(msg) => write!(f, "storage failure: {}", msg),
            ModelError::NotFound { collection, id } => {
                write!(f, "no row {}/{}", collection, id)
            }
        }
    }
}

impl std::error::Error for ModelError {}
