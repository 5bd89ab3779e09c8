use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tribu_sync_macros::Model;

use crate::model::{ModelError, ModelStore, StoreExt};

use super::{Cadence, Scores};

/// One row of the local ledger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Model)]
#[model(collection = "contacts")]
pub struct Contact {
    #[model(id)]
    pub local_id: String,
    /// Id of the linked remote record, if any.
    #[serde(default)]
    pub remote_id: Option<String>,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub scores: Scores,
    #[serde(default)]
    pub cadence: Cadence,
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub next_contact: Option<NaiveDate>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Contact {
    pub fn new(local_id: impl Into<String>) -> Self {
        Self {
            local_id: local_id.into(),
            remote_id: None,
            display_name: String::new(),
            scores: Scores::default(),
            cadence: Cadence::Unset,
            total: None,
            icon: None,
            next_contact: None,
            updated_at: None,
        }
    }

    pub fn with_remote_id(mut self, remote_id: impl Into<String>) -> Self {
        self.remote_id = Some(remote_id.into());
        self
    }

    /// Linked remote id, ignoring blanks.
    pub fn linked_remote_id(&self) -> Option<&str> {
        self.remote_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Local record store: contact rows, in insertion order.
pub struct Ledger<S> {
    store: S,
}

impl<S: ModelStore> Ledger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn get(&self, local_id: &str) -> Result<Option<Contact>, ModelError> {
        Ok(self.store.collection::<Contact>().get(local_id)?.map(|v| v.data))
    }

    pub fn put(&self, contact: &Contact) -> Result<(), ModelError> {
        self.store.collection::<Contact>().save(contact)?;
        Ok(())
    }

    pub fn contacts(&self) -> Result<Vec<Contact>, ModelError> {
        Ok(self
            .store
            .collection::<Contact>()
            .all()?
            .into_iter()
            .map(|v| v.data)
            .collect())
    }
}
