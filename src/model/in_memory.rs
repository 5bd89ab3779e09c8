use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Deserialize;
use serde_json::Value;

use super::{Model, ModelError, ModelStore, Versioned};

struct Row {
    id: String,
    value: Value,
    version: u64,
}

/// Rows of one collection. `rows` is in first-write order.
#[derive(Default)]
struct Table {
    rows: Vec<Row>,
    positions: HashMap<String, usize>,
}

impl Table {
    fn version_of(&self, id: &str) -> Option<u64> {
        self.positions.get(id).map(|&i| self.rows[i].version)
    }

    fn put(&mut self, id: &str, value: Value, version: u64) {
        match self.positions.get(id) {
            Some(&i) => {
                self.rows[i].value = value;
                self.rows[i].version = version;
            }
            None => {
                self.positions.insert(id.to_string(), self.rows.len());
                self.rows.push(Row {
                    id: id.to_string(),
                    value,
                    version,
                });
            }
        }
    }
}

/// Process-local [`ModelStore`] holding rows as JSON values. Clones share
/// the same tables.
#[derive(Clone, Default)]
pub struct InMemoryModelStore {
    tables: Arc<RwLock<HashMap<&'static str, Table>>>,
}

impl InMemoryModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<&'static str, Table>>, ModelError> {
        self.tables
            .read()
            .map_err(|_| ModelError::Storage("store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<&'static str, Table>>, ModelError> {
        self.tables
            .write()
            .map_err(|_| ModelError::Storage("store lock poisoned".into()))
    }
}

fn to_value<M: Model>(model: &M) -> Result<Value, ModelError> {
    serde_json::to_value(model).map_err(|e| ModelError::Serde(e.to_string()))
}

fn from_value<M: Model>(value: &Value) -> Result<M, ModelError> {
    M::deserialize(value).map_err(|e| ModelError::Serde(e.to_string()))
}

fn stored<M: Model>(model: &M, version: u64) -> Versioned<M> {
    Versioned {
        data: model.clone(),
        version,
    }
}

impl ModelStore for InMemoryModelStore {
    fn load<M: Model>(&self, id: &str) -> Result<Option<Versioned<M>>, ModelError> {
        let tables = self.read()?;
        let Some(table) = tables.get(M::COLLECTION) else {
            return Ok(None);
        };
        table
            .positions
            .get(id)
            .map(|&i| {
                let row = &table.rows[i];
                Ok(Versioned {
                    data: from_value(&row.value)?,
                    version: row.version,
                })
            })
            .transpose()
    }

    fn upsert<M: Model>(&self, model: &M) -> Result<Versioned<M>, ModelError> {
        let value = to_value(model)?;
        let mut tables = self.write()?;
        let table = tables.entry(M::COLLECTION).or_default();
        let version = table.version_of(model.id()).map_or(1, |v| v + 1);
        table.put(model.id(), value, version);
        Ok(stored(model, version))
    }

    fn insert<M: Model>(&self, model: &M) -> Result<Versioned<M>, ModelError> {
        let value = to_value(model)?;
        let mut tables = self.write()?;
        let table = tables.entry(M::COLLECTION).or_default();
        if let Some(actual) = table.version_of(model.id()) {
            return Err(ModelError::ConcurrencyConflict {
                collection: M::COLLECTION.to_string(),
                id: model.id().to_string(),
                expected: 0,
                actual,
            });
        }
        table.put(model.id(), value, 1);
        Ok(stored(model, 1))
    }

    fn update<M: Model>(
        &self,
        model: &M,
        expected_version: u64,
    ) -> Result<Versioned<M>, ModelError> {
        let value = to_value(model)?;
        let mut tables = self.write()?;
        let table = tables.entry(M::COLLECTION).or_default();
        let actual = table
            .version_of(model.id())
            .ok_or_else(|| ModelError::NotFound {
                collection: M::COLLECTION.to_string(),
                id: model.id().to_string(),
            })?;
        if actual != expected_version {
            return Err(ModelError::ConcurrencyConflict {
                collection: M::COLLECTION.to_string(),
                id: model.id().to_string(),
                expected: expected_version,
                actual,
            });
        }
        table.put(model.id(), value, actual + 1);
        Ok(stored(model, actual + 1))
    }

    fn scan<M: Model>(&self, keep: &dyn Fn(&M) -> bool) -> Result<Vec<Versioned<M>>, ModelError> {
        let tables = self.read()?;
        let Some(table) = tables.get(M::COLLECTION) else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        for row in &table.rows {
            let data: M = from_value(&row.value)?;
            if keep(&data) {
                out.push(Versioned {
                    data,
                    version: row.version,
                });
            }
        }
        Ok(out)
    }
}
