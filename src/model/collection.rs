use std::marker::PhantomData;

use super::{Model, ModelError, ModelStore, Versioned};

/// One model type's rows in a store.
pub struct Collection<'a, S, M> {
    store: &'a S,
    _model: PhantomData<M>,
}

impl<'a, S: ModelStore, M: Model> Collection<'a, S, M> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            _model: PhantomData,
        }
    }

    pub fn get(&self, id: &str) -> Result<Option<Versioned<M>>, ModelError> {
        self.store.load(id)
    }

    pub fn save(&self, model: &M) -> Result<Versioned<M>, ModelError> {
        self.store.upsert(model)
    }

    pub fn insert(&self, model: &M) -> Result<Versioned<M>, ModelError> {
        self.store.insert(model)
    }

    pub fn update(&self, model: &M, expected_version: u64) -> Result<Versioned<M>, ModelError> {
        self.store.update(model, expected_version)
    }

    pub fn find(&self, keep: &dyn Fn(&M) -> bool) -> Result<Vec<Versioned<M>>, ModelError> {
        self.store.scan(keep)
    }

    pub fn all(&self) -> Result<Vec<Versioned<M>>, ModelError> {
        self.store.scan(&|_| true)
    }
}

/// `store.collection::<M>()` on any [`ModelStore`].
pub trait StoreExt: ModelStore + Sized {
    fn collection<M: Model>(&self) -> Collection<'_, Self, M> {
        Collection::new(self)
    }
}

impl<S: ModelStore> StoreExt for S {}
