//! Shared fixtures: a manual clock, an in-memory directory, and a store
//! that can be switched into a failing mode.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use tribu_sync::ledger::{Cadence, Scores};
use tribu_sync::model::{InMemoryModelStore, Model, ModelError, ModelStore, Versioned};
use tribu_sync::{
    ChangePayload, Clock, ContactSaver, GroupDirectory, InMemoryDirectory, InMemoryLockManager,
    LinkOnlyChange, ManualClock, NormalChange, SyncConfig, TickWorker,
};

pub type Worker = TickWorker<FlakyStore, InMemoryDirectory, InMemoryLockManager>;
pub type Saver = ContactSaver<FlakyStore, InMemoryDirectory, InMemoryLockManager>;

pub const LINK_BASE: &str = "https://tribu.example/app";

/// In-memory store whose reads and writes can be made to fail.
#[derive(Clone, Default)]
pub struct FlakyStore {
    inner: InMemoryModelStore,
    failing: Arc<AtomicBool>,
}

impl FlakyStore {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), ModelError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(ModelError::Storage("store unavailable".into()))
        } else {
            Ok(())
        }
    }
}

impl ModelStore for FlakyStore {
    fn load<M: Model>(&self, id: &str) -> Result<Option<Versioned<M>>, ModelError> {
        self.check()?;
        self.inner.load(id)
    }

    fn upsert<M: Model>(&self, model: &M) -> Result<Versioned<M>, ModelError> {
        self.check()?;
        self.inner.upsert(model)
    }

    fn insert<M: Model>(&self, model: &M) -> Result<Versioned<M>, ModelError> {
        self.check()?;
        self.inner.insert(model)
    }

    fn update<M: Model>(
        &self,
        model: &M,
        expected_version: u64,
    ) -> Result<Versioned<M>, ModelError> {
        self.check()?;
        self.inner.update(model, expected_version)
    }

    fn scan<M: Model>(&self, keep: &dyn Fn(&M) -> bool) -> Result<Vec<Versioned<M>>, ModelError> {
        self.check()?;
        self.inner.scan(keep)
    }
}

pub struct Harness {
    pub clock: ManualClock,
    pub store: FlakyStore,
    pub directory: InMemoryDirectory,
    pub locks: InMemoryLockManager,
    pub worker: Arc<Worker>,
    pub saver: Saver,
}

pub fn groups() -> GroupDirectory {
    GroupDirectory::new()
        .with("01♥️", "contactGroups/heart")
        .with("02🏗", "contactGroups/building")
        .with("03🟢", "contactGroups/green")
        .with("05🟡", "contactGroups/yellow")
}

pub fn config() -> SyncConfig {
    SyncConfig::default()
        .with_link_base_url(LINK_BASE)
        .with_groups(groups())
}

pub fn harness() -> Harness {
    harness_with(config())
}

pub fn harness_with(config: SyncConfig) -> Harness {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 5, 4, 8, 0, 0).unwrap());
    let shared: Arc<dyn Clock> = Arc::new(clock.clone());
    let store = FlakyStore::default();
    let directory = InMemoryDirectory::new(Arc::clone(&shared));
    let locks = InMemoryLockManager::new();

    let worker = Arc::new(TickWorker::new(
        store.clone(),
        directory.clone(),
        locks.clone(),
        Arc::clone(&shared),
        &config,
    ));
    let saver = ContactSaver::new(
        store.clone(),
        directory.clone(),
        locks.clone(),
        shared,
        config,
    );

    Harness {
        clock,
        store,
        directory,
        locks,
        worker,
        saver,
    }
}

pub fn link_only(local_id: &str, remote_id: &str) -> ChangePayload {
    ChangePayload::LinkOnly(LinkOnlyChange {
        local_id: local_id.into(),
        remote_id: remote_id.into(),
    })
}

pub fn normal(local_id: &str, remote_id: &str) -> NormalChange {
    let scores = Scores {
        conf: Some(1.0),
        emo: Some(2.0),
        ene: Some(1.0),
        est: Some(1.0),
        rep: Some(0.0),
    };
    NormalChange {
        local_id: local_id.into(),
        remote_id: remote_id.into(),
        display_name: "Ada".into(),
        scores,
        cadence: Cadence::Monthly,
        total: scores.total(),
        icon: scores.category().map(|c| c.icon().to_string()),
        next_contact: None,
    }
}
