//! Named locks for the sync engine.
//!
//! Two keys are in use. [`TICK_LOCK`] admits one tick at a time across the
//! process; a tick that cannot take it reports busy instead of waiting.
//! [`LEDGER_LOCK`] serializes saves to the local ledger with a bounded wait.
//! Ticks and saves never take each other's key.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

mod guard;
mod in_memory;

pub use guard::LockGuard;
pub use in_memory::{InMemoryLock, InMemoryLockManager};

/// Key of the process-wide tick lock.
pub const TICK_LOCK: &str = "outbox:tick";

/// Key of the ledger write lock used by the enqueue path.
pub const LEDGER_LOCK: &str = "ledger:write";

/// One named lock. `Ok(false)` from either acquire means someone else holds it.
pub trait Lock: Send + Sync {
    /// Take the lock only if it is free right now.
    fn try_lock(&self) -> Result<bool, LockError>;

    /// Take the lock, waiting at most `timeout` for the holder to release it.
    fn try_lock_for(&self, timeout: Duration) -> Result<bool, LockError>;

    fn unlock(&self) -> Result<(), LockError>;
}

/// Hands out locks by key. The same key always yields the same lock, across
/// clones of the manager too.
pub trait LockManager: Send + Sync {
    type Lock: Lock;

    fn get_lock(&self, key: &str) -> Result<Arc<Self::Lock>, LockError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    /// A thread panicked while it held the lock state.
    Poisoned(String),
}

impl fmt::Display for LockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockError::Poisoned(msg) => write!(f, "lock state poisoned: {}", msg),
        }
    }
}

impl std::error::Error for LockError {}
