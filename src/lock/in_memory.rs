use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use super::{Lock, LockError, LockManager};

fn poisoned<T>(err: std::sync::PoisonError<T>) -> LockError {
    LockError::Poisoned(err.to_string())
}

/// Process-local lock: a held flag plus a condvar to wake bounded waiters.
#[derive(Default)]
pub struct InMemoryLock {
    held: Mutex<bool>,
    released: Condvar,
}

impl InMemoryLock {
    pub fn new() -> Self {
        Self::default()
    }

    fn held(&self) -> Result<MutexGuard<'_, bool>, LockError> {
        self.held.lock().map_err(poisoned)
    }
}

impl Lock for InMemoryLock {
    fn try_lock(&self) -> Result<bool, LockError> {
        let mut held = self.held()?;
        if *held {
            return Ok(false);
        }
        *held = true;
        Ok(true)
    }

    fn try_lock_for(&self, timeout: Duration) -> Result<bool, LockError> {
        // No representable deadline means wait until released.
        let deadline = Instant::now().checked_add(timeout);
        let mut held = self.held()?;
        while *held {
            held = match deadline {
                Some(deadline) => {
                    let left = deadline.saturating_duration_since(Instant::now());
                    if left.is_zero() {
                        return Ok(false);
                    }
                    self.released.wait_timeout(held, left).map_err(poisoned)?.0
                }
                None => self.released.wait(held).map_err(poisoned)?,
            };
        }
        *held = true;
        Ok(true)
    }

    fn unlock(&self) -> Result<(), LockError> {
        let mut held = self.held()?;
        if std::mem::replace(&mut *held, false) {
            self.released.notify_one();
        }
        Ok(())
    }
}

/// Keyed [`InMemoryLock`]s, created on first use. Clones share the same
/// locks, so the worker, the saver and the http surface can each hold one.
#[derive(Clone, Default)]
pub struct InMemoryLockManager {
    locks: Arc<Mutex<HashMap<String, Arc<InMemoryLock>>>>,
}

impl InMemoryLockManager {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LockManager for InMemoryLockManager {
    type Lock = InMemoryLock;

    fn get_lock(&self, key: &str) -> Result<Arc<InMemoryLock>, LockError> {
        let mut locks = self.locks.lock().map_err(poisoned)?;
        Ok(Arc::clone(locks.entry(key.to_string()).or_default()))
    }
}
