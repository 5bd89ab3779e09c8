use std::sync::Arc;

use tracing::warn;

use super::Lock;

/// Holds an acquired lock and releases it on drop.
///
/// Constructed only after a successful `try_lock` or `try_lock_for`,
/// so early returns and `?` inside the critical section cannot leak the lock.
pub struct LockGuard<L: Lock + ?Sized> {
    lock: Arc<L>,
}

impl<L: Lock + ?Sized> LockGuard<L> {
    /// Wrap a lock that the caller has already acquired.
    pub fn acquired(lock: Arc<L>) -> Self {
        Self { lock }
    }
}

impl<L: Lock + ?Sized> Drop for LockGuard<L> {
    fn drop(&mut self) {
        if let Err(err) = self.lock.unlock() {
            warn!(error = %err, "failed to release lock");
        }
    }
}
