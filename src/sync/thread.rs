//! Background scheduler running the tick worker on a fixed interval.

use std::sync::mpsc::{channel, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::info;

use crate::lock::LockManager;
use crate::model::ModelStore;
use crate::remote::DirectoryService;

use super::{TickOutcome, TickWorker};

/// Statistics from the scheduler thread.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Ticks that ran to completion or abort.
    pub ticks: usize,
    /// Ticks skipped because another tick held the lock.
    pub busy: usize,
    /// Completed ticks that carried a process-level error.
    pub failed: usize,
    pub processed: usize,
}

/// A background thread that calls [`TickWorker::tick`] every interval.
///
/// The worker is shared, so manual ticks from elsewhere go through the same
/// tick lock as scheduled ones.
///
/// ## Example
///
/// ```ignore
/// let worker = Arc::new(TickWorker::new(store, directory, locks, clock, &config));
/// let scheduler = SyncWorkerThread::spawn(Arc::clone(&worker), config.tick_interval);
///
/// // ... serve requests, call worker.tick() for "sync now" ...
///
/// let stats = scheduler.stop();
/// println!("ran {} ticks", stats.ticks);
/// ```
pub struct SyncWorkerThread {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<SchedulerStats>>,
}

impl SyncWorkerThread {
    /// Spawn the scheduler. The first tick runs immediately.
    pub fn spawn<S, D, L>(worker: Arc<TickWorker<S, D, L>>, interval: Duration) -> Self
    where
        S: ModelStore + 'static,
        D: DirectoryService + 'static,
        L: LockManager + 'static,
    {
        let (stop_tx, stop_rx) = channel();

        let handle = thread::spawn(move || {
            let mut stats = SchedulerStats::default();

            loop {
                match worker.tick() {
                    TickOutcome::Busy => stats.busy += 1,
                    TickOutcome::Completed(report) => {
                        stats.ticks += 1;
                        stats.processed += report.stats.processed;
                        if !report.is_ok() {
                            stats.failed += 1;
                        }
                    }
                }

                match stop_rx.recv_timeout(interval) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {}
                }
            }

            info!(ticks = stats.ticks, busy = stats.busy, "sync scheduler stopped");
            stats
        });

        Self {
            stop_tx,
            handle: Some(handle),
        }
    }

    /// Signal the scheduler to stop and wait for it to finish.
    /// Returns the scheduler statistics.
    pub fn stop(mut self) -> SchedulerStats {
        let _ = self.stop_tx.send(());
        if let Some(handle) = self.handle.take() {
            handle.join().unwrap_or_default()
        } else {
            SchedulerStats::default()
        }
    }

    /// Signal the scheduler to stop without waiting.
    pub fn signal_stop(&self) {
        let _ = self.stop_tx.send(());
    }
}

impl Drop for SyncWorkerThread {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
    }
}
