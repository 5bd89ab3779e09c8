use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::support::{harness, link_only};
use tribu_sync::SyncWorkerThread;

#[test]
fn scheduler_drains_the_queue() {
    let h = harness();
    for i in 0..3 {
        let remote = format!("people/c{i}");
        h.directory.create(&remote).unwrap();
        h.worker
            .queue()
            .enqueue(&format!("c-{i}"), &remote, None, &link_only(&format!("c-{i}"), &remote))
            .unwrap();
    }

    let scheduler = SyncWorkerThread::spawn(Arc::clone(&h.worker), Duration::from_millis(20));

    let deadline = Instant::now() + Duration::from_secs(5);
    while h.worker.queue().count_pending().unwrap() > 0 {
        assert!(Instant::now() < deadline, "queue never drained");
        thread::sleep(Duration::from_millis(10));
    }

    let stats = scheduler.stop();
    assert!(stats.ticks >= 1);
    assert_eq!(stats.processed, 3);
    assert_eq!(stats.failed, 0);
    assert_eq!(h.directory.write_count(), 3);
}

#[test]
fn stop_returns_promptly_with_long_interval() {
    let h = harness();
    let scheduler = SyncWorkerThread::spawn(Arc::clone(&h.worker), Duration::from_secs(3600));

    // wait for the immediate first tick
    let deadline = Instant::now() + Duration::from_secs(5);
    while h.worker.last_report().is_none() {
        assert!(Instant::now() < deadline, "first tick never ran");
        thread::sleep(Duration::from_millis(5));
    }

    let started = Instant::now();
    let stats = scheduler.stop();
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(stats.ticks, 1);
    assert_eq!(stats.processed, 0);
}
