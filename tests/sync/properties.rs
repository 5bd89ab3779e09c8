//! Lifecycle guarantees of queued changes.

use chrono::Duration;
use tribu_sync::remote::{CustomField, DirectoryOp, FieldMask, RecordEvent, RecordField};
use tribu_sync::{
    Cadence, ChangePayload, Clock, ConcurrencyToken, DirectoryService, EntryPatch, OutboxStatus,
    SaveRequest, TickOutcome, WorkerRunReport,
};

use crate::support::{harness, link_only, normal};

fn completed(outcome: TickOutcome) -> WorkerRunReport {
    match outcome {
        TickOutcome::Completed(report) => report,
        TickOutcome::Busy => panic!("tick unexpectedly busy"),
    }
}

#[test]
fn empty_remote_id_is_skipped_without_attempts() {
    let h = harness();
    let queue = h.worker.queue();
    let id = queue.enqueue("c-1", "", None, &link_only("c-1", "")).unwrap();

    let report = completed(h.worker.tick());
    assert_eq!(report.stats.skipped, 1);

    let entry = queue.get(&id).unwrap().unwrap();
    assert_eq!(entry.status, OutboxStatus::Skipped);
    assert_eq!(entry.attempts, 0);
    assert_eq!(entry.last_error.as_deref(), Some("missing remote id"));
    assert_eq!(entry.applied_at, Some(h.clock.now()));
    assert_eq!(h.directory.write_count(), 0);
}

#[test]
fn conflict_leaves_remote_untouched() {
    let h = harness();
    let created = h.directory.create("people/c1").unwrap();
    let baseline = ConcurrencyToken::current(&created.sources);

    h.directory
        .simulate_user_edit("people/c1", |r| {
            r.custom_fields.push(CustomField::new("Nickname", "Ace"))
        })
        .unwrap();
    let before = h.directory.record("people/c1").unwrap();

    let change = ChangePayload::Normal(normal("c-1", "people/c1"));
    let id = h
        .worker
        .queue()
        .enqueue("c-1", "people/c1", baseline, &change)
        .unwrap();

    let report = completed(h.worker.tick());
    assert_eq!(report.stats.conflict, 1);

    let entry = h.worker.queue().get(&id).unwrap().unwrap();
    assert_eq!(entry.status, OutboxStatus::Conflict);
    assert_eq!(entry.attempts, 0);
    assert!(entry.last_error.is_some());
    assert_eq!(h.directory.record("people/c1").unwrap(), before);
    assert_eq!(h.directory.write_count(), 0);

    // conflicts are never retried
    h.clock.advance(Duration::hours(3));
    assert_eq!(completed(h.worker.tick()).stats.processed, 0);
}

#[test]
fn link_only_keeps_packed_entry_and_events() {
    let h = harness();
    h.directory.create("people/c1").unwrap();
    let prox = RecordEvent {
        kind: "Próx. Contacto".into(),
        formatted_kind: "Próx. Contacto".into(),
        date: None,
        primary: true,
    };
    let seeded_event = prox.clone();
    h.directory
        .simulate_user_edit("people/c1", move |r| {
            r.custom_fields = vec![
                CustomField::new("tr_emo", "2"),
                CustomField::new("Tribu ROI", "1 | 2 | 1 | 1 | 0 | 8 | 1M"),
                CustomField::new("Tribu Link", "https://old.example/?cid=c-1"),
                CustomField::new("Company", "Acme"),
            ];
            r.events = vec![seeded_event];
        })
        .unwrap();

    h.worker
        .queue()
        .enqueue("c-1", "people/c1", None, &link_only("c-1", "people/c1"))
        .unwrap();
    assert_eq!(completed(h.worker.tick()).stats.done, 1);

    let record = h.directory.record("people/c1").unwrap();
    assert_eq!(
        record.custom_fields,
        vec![
            CustomField::new("Tribu ROI", "1 | 2 | 1 | 1 | 0 | 8 | 1M"),
            CustomField::new("Company", "Acme"),
            CustomField::new("Tribu Link", "https://tribu.example/app?cid=c-1"),
        ]
    );
    assert_eq!(record.events, vec![prox]);
    assert!(record.memberships.is_empty());
}

#[test]
fn last_allowed_attempt_gives_up() {
    let h = harness();
    h.directory.create("people/c1").unwrap();
    let queue = h.worker.queue();
    let id = queue
        .enqueue("c-1", "people/c1", None, &link_only("c-1", "people/c1"))
        .unwrap();
    queue
        .write_patch(&id, EntryPatch::retry(7, h.clock.now(), "earlier failure"))
        .unwrap();
    h.directory
        .fail_next(DirectoryOp::Patch, "people/c1", 1)
        .unwrap();

    let report = completed(h.worker.tick());
    assert_eq!(report.stats.skipped, 1);
    assert_eq!(report.stats.errors, 1);

    let entry = queue.get(&id).unwrap().unwrap();
    assert_eq!(entry.status, OutboxStatus::Skipped);
    assert_eq!(entry.attempts, 8);
    assert_eq!(entry.next_try_at, None);
    assert!(entry.last_error.unwrap().contains("injected patch failure"));
}

#[test]
fn batch_limit_leaves_the_rest_due() {
    let h = harness();
    let queue = h.worker.queue();
    for i in 0..25 {
        let remote = format!("people/c{i}");
        h.directory.create(&remote).unwrap();
        queue
            .enqueue(&format!("c-{i}"), &remote, None, &link_only(&format!("c-{i}"), &remote))
            .unwrap();
    }

    let report = completed(h.worker.tick());
    assert_eq!(report.stats.processed, 20);
    assert_eq!(report.stats.done, 20);

    let due = queue.scan_due(h.clock.now()).unwrap();
    assert_eq!(due.len(), 5);
    assert_eq!(due[0].local_id, "c-20");
    assert_eq!(queue.count_pending().unwrap(), 5);
}

#[test]
fn weekly_save_round_trips_to_one_event() {
    let h = harness();
    h.directory.create("people/c1").unwrap();

    let request = SaveRequest {
        local_id: "c-1".into(),
        remote_id: Some("people/c1".into()),
        display_name: "Ada".into(),
        cadence: Cadence::Weekly,
        ..Default::default()
    };
    let enqueue_date = h.clock.today();
    h.saver.save(request).unwrap();

    assert_eq!(completed(h.worker.tick()).stats.done, 1);

    let events: Vec<RecordEvent> = h
        .directory
        .get("people/c1", &FieldMask::new().with(RecordField::Events))
        .unwrap()
        .events
        .into_iter()
        .filter(|e| e.kind == "Próx. Contacto")
        .collect();
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0].date,
        Some((enqueue_date + Duration::days(7)).into())
    );
}

#[test]
fn second_tick_makes_no_remote_writes() {
    let h = harness();
    h.directory.create("people/c1").unwrap();
    let change = ChangePayload::Normal(normal("c-1", "people/c1"));
    h.worker
        .queue()
        .enqueue("c-1", "people/c1", None, &change)
        .unwrap();

    assert_eq!(completed(h.worker.tick()).stats.done, 1);
    let writes = h.directory.write_count();
    assert!(writes > 0);

    let report = completed(h.worker.tick());
    assert_eq!(report.stats.processed, 0);
    assert_eq!(h.directory.write_count(), writes);
}

#[test]
fn each_failure_adds_one_attempt() {
    let h = harness();
    h.directory.create("people/c1").unwrap();
    h.directory
        .fail_next(DirectoryOp::Get, "people/c1", 3)
        .unwrap();
    let queue = h.worker.queue();
    let id = queue
        .enqueue("c-1", "people/c1", None, &link_only("c-1", "people/c1"))
        .unwrap();

    for (expected, backoff_minutes) in [(1, 1), (2, 2), (3, 5)] {
        completed(h.worker.tick());
        let entry = queue.get(&id).unwrap().unwrap();
        assert_eq!(entry.status, OutboxStatus::Retry);
        assert_eq!(entry.attempts, expected);
        assert_eq!(
            entry.next_try_at,
            Some(h.clock.now() + Duration::minutes(backoff_minutes))
        );
        h.clock.advance(Duration::minutes(10));
    }

    completed(h.worker.tick());
    let entry = queue.get(&id).unwrap().unwrap();
    assert_eq!(entry.status, OutboxStatus::Done);
    assert_eq!(entry.attempts, 3);
    assert_eq!(entry.last_error, None);
    assert_eq!(entry.next_try_at, None);
}
