use tribu_sync::remote::CustomField;
use tribu_sync::{Contact, Ledger};

use crate::support::harness;

#[test]
fn backfill_writes_links_only() {
    let h = harness();
    let ledger = Ledger::new(h.store.clone());
    for (local, remote) in [
        ("a", Some("people/a")),
        ("b", None),
        ("c", Some("people/c")),
        ("d", Some("people/d")),
    ] {
        let mut contact = Contact::new(local);
        contact.remote_id = remote.map(str::to_string);
        ledger.put(&contact).unwrap();
        if let Some(remote) = remote {
            h.directory.create(remote).unwrap();
        }
    }
    h.directory
        .simulate_user_edit("people/c", |r| {
            r.custom_fields = vec![
                CustomField::new("Tribu ROI", "2 | 1 | 1 | 1 | 1 | 12 | A"),
                CustomField::new("tr_conf", "2"),
            ]
        })
        .unwrap();

    let first = h.backfill.enqueue_batch(2).unwrap();
    assert_eq!(first.enqueued, 2);
    assert!(!first.done);
    let second = h.backfill.enqueue_batch(2).unwrap();
    assert_eq!(second.enqueued, 1);
    assert!(second.done);
    assert_eq!(second.pending, 3);

    let report = h.worker.tick().report().cloned().unwrap();
    assert_eq!(report.stats.done, 3);

    for id in ["a", "d"] {
        assert_eq!(
            h.directory.record(&format!("people/{id}")).unwrap().custom_fields,
            vec![CustomField::new(
                "Tribu Link",
                format!("https://tribu.example/app?cid={id}")
            )]
        );
    }
    assert_eq!(
        h.directory.record("people/c").unwrap().custom_fields,
        vec![
            CustomField::new("Tribu ROI", "2 | 1 | 1 | 1 | 1 | 12 | A"),
            CustomField::new("Tribu Link", "https://tribu.example/app?cid=c"),
        ]
    );
}

#[test]
fn finished_backfill_is_idle_until_reset() {
    let h = harness();
    let ledger = Ledger::new(h.store.clone());
    ledger.put(&Contact::new("a").with_remote_id("people/a")).unwrap();

    assert_eq!(h.backfill.enqueue_batch(10).unwrap().enqueued, 1);
    let idle = h.backfill.enqueue_batch(10).unwrap();
    assert_eq!(idle.enqueued, 0);
    assert!(idle.done);

    h.backfill.reset().unwrap();
    assert_eq!(h.backfill.enqueue_batch(10).unwrap().enqueued, 1);
    assert_eq!(h.worker.queue().count_pending().unwrap(), 2);
}
