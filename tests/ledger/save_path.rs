use std::sync::Arc;
use std::thread;

use chrono::NaiveDate;
use tribu_sync::remote::CustomField;
use tribu_sync::{
    Cadence, Clock, NextContactStatus, OutboxStatus, SaveError, SaveRequest, Scores,
};

use crate::support::harness;

fn request(local_id: &str, remote_id: Option<&str>) -> SaveRequest {
    SaveRequest {
        local_id: local_id.into(),
        remote_id: remote_id.map(str::to_string),
        display_name: "Grace".into(),
        scores: Scores {
            conf: Some(0.0),
            emo: Some(1.0),
            ene: Some(2.0),
            est: Some(0.0),
            rep: Some(0.0),
        },
        cadence: Cadence::Monthly,
        ..Default::default()
    }
}

#[test]
fn saved_row_reaches_the_remote_on_tick() {
    let h = harness();
    h.directory.create("people/g1").unwrap();

    let outcome = h.saver.save(request("g-1", Some("people/g1"))).unwrap();
    // month-end clamps
    assert_eq!(outcome.contact.next_contact, NaiveDate::from_ymd_opt(2026, 4, 30));
    assert_eq!(outcome.contact.icon.as_deref(), Some("🟡"));
    assert_eq!(h.directory.write_count(), 0);

    assert_eq!(h.worker.tick().report().unwrap().stats.done, 1);

    let record = h.directory.record("people/g1").unwrap();
    assert_eq!(
        record.custom_fields,
        vec![
            CustomField::new("Tribu ROI", "0 | 1 | 2 | 0 | 0 | 3 | 1M"),
            CustomField::new("Tribu Link", "https://tribu.example/app?cid=g-1"),
        ]
    );
    assert_eq!(record.memberships, vec!["contactGroups/yellow".to_string()]);
    assert_eq!(record.events.len(), 1);

    let row = h.saver.ledger().get("g-1").unwrap().unwrap();
    assert_eq!(row.remote_id.as_deref(), Some("people/g1"));
    assert_eq!(row.total, Some(3.0));
}

#[test]
fn direct_remote_edit_after_save_wins() {
    let h = harness();
    h.directory.create("people/g1").unwrap();

    let outcome = h.saver.save(request("g-1", Some("people/g1"))).unwrap();
    h.directory
        .simulate_user_edit("people/g1", |r| {
            r.custom_fields.push(CustomField::new("Nickname", "Amazing"))
        })
        .unwrap();

    assert_eq!(h.worker.tick().report().unwrap().stats.conflict, 1);

    let entry = h
        .worker
        .queue()
        .get(outcome.outbox_id.as_deref().unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(entry.status, OutboxStatus::Conflict);
    assert_eq!(
        h.directory.record("people/g1").unwrap().custom_fields,
        vec![CustomField::new("Nickname", "Amazing")]
    );

    // the ledger keeps the local edit
    assert_eq!(h.saver.ledger().get("g-1").unwrap().unwrap().total, Some(3.0));
}

#[test]
fn explicit_next_contact_is_kept_and_graded() {
    let h = harness();
    let today = h.clock.today();

    let mut far = request("g-1", None);
    far.next_contact = NaiveDate::from_ymd_opt(2026, 12, 1);
    let outcome = h.saver.save(far).unwrap();
    assert_eq!(outcome.contact.next_contact, NaiveDate::from_ymd_opt(2026, 12, 1));
    assert_eq!(outcome.next_contact_status, NextContactStatus::TooFar);
    assert_eq!(outcome.proposed_next_contact, NaiveDate::from_ymd_opt(2026, 4, 30));

    let mut past = request("g-2", None);
    past.next_contact = today.pred_opt();
    assert_eq!(
        h.saver.save(past).unwrap().next_contact_status,
        NextContactStatus::Past
    );

    let mut unset = request("g-3", None);
    unset.cadence = Cadence::Unset;
    assert_eq!(
        h.saver.save(unset).unwrap().next_contact_status,
        NextContactStatus::Missing
    );
}

#[test]
fn concurrent_saves_all_land() {
    let h = harness();
    for i in 0..8 {
        h.directory.create(&format!("people/p{i}")).unwrap();
    }

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let saver = Arc::clone(&h.saver);
            thread::spawn(move || {
                let remote = format!("people/p{i}");
                saver.save(request(&format!("p-{i}"), Some(&remote)))
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    assert_eq!(h.saver.ledger().contacts().unwrap().len(), 8);
    assert_eq!(h.worker.queue().count_pending().unwrap(), 8);

    let report = h.worker.tick().report().cloned().unwrap();
    assert_eq!(report.stats.done, 8);
}

#[test]
fn rejected_saves_leave_no_trace() {
    let h = harness();
    h.directory.create("people/b1").unwrap();

    let mut birthday = request("b-1", Some("people/b1"));
    birthday.cadence = Cadence::Birthday;
    assert!(matches!(
        h.saver.save(birthday),
        Err(SaveError::BirthdayMissing(_))
    ));

    assert_eq!(h.saver.ledger().get("b-1").unwrap(), None);
    assert_eq!(h.worker.queue().count_pending().unwrap(), 0);
}
