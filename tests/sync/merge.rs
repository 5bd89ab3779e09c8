//! End-to-end shape of what a tick writes to a remote record.

use chrono::NaiveDate;
use tribu_sync::remote::{CalendarDate, CustomField, RecordEvent};
use tribu_sync::{Cadence, ChangePayload, Scores};

use crate::support::{harness, normal};

#[test]
fn normal_change_writes_packed_value_link_and_group() {
    let h = harness();
    h.directory.create("people/c1").unwrap();
    h.directory
        .simulate_user_edit("people/c1", |r| {
            r.custom_fields = vec![
                CustomField::new("tr_conf", "1"),
                CustomField::new("Tribu", "legacy"),
                CustomField::new("Company", "Acme"),
            ];
            r.events = vec![RecordEvent {
                kind: "anniversary".into(),
                formatted_kind: "Anniversary".into(),
                date: None,
                primary: false,
            }];
            r.memberships = vec!["contactGroups/heart".into(), "contactGroups/friends".into()];
        })
        .unwrap();

    let mut change = normal("c 1", "people/c1");
    change.scores = Scores {
        conf: Some(1.5),
        emo: Some(2.0),
        ene: Some(1.0),
        est: None,
        rep: Some(1.0),
    };
    change.cadence = Cadence::Quarterly;
    change.total = change.scores.total();
    change.icon = change.scores.category().map(|c| c.icon().to_string());
    change.next_contact = NaiveDate::from_ymd_opt(2026, 8, 4);

    h.worker
        .queue()
        .enqueue("c 1", "people/c1", None, &ChangePayload::Normal(change))
        .unwrap();
    assert_eq!(h.worker.tick().report().unwrap().stats.done, 1);

    let record = h.directory.record("people/c1").unwrap();
    assert_eq!(
        record.custom_fields,
        vec![
            CustomField::new("Company", "Acme"),
            CustomField::new("Tribu ROI", "1.5 | 2 | 1 |  | 1 | 10 | 3M"),
            CustomField::new("Tribu Link", "https://tribu.example/app?cid=c%201"),
        ]
    );
    assert_eq!(record.events.len(), 2);
    assert_eq!(record.events[0].kind, "anniversary");
    assert_eq!(record.events[1].kind, "Próx. Contacto");
    assert_eq!(
        record.events[1].date,
        Some(CalendarDate {
            year: Some(2026),
            month: Some(8),
            day: Some(4)
        })
    );

    let mut memberships = record.memberships.clone();
    memberships.sort();
    assert_eq!(
        memberships,
        vec![
            "contactGroups/building".to_string(),
            "contactGroups/friends".to_string(),
        ]
    );
}

#[test]
fn reapplying_the_same_change_is_stable() {
    let h = harness();
    h.directory.create("people/c1").unwrap();
    let change = ChangePayload::Normal(normal("c-1", "people/c1"));

    h.worker
        .queue()
        .enqueue("c-1", "people/c1", None, &change)
        .unwrap();
    h.worker.tick();
    let first = h.directory.record("people/c1").unwrap();

    h.worker
        .queue()
        .enqueue("c-1", "people/c1", None, &change)
        .unwrap();
    assert_eq!(h.worker.tick().report().unwrap().stats.done, 1);
    let second = h.directory.record("people/c1").unwrap();

    assert_eq!(second.custom_fields, first.custom_fields);
    assert_eq!(second.events, first.events);
    assert_eq!(second.memberships, vec!["contactGroups/green".to_string()]);
}
