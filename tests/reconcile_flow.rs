//! End-to-end reconciliation scenarios across both observation channels.

use base64::Engine as _;
use serde_json::json;
use std::time::Duration;

use counter_watch::reconcile::record::{delta_secs, from_unix_secs};
use counter_watch::reconcile::{Janitor, ProcessingRecord, ReconcileTable};
use counter_watch::workflow::listener::decode_notification;

mod common;

fn notification_payload(counter: u32, block_timestamp: i64, client_timestamp: i64) -> serde_json::Value {
    let data = base64::engine::general_purpose::STANDARD.encode(common::counter_account_bytes(
        counter,
        block_timestamp,
        client_timestamp,
    ));
    json!({
        "context": { "slot": 200 },
        "value": {
            "data": [data, "base64"],
            "executable": false,
            "lamports": 1_000_000
        }
    })
}

#[test]
fn submit_and_notification_reconcile_into_one_record() {
    let table = ReconcileTable::new();

    // Action channel: submitted at client_time 1700000000, provider p1.
    let started = from_unix_secs(1_700_000_000);
    let mut action_side = ProcessingRecord::new(1_700_000_000, "p1");
    action_side.started_at = Some(started);
    action_side.finished_at = Some(started + Duration::from_secs(2));
    action_side.txn_id = Some("sig-scenario".to_string());
    table.upsert_merge(action_side);

    // Subscription channel: the program echoed the client timestamp, ten
    // seconds of validator clock later.
    let payload = notification_payload(5, 1_700_000_010, 1_700_000_000);
    let snapshot = decode_notification(&payload).unwrap();
    let mut listener_side = ProcessingRecord::new(snapshot.client_timestamp, "p1");
    listener_side.blockchain_time = Some(from_unix_secs(snapshot.block_timestamp));
    listener_side.blockchain_counter = Some(snapshot.counter);
    listener_side.ws_time = Some(started + Duration::from_secs(3));
    table.upsert_merge(listener_side);

    assert_eq!(table.len(), 1);
    let record = table.get("1700000000p1").unwrap();
    assert!(record.is_complete());
    assert_eq!(record.txn_id.as_deref(), Some("sig-scenario"));
    assert_eq!(record.blockchain_counter, Some(5));

    let blockchain_latency = delta_secs(
        record.started_at.unwrap(),
        record.blockchain_time.unwrap(),
    );
    assert_eq!(blockchain_latency, 10.0);

    // The janitor reports and removes the complete record; it never comes back.
    let janitor = Janitor::new(
        table.clone(),
        Duration::from_secs(10),
        Duration::from_secs(60),
    );
    janitor.sweep();
    assert!(table.is_empty());
    janitor.sweep();
    assert!(table.is_empty());
}

#[test]
fn same_second_different_providers_stay_separate() {
    let table = ReconcileTable::new();

    let mut a = ProcessingRecord::new(1_700_000_000, "p1");
    a.started_at = Some(from_unix_secs(1_700_000_000));
    table.upsert_merge(a);

    let mut b = ProcessingRecord::new(1_700_000_000, "p2");
    b.blockchain_counter = Some(9);
    table.upsert_merge(b);

    assert_eq!(table.len(), 2);
    // Neither entry got the other's fields.
    assert!(table.get("1700000000p1").unwrap().blockchain_counter.is_none());
    assert!(table.get("1700000000p2").unwrap().started_at.is_none());
}

#[test]
fn unmatched_record_is_purged_after_staleness_threshold() {
    let table = ReconcileTable::new();
    let mut orphan = ProcessingRecord::new(1_700_000_000, "p1");
    orphan.started_at = Some(from_unix_secs(1_700_000_000));
    table.upsert_merge(orphan);

    let janitor = Janitor::new(
        table.clone(),
        Duration::from_secs(10),
        Duration::from_millis(50),
    );

    // Younger than the threshold: survives the tick.
    janitor.sweep();
    assert_eq!(table.len(), 1);

    std::thread::sleep(Duration::from_millis(80));
    janitor.sweep();
    assert!(table.is_empty());
}

#[test]
fn listener_decode_rejects_executable_account() {
    let mut payload = notification_payload(1, 0, 0);
    payload["value"]["executable"] = json!(true);
    assert!(decode_notification(&payload).is_err());
}
