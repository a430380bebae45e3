//! Ledger behavior over a real file-backed store.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::thread;

use serde_json::{Value, json};
use tempfile::TempDir;

use desu_core::{ListQuery, RecordId};
use desu_store::{Clock, FileStore, ManualClock, MessageLedger};

/// Clock that moves forward by one millisecond every time it is read.
#[derive(Debug, Default)]
struct TickingClock(AtomicI64);

impl Clock for TickingClock {
    fn now_millis(&self) -> i64 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

fn open_ledger(dir: &TempDir, clock: &ManualClock) -> MessageLedger {
    let store = FileStore::open(dir.path().join("server.json"), MessageLedger::collections())
        .expect("Failed to open store");
    MessageLedger::with_clock(store, Arc::new(clock.clone()))
}

fn bodies(ledger: &MessageLedger, query: ListQuery) -> Vec<Value> {
    ledger
        .list(&query)
        .unwrap()
        .into_iter()
        .map(|m| m.body)
        .collect()
}

#[test]
fn test_ids_strictly_increase() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(1_000);
    let ledger = open_ledger(&dir, &clock);

    let mut last: Option<RecordId> = None;
    for i in 0..50 {
        if i % 7 == 0 {
            clock.advance(1);
        }
        let receipt = ledger.submit(json!(i)).unwrap();
        assert!(receipt.submitted);
        if let Some(prev) = last {
            assert!(receipt.id > prev, "{} should follow {}", receipt.id, prev);
        }
        last = Some(receipt.id);
    }
}

#[test]
fn test_two_messages_round_trip_in_order() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(1_000);
    let ledger = open_ledger(&dir, &clock);

    let a = ledger.submit(json!("A")).unwrap();
    clock.advance(3);
    let b = ledger.submit(json!("B")).unwrap();

    let listed = ledger.list(&ListQuery::default()).unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].body, json!("A"));
    assert_eq!(listed[1].body, json!("B"));
    assert!(listed[1].id > listed[0].id);
    assert!(listed[1].received >= listed[0].received);
    assert_eq!(listed[0].id, a.id);
    assert_eq!(listed[1].received, b.received);
}

#[test]
fn test_offset_and_limit_select_middle_message() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(1_000);
    let ledger = open_ledger(&dir, &clock);

    for body in ["first", "second", "third"] {
        ledger.submit(json!(body)).unwrap();
        clock.advance(1);
    }

    let page = bodies(&ledger, ListQuery::default().with_offset(1).with_limit(1));
    assert_eq!(page, vec![json!("second")]);
}

#[test]
fn test_pagination_matches_sorted_slice() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(1_000);
    let ledger = open_ledger(&dir, &clock);

    let n = 12usize;
    for i in 0..n {
        ledger.submit(json!(i)).unwrap();
        clock.advance(2);
    }
    let all = bodies(&ledger, ListQuery::default());

    for offset in [0, 1, 5, 11, 12, 20] {
        for limit in [0, 1, 3, 100] {
            let page = bodies(&ledger, ListQuery::default().with_offset(offset).with_limit(limit));
            let expected_len = limit.min(n.saturating_sub(offset));
            assert_eq!(page.len(), expected_len, "offset {offset} limit {limit}");
            assert_eq!(page, all[offset.min(n)..offset.min(n) + expected_len].to_vec());
        }
    }
}

#[test]
fn test_min_time_selects_exact_subset() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(1_000);
    let ledger = open_ledger(&dir, &clock);

    ledger.submit(json!("m1")).unwrap();
    clock.advance(10);
    let r = ledger.submit(json!("m2")).unwrap();
    clock.advance(10);
    ledger.submit(json!("m3")).unwrap();

    let listed = ledger.list(&ListQuery::since(r.received)).unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].body, json!("m2"));
    assert!(listed.iter().all(|m| m.received >= r.received));
}

#[test]
fn test_same_millisecond_keeps_insertion_order() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(42);
    let ledger = open_ledger(&dir, &clock);

    for i in 0..5 {
        ledger.submit(json!(i)).unwrap();
    }

    assert_eq!(
        bodies(&ledger, ListQuery::default()),
        vec![json!(0), json!(1), json!(2), json!(3), json!(4)]
    );
}

#[test]
fn test_prune_removes_only_older_messages() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(1_000);
    let ledger = open_ledger(&dir, &clock);

    let r1 = ledger.submit(json!("m1")).unwrap();
    clock.advance(5);
    ledger.submit(json!("m2")).unwrap();
    clock.advance(5);
    ledger.submit(json!("m3")).unwrap();

    assert_eq!(ledger.prune(r1.received + 1).unwrap(), 1);
    assert_eq!(bodies(&ledger, ListQuery::default()), vec![json!("m2"), json!("m3")]);

    // Idempotent.
    assert_eq!(ledger.prune(r1.received + 1).unwrap(), 0);
    assert_eq!(ledger.len().unwrap(), 2);

    let remaining = ledger.list(&ListQuery::default()).unwrap();
    assert!(remaining.iter().all(|m| m.received >= r1.received + 1));
}

#[test]
fn test_prune_boundary_is_exclusive() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(1_000);
    let ledger = open_ledger(&dir, &clock);

    ledger.submit(json!("m1")).unwrap();
    clock.advance(1);
    let r2 = ledger.submit(json!("m2")).unwrap();

    ledger.prune(r2.received).unwrap();
    assert_eq!(bodies(&ledger, ListQuery::default()), vec![json!("m2")]);
}

#[test]
fn test_messages_and_ids_survive_restart() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(1_000);

    let before = {
        let ledger = open_ledger(&dir, &clock);
        ledger.submit(json!("kept")).unwrap();
        ledger.submit(json!("also kept")).unwrap();
        ledger.store().flush().unwrap();
        ledger.list(&ListQuery::default()).unwrap()
    };

    let ledger = open_ledger(&dir, &clock);
    assert_eq!(ledger.list(&ListQuery::default()).unwrap(), before);

    let next = ledger.submit(json!("new")).unwrap();
    assert!(next.id > before[1].id);
}

#[test]
fn test_reset_empties_the_ledger() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(1_000);
    let ledger = open_ledger(&dir, &clock);

    ledger.submit(json!("gone")).unwrap();
    ledger.reset().unwrap();
    assert!(ledger.list(&ListQuery::default()).unwrap().is_empty());
}

#[test]
fn test_concurrent_submits_keep_ids_in_received_order() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::open(dir.path().join("server.json"), MessageLedger::collections())
        .expect("Failed to open store");
    let ledger = MessageLedger::with_clock(store, Arc::new(TickingClock::default()));

    let threads = 8;
    let per_thread = 500;
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let ledger = ledger.clone();
            thread::spawn(move || {
                for i in 0..per_thread {
                    ledger.submit(json!({ "thread": t, "seq": i })).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let listed = ledger
        .list(&ListQuery::default().with_limit(threads * per_thread))
        .unwrap();
    assert_eq!(listed.len(), threads * per_thread);
    for pair in listed.windows(2) {
        assert!(
            pair[1].id > pair[0].id,
            "{} (received {}) listed after {} (received {})",
            pair[1].id,
            pair[1].received,
            pair[0].id,
            pair[0].received
        );
        assert!(pair[1].received >= pair[0].received);
    }
}
