//! Integration tests for the reconciliation engine.
//!
//! These tests verify:
//! - At-most-once emission per content hash
//! - Decided items never re-surface
//! - Volatile id drift is repaired without touching the status
//! - The KEEP round trip across passes

use photo_triage::core::hasher::Xxh3ContentHasher;
use photo_triage::core::index::{InMemoryIndex, IndexOrder, MediaIndex};
use photo_triage::core::media::{ContentHash, ReviewStatus};
use photo_triage::core::reconcile::Reconciler;
use photo_triage::core::store::{InMemoryStatusStore, StatusRecord, StatusStore, StoreWriter};
use std::collections::HashSet;
use std::sync::Arc;

fn engine(index: Arc<InMemoryIndex>, store: Arc<InMemoryStatusStore>) -> Reconciler {
    let writer = StoreWriter::spawn(store.clone(), 3);
    Reconciler::new(index, store, writer)
        .with_order(IndexOrder::Random)
        .with_lookahead(4)
}

fn hash_of(index: &InMemoryIndex, id: u64) -> ContentHash {
    let candidate = index
        .candidates(IndexOrder::Natural)
        .unwrap()
        .find(|c| c.volatile_id == id)
        .unwrap();
    index.content_hash(&candidate, &Xxh3ContentHasher).unwrap()
}

#[test]
fn never_emits_the_same_hash_twice() {
    let index = Arc::new(InMemoryIndex::new());
    for id in 0..40u64 {
        // Every content appears twice under different ids
        index.add_photo(id, &format!("{}.jpg", id), &[(id % 20) as u8; 8]);
    }
    let store = Arc::new(InMemoryStatusStore::new());
    let engine = engine(index, store);

    let mut seen = HashSet::new();
    let summary = engine
        .reconcile(100, |item| assert!(seen.insert(item.content_hash)))
        .unwrap();

    assert_eq!(summary.emitted, 20);
    assert_eq!(summary.skipped, 20);
}

#[test]
fn never_emits_decided_items() {
    let index = Arc::new(InMemoryIndex::new());
    let store = Arc::new(InMemoryStatusStore::new());
    for id in 0..12u64 {
        index.add_photo(id, &format!("{}.jpg", id), &[id as u8; 4]);
    }
    for id in 0..12u64 {
        let status = match id % 3 {
            0 => ReviewStatus::Keep,
            1 => ReviewStatus::Delete,
            _ => ReviewStatus::Unset,
        };
        store
            .upsert(&StatusRecord {
                content_hash: hash_of(&index, id),
                volatile_id: id + 100,
                status,
                size_bytes: 4,
                last_modified: 0,
            })
            .unwrap();
    }

    let engine = engine(index, store.clone());
    let emitted: Vec<_> = engine.stream(50).unwrap().collect();

    assert_eq!(emitted.len(), 4);
    for item in &emitted {
        let record = store.get(&item.content_hash).unwrap().unwrap();
        assert_eq!(record.status, ReviewStatus::Unset);
    }
}

#[test]
fn id_drift_updates_volatile_id_only() {
    let index = Arc::new(InMemoryIndex::new());
    index.add_photo(9, "moved.jpg", b"moved photo");
    let hash = hash_of(&index, 9);

    let store = Arc::new(InMemoryStatusStore::with_records(vec![StatusRecord {
        content_hash: hash.clone(),
        volatile_id: 5,
        status: ReviewStatus::Keep,
        size_bytes: 11,
        last_modified: 1,
    }]));

    let engine = engine(index, store.clone());
    let summary = engine.reconcile(10, |_| panic!("kept item re-surfaced")).unwrap();
    engine.writer().flush();

    let record = store.get(&hash).unwrap().unwrap();
    assert_eq!(record.volatile_id, 9);
    assert_eq!(record.status, ReviewStatus::Keep);
    assert!(record.last_modified > 1);
    assert_eq!(summary.reassigned, 1);
}

#[test]
fn keep_round_trip_is_not_resurfaced() {
    let index = Arc::new(InMemoryIndex::new());
    index.add_photo(1, "a.jpg", b"a");
    index.add_photo(2, "b.jpg", b"b");
    let store = Arc::new(InMemoryStatusStore::new());
    let engine = engine(index.clone(), store.clone());

    let first: Vec<_> = engine.stream(10).unwrap().collect();
    assert_eq!(first.len(), 2);

    let mut kept = first[0].clone();
    kept.status = ReviewStatus::Keep;
    engine.writer().submit(kept.to_record(10));
    engine.writer().flush();

    let second: Vec<_> = engine.stream(10).unwrap().collect();
    assert_eq!(second.len(), 1);
    assert_ne!(second[0].content_hash, kept.content_hash);
}

#[test]
fn unreadable_candidates_never_abort_a_pass() {
    let index = Arc::new(InMemoryIndex::new());
    for id in 0..5u64 {
        index.add_unreadable(id, &format!("broken-{}.jpg", id));
    }
    index.add_photo(99, "ok.jpg", b"ok");
    let store = Arc::new(InMemoryStatusStore::new());

    let summary = engine(index, store).reconcile(10, |_| {}).unwrap();

    assert_eq!(summary.emitted, 1);
    assert_eq!(summary.failed, 5);
}

#[test]
fn unavailable_index_is_an_error() {
    let index = Arc::new(InMemoryIndex::new());
    index.set_unavailable(true);
    let store = Arc::new(InMemoryStatusStore::new());

    assert!(engine(index, store).stream(10).is_err());
}
