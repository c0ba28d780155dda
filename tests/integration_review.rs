//! Integration tests for the review state machine.
//!
//! These tests drive a full session over an in-memory library:
//! - UNSET count stays exact under arbitrary mark/next sequences
//! - Undo, delete and stats behave as the workflow requires
//! - Concurrent ingestion passes never duplicate queue entries

use photo_triage::core::index::{InMemoryIndex, IndexOrder};
use photo_triage::core::media::ReviewStatus;
use photo_triage::core::reconcile::Reconciler;
use photo_triage::core::review::{InMemoryPreferenceStore, RecordingDeleter, ReviewSession, ReviewState};
use photo_triage::core::stats::{StatsAggregator, TimeWindow};
use photo_triage::core::store::{InMemoryStatusStore, StoreWriter};
use photo_triage::events::{EventChannel, Notice};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::Arc;

struct Library {
    index: Arc<InMemoryIndex>,
    store: Arc<InMemoryStatusStore>,
}

fn library(photos: u64) -> Library {
    let index = Arc::new(InMemoryIndex::new());
    for id in 0..photos {
        index.add_photo(id, &format!("IMG_{:04}.jpg", id), &vec![id as u8; 100 + id as usize]);
    }
    Library {
        index,
        store: Arc::new(InMemoryStatusStore::new()),
    }
}

fn session(library: &Library, batch: usize, review_dialog: bool) -> ReviewSession {
    let writer = StoreWriter::spawn(library.store.clone(), 4);
    let reconciler = Reconciler::new(library.index.clone(), library.store.clone(), writer)
        .with_order(IndexOrder::Natural);

    ReviewSession::builder(reconciler)
        .deleter(Arc::new(RecordingDeleter::new()))
        .preferences(Arc::new(InMemoryPreferenceStore::new(review_dialog)))
        .batch_size(batch)
        .eager_count(2)
        .build()
}

#[test]
fn unset_count_matches_queue_for_random_sequences() {
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..25 {
        let library = library(20);
        let mut session = session(&library, 20, true);
        session.fetch_photos().unwrap();
        session.wait_for_ingestion();

        for _ in 0..60 {
            let len = session.queue().len();
            if len == 0 {
                break;
            }
            match rng.gen_range(0..4) {
                0 => {
                    let status = [ReviewStatus::Unset, ReviewStatus::Keep, ReviewStatus::Delete][rng.gen_range(0..3)];
                    session.mark_photo_at(status, rng.gen_range(0..len));
                }
                1 => {
                    session.mark_photo(ReviewStatus::Keep);
                }
                2 => session.next_photo(),
                _ => {
                    session.undo();
                }
            }
            if session.state() == ReviewState::PendingReview {
                session.on_cancellation().unwrap();
            }

            let queue = session.queue();
            assert_eq!(queue.unset_count(), queue.count_unset());
            assert!(queue.cursor() <= queue.len());
        }
    }
}

#[test]
fn delete_removes_items_shifts_cursor_and_grows_stats() {
    let library = library(8);
    let mut session = session(&library, 8, true);
    session.fetch_photos().unwrap();
    session.wait_for_ingestion();

    for position in 0..6 {
        let status = if position == 2 || position == 5 {
            ReviewStatus::Delete
        } else {
            ReviewStatus::Keep
        };
        session.swipe(status);
    }
    assert_eq!(session.queue().len(), 8);
    assert_eq!(session.cursor(), 6);

    let removed_bytes: u64 = session.photos_to_delete().iter().map(|i| i.size_bytes).sum();
    let stats = StatsAggregator::new(library.store.clone());
    let before = stats.space_saved(TimeWindow::Day).unwrap();

    assert_eq!(session.delete_photos(), 2);
    session.flush();

    assert_eq!(session.queue().len(), 6);
    assert_eq!(session.cursor(), 4);
    assert_eq!(stats.space_saved(TimeWindow::Day).unwrap(), before + removed_bytes);
}

#[test]
fn undo_at_start_only_notifies() {
    let library = library(3);
    let (tx, rx) = EventChannel::new();
    let writer = StoreWriter::spawn(library.store.clone(), 1);
    let reconciler = Reconciler::new(library.index.clone(), library.store.clone(), writer);
    let mut session = ReviewSession::builder(reconciler)
        .deleter(Arc::new(RecordingDeleter::new()))
        .events(tx)
        .build();
    session.fetch_photos().unwrap();
    session.wait_for_ingestion();
    let before = session.snapshot();

    assert!(!session.undo());

    let after = session.snapshot();
    assert_eq!(before.cursor, after.cursor);
    assert_eq!(before.unset_count, after.unset_count);
    assert_eq!(rx.notices(), vec![Notice::NothingToUndo]);
}

#[test]
fn stats_window_cycles_back_to_day() {
    let library = library(1);
    let writer = StoreWriter::spawn(library.store.clone(), 1);
    let reconciler = Reconciler::new(library.index.clone(), library.store.clone(), writer);
    let mut session = ReviewSession::builder(reconciler)
        .stats_window(TimeWindow::Day)
        .build();

    let visited: Vec<_> = (0..4).map(|_| session.cycle_stats_time_frame()).collect();
    assert_eq!(
        visited,
        vec![TimeWindow::Week, TimeWindow::Month, TimeWindow::Year, TimeWindow::Day]
    );
}

#[test]
fn cancelled_review_then_new_pass_never_duplicates() {
    let library = library(6);
    let mut session = session(&library, 3, true);
    session.fetch_photos().unwrap();
    session.wait_for_ingestion();

    while session.state() == ReviewState::Browsing && session.current().is_some() {
        session.swipe(ReviewStatus::Delete);
    }
    assert_eq!(session.state(), ReviewState::PendingReview);

    // Marked items are still UNSET in the store, so the new pass sees them again
    session.on_cancellation().unwrap();
    session.wait_for_ingestion();

    let hashes: HashSet<_> = session.queue().items().iter().map(|i| &i.content_hash).collect();
    assert_eq!(hashes.len(), session.queue().len());
    assert_eq!(session.photos_to_delete().len(), 3);
}

#[test]
fn confirmed_deletions_are_not_offered_again() {
    let library = library(4);
    {
        let mut session = session(&library, 4, false);
        session.fetch_photos().unwrap();
        session.wait_for_ingestion();
        session.swipe(ReviewStatus::Delete);
        session.swipe(ReviewStatus::Keep);
        session.swipe(ReviewStatus::Delete);
        session.swipe(ReviewStatus::Keep);
        session.flush();
        assert_eq!(session.queue().len(), 2);
    }

    let mut next = session(&library, 4, false);
    assert_eq!(next.fetch_photos().unwrap(), 0);
    assert_eq!(next.wait_for_ingestion(), 0);
}
