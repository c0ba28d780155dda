//! Review state machine.

use super::deleter::{Deleter, TrashDeleter};
use super::preferences::{InMemoryPreferenceStore, PreferenceStore};
use super::queue::ReviewQueue;
use crate::core::media::{now_millis, ContentHash, ItemRef, MediaItem, ReviewStatus};
use crate::core::reconcile::{Ingestion, Reconciler};
use crate::core::stats::{StatsAggregator, TimeWindow};
use crate::core::store::StoreWriter;
use crate::error::IndexError;
use crate::events::{null_sender, Event, EventSender, Notice, ReviewEvent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Where the workflow is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    /// Swiping through UNSET items
    #[default]
    Browsing,
    /// The delete-confirmation dialog is open
    PendingReview,
}

/// Serialisable view of a session for UI layers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub state: ReviewState,
    pub cursor: usize,
    pub len: usize,
    pub unset_count: usize,
    pub delete_count: usize,
    pub info_expanded: bool,
    pub review_dialog_enabled: bool,
    pub stats_window: TimeWindow,
    pub space_saved: u64,
    pub current: Option<MediaItem>,
}

/// Builder for [`ReviewSession`]
pub struct ReviewSessionBuilder {
    reconciler: Reconciler,
    deleter: Option<Arc<dyn Deleter>>,
    preferences: Option<Arc<dyn PreferenceStore>>,
    events: EventSender,
    batch_size: usize,
    eager_count: usize,
    stats_window: TimeWindow,
}

impl ReviewSessionBuilder {
    /// Physical deletion backend (defaults to the platform trash)
    pub fn deleter(mut self, deleter: Arc<dyn Deleter>) -> Self {
        self.deleter = Some(deleter);
        self
    }

    /// Preference backend (defaults to in-memory)
    pub fn preferences(mut self, preferences: Arc<dyn PreferenceStore>) -> Self {
        self.preferences = Some(preferences);
        self
    }

    pub fn events(mut self, events: EventSender) -> Self {
        self.events = events;
        self
    }

    /// Items requested per reconciliation pass
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Items taken synchronously before the rest of a pass moves to the background
    pub fn eager_count(mut self, eager_count: usize) -> Self {
        self.eager_count = eager_count;
        self
    }

    pub fn stats_window(mut self, window: TimeWindow) -> Self {
        self.stats_window = window;
        self
    }

    pub fn build(self) -> ReviewSession {
        let preferences = self
            .preferences
            .unwrap_or_else(|| Arc::new(InMemoryPreferenceStore::default()));
        let stats = StatsAggregator::new(self.reconciler.store().clone());
        let writer = self.reconciler.writer().clone();

        let mut session = ReviewSession {
            writer,
            stats,
            deleter: self.deleter.unwrap_or_else(|| Arc::new(TrashDeleter)),
            pending_review_enabled: preferences.review_dialog_enabled(),
            preferences,
            reconciler: self.reconciler,
            events: self.events,
            queue: ReviewQueue::new(),
            state: ReviewState::Browsing,
            info_expanded: false,
            stats_window: self.stats_window,
            space_saved: 0,
            batch_size: self.batch_size,
            eager_count: self.eager_count.min(self.batch_size),
            ingestions: Vec::new(),
            deletions: Vec::new(),
        };
        session.refresh_stats();
        session
    }
}

/// Owns the review queue and drives the keep/delete/undo/confirm workflow.
///
/// All queue mutation happens through `&mut self`, so the queue has a
/// single writer; background ingestion hands items over through
/// [`poll_incoming`](Self::poll_incoming). Status writes go to the
/// [`StoreWriter`] and never block the caller.
///
/// A DELETE mark is kept in memory only. The DELETE record is written
/// when the deletion is confirmed, so an unconfirmed delete never becomes
/// durable.
pub struct ReviewSession {
    reconciler: Reconciler,
    writer: StoreWriter,
    stats: StatsAggregator,
    deleter: Arc<dyn Deleter>,
    preferences: Arc<dyn PreferenceStore>,
    events: EventSender,
    queue: ReviewQueue,
    state: ReviewState,
    pending_review_enabled: bool,
    info_expanded: bool,
    stats_window: TimeWindow,
    space_saved: u64,
    batch_size: usize,
    eager_count: usize,
    ingestions: Vec<Ingestion>,
    deletions: Vec<JoinHandle<()>>,
}

impl ReviewSession {
    pub fn builder(reconciler: Reconciler) -> ReviewSessionBuilder {
        ReviewSessionBuilder {
            reconciler,
            deleter: None,
            preferences: None,
            events: null_sender(),
            batch_size: 30,
            eager_count: 2,
            stats_window: TimeWindow::default(),
        }
    }

    pub fn queue(&self) -> &ReviewQueue {
        &self.queue
    }

    pub fn state(&self) -> ReviewState {
        self.state
    }

    pub fn current(&self) -> Option<&MediaItem> {
        self.queue.current()
    }

    pub fn cursor(&self) -> usize {
        self.queue.cursor()
    }

    pub fn unset_count(&self) -> usize {
        self.queue.unset_count()
    }

    pub fn stats_window(&self) -> TimeWindow {
        self.stats_window
    }

    pub fn space_saved(&self) -> u64 {
        self.space_saved
    }

    pub fn info_expanded(&self) -> bool {
        self.info_expanded
    }

    pub fn pending_review_enabled(&self) -> bool {
        self.pending_review_enabled
    }

    /// Items the confirmation dialog lists
    pub fn photos_to_delete(&self) -> Vec<&MediaItem> {
        self.queue.marked_for_deletion().collect()
    }

    /// Whether any background ingestion is still producing items
    pub fn is_ingesting(&self) -> bool {
        self.ingestions.iter().any(|i| !i.is_finished())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            cursor: self.queue.cursor(),
            len: self.queue.len(),
            unset_count: self.queue.unset_count(),
            delete_count: self.queue.delete_count(),
            info_expanded: self.info_expanded,
            review_dialog_enabled: self.pending_review_enabled,
            stats_window: self.stats_window,
            space_saved: self.space_saved,
            current: self.queue.current().cloned(),
        }
    }

    /// Start a reconciliation pass: the eager batch lands in the queue
    /// before this returns, the rest arrives through `poll_incoming`.
    ///
    /// Returns the number of items added now.
    pub fn fetch_photos(&mut self) -> Result<usize, IndexError> {
        let stream = self.reconciler.stream(self.batch_size)?;
        let (eager, ingestion) = Ingestion::start(stream, self.eager_count);
        self.ingestions.push(ingestion);

        let added = self.push_items(eager);
        info!("Fetched {} photos for review", added);
        Ok(added)
    }

    /// Start a new pass once the current batch is used up (nothing UNSET,
    /// nothing marked for deletion). Returns 0 without fetching otherwise.
    pub fn fetch_more(&mut self) -> Result<usize, IndexError> {
        if self.queue.unset_count() > 0 || self.queue.delete_count() > 0 {
            return Ok(0);
        }
        self.fetch_photos()
    }

    /// Move items produced by background ingestion into the queue. When
    /// the last running pass has finished, the review trigger is re-checked.
    pub fn poll_incoming(&mut self) -> usize {
        let was_ingesting = !self.ingestions.is_empty();
        let added = self.take_incoming();
        if was_ingesting && self.ingestions.is_empty() {
            self.settle();
        }
        added
    }

    fn take_incoming(&mut self) -> usize {
        let mut incoming = Vec::new();
        self.ingestions.retain(|ingestion| {
            let finished = ingestion.is_finished();
            incoming.extend(ingestion.drain());
            !finished
        });
        self.push_items(incoming)
    }

    /// Block until every background pass has finished, then take its items
    pub fn wait_for_ingestion(&mut self) -> usize {
        let mut incoming = Vec::new();
        for ingestion in self.ingestions.drain(..) {
            let (items, _) = ingestion.wait();
            incoming.extend(items);
        }
        let added = self.push_items(incoming);
        self.settle();
        added
    }

    fn push_items(&mut self, items: Vec<MediaItem>) -> usize {
        let mut added = 0;
        for item in items {
            if self.queue.push(item) {
                added += 1;
            }
        }

        if added > 0 && self.queue.current().map_or(true, |i| i.status.is_decided()) {
            self.queue.seek_first_unset();
        }
        added
    }

    /// Mark the item under the cursor
    pub fn mark_photo(&mut self, status: ReviewStatus) -> bool {
        self.mark_photo_at(status, self.queue.cursor())
    }

    /// Set an item's status.
    ///
    /// KEEP and UNSET are persisted straight away; DELETE only once the
    /// deletion is confirmed. Marking UNSET moves the cursor to the first
    /// UNSET item.
    pub fn mark_photo_at(&mut self, status: ReviewStatus, index: usize) -> bool {
        if self.queue.set_status(index, status).is_none() {
            warn!("Cannot mark item {}: queue has {} items", index, self.queue.len());
            return false;
        }

        if status != ReviewStatus::Delete {
            if let Some(item) = self.queue.get(index) {
                self.writer.submit(item.to_record(now_millis()));
            }
        }
        if status == ReviewStatus::Unset {
            self.queue.seek_first_unset();
        }

        debug!("Item {} marked {}", index, status);
        true
    }

    /// Move past the item just decided
    pub fn next_photo(&mut self) {
        self.queue.advance();
        self.settle();
    }

    /// Put the cursor on the first UNSET item
    pub fn find_unset_photo(&mut self) {
        self.queue.seek_first_unset();
        self.settle();
    }

    /// Decide the current item and move on
    pub fn swipe(&mut self, status: ReviewStatus) -> bool {
        if self.queue.current().is_none() {
            return false;
        }
        self.mark_photo(status);
        self.next_photo();

        if self.state == ReviewState::Browsing
            && self.queue.current().is_some_and(|i| i.status.is_decided())
        {
            self.find_unset_photo();
        }
        true
    }

    /// Revert the previous decision. Single level: the cursor steps back
    /// one item and that item becomes UNSET again.
    pub fn undo(&mut self) -> bool {
        let cursor = self.queue.cursor();
        if cursor == 0 {
            self.events.notice(Notice::NothingToUndo);
            return false;
        }

        self.queue.set_cursor(cursor - 1);
        self.queue.set_status(cursor - 1, ReviewStatus::Unset);
        if let Some(item) = self.queue.get(cursor - 1) {
            self.writer.submit(item.to_record(now_millis()));
        }
        debug!("Undid decision on item {}", cursor - 1);
        true
    }

    pub fn toggle_info(&mut self) -> bool {
        self.info_expanded = !self.info_expanded;
        self.info_expanded
    }

    /// Once the whole batch has arrived, nothing is UNSET and something is
    /// marked DELETE, open the review dialog, or delete straight away if the
    /// dialog is disabled.
    pub fn settle(&mut self) {
        if self.state == ReviewState::PendingReview {
            return;
        }
        self.take_incoming();
        if !self.ingestions.is_empty() {
            debug!("Review held until the current batch has arrived");
            return;
        }
        if self.queue.unset_count() > 0 || self.queue.delete_count() == 0 {
            return;
        }

        if self.pending_review_enabled {
            self.set_state(ReviewState::PendingReview);
        } else {
            self.delete_photos();
        }
    }

    /// Restore one item from the dialog's list to the queue
    pub fn on_unset_photo(&mut self, content_hash: &ContentHash) -> bool {
        let Some(index) = self.queue.index_of(content_hash) else {
            return false;
        };

        self.mark_photo_at(ReviewStatus::Unset, index);
        if self.queue.delete_count() == 0 {
            self.set_state(ReviewState::Browsing);
        }
        true
    }

    /// Close the dialog without deleting and fetch more photos
    pub fn on_cancellation(&mut self) -> Result<usize, IndexError> {
        self.set_state(ReviewState::Browsing);
        self.fetch_photos()
    }

    /// Delete everything marked, optionally turning the dialog off for good
    pub fn on_confirmation(&mut self, dont_ask_again: bool) -> usize {
        if dont_ask_again {
            self.pending_review_enabled = false;
            if let Err(e) = self.preferences.set_review_dialog_enabled(false) {
                warn!("Failed to save review dialog preference: {}", e);
            }
        }
        self.delete_photos()
    }

    /// Delete every DELETE-marked item.
    ///
    /// Physical deletion runs on a background thread. The DELETE records
    /// are written whatever its outcome. The items leave the queue, the
    /// cursor shifts left by the number removed and the stats refresh.
    pub fn delete_photos(&mut self) -> usize {
        let targets: Vec<ItemRef> = self
            .queue
            .marked_for_deletion()
            .map(|i| i.item_ref.clone())
            .collect();

        if targets.is_empty() {
            self.events.notice(Notice::NothingToDelete);
            self.set_state(ReviewState::Browsing);
            return 0;
        }

        self.request_deletion(targets);

        let now = now_millis();
        let removed = self.queue.remove_marked_for_deletion();
        for item in &removed {
            self.writer.submit(item.to_record(now));
        }

        let count = removed.len();
        let bytes: u64 = removed.iter().map(|i| i.size_bytes).sum();
        info!("Deleted {} photos ({} bytes)", count, bytes);

        self.writer.flush();
        self.refresh_stats();
        self.set_state(ReviewState::Browsing);
        self.events
            .send(Event::Review(ReviewEvent::Deleted { count, bytes }));
        count
    }

    fn request_deletion(&mut self, targets: Vec<ItemRef>) {
        let deleter = self.deleter.clone();
        let spawned = thread::Builder::new()
            .name("photo-deleter".to_string())
            .spawn(move || report_deletion(deleter.as_ref(), &targets));

        match spawned {
            Ok(handle) => self.deletions.push(handle),
            Err(e) => warn!("Failed to start deletion thread: {}", e),
        }
    }

    fn set_state(&mut self, state: ReviewState) {
        if self.state != state {
            debug!("Review state {:?} -> {:?}", self.state, state);
            self.state = state;
            self.events
                .send(Event::Review(ReviewEvent::StateChanged { state }));
        }
    }

    /// Advance to the next stats window and recompute
    pub fn cycle_stats_time_frame(&mut self) -> TimeWindow {
        self.stats_window = self.stats_window.next();
        self.refresh_stats();
        self.stats_window
    }

    /// Recompute space saved for the current window. A failed read keeps
    /// the previous value.
    pub fn refresh_stats(&mut self) -> u64 {
        match self.stats.space_saved(self.stats_window) {
            Ok(bytes) => self.space_saved = bytes,
            Err(e) => warn!("Failed to compute space saved: {}", e),
        }
        self.events.send(Event::Review(ReviewEvent::StatsUpdated {
            window: self.stats_window,
            bytes: self.space_saved,
        }));
        self.space_saved
    }

    /// Wait for pending deletions and status writes
    pub fn flush(&mut self) {
        for handle in self.deletions.drain(..) {
            if handle.join().is_err() {
                warn!("Deletion thread panicked");
            }
        }
        self.writer.flush();
    }
}

impl Drop for ReviewSession {
    fn drop(&mut self) {
        for ingestion in &self.ingestions {
            ingestion.cancel();
        }
        self.flush();
    }
}

fn report_deletion(deleter: &dyn Deleter, targets: &[ItemRef]) {
    let outcome = deleter.request_deletion(targets);
    for (item, error) in &outcome.failed {
        warn!("Could not delete {}: {}", item, error);
    }
    debug!(
        "Deletion finished: {} deleted, {} failed",
        outcome.deleted.len(),
        outcome.failed.len()
    );
}
