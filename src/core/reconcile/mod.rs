//! # Reconcile Module
//!
//! Pulls candidates from a media index, deduplicates them against the
//! status store and yields the items that still need a decision.
//!
//! ## Decision Per Candidate
//! 1. Volatile-id fast path: a record under the candidate's id whose status
//!    is decided means the item was triaged in an earlier session; skip it.
//! 2. Content hash: unreadable items are skipped.
//! 3. Hash lookup:
//!    - known under another id: re-point the record at the new id
//!    - known and UNSET: yield it
//!    - known and decided: skip it
//!    - unknown: yield it and persist a fresh UNSET record
//!
//! Persistence goes through [`StoreWriter`], so the interactive path never
//! waits on the store.
//!
//! ## Example
//! ```rust,ignore
//! let reconciler = Reconciler::new(index, store, writer);
//! for item in reconciler.stream(30)? {
//!     queue.push(item);
//! }
//! ```

mod ingest;
mod stream;

pub use ingest::Ingestion;
pub use stream::ReconcileStream;

use crate::core::hasher::{ContentHasher, Xxh3ContentHasher};
use crate::core::index::{IndexOrder, MediaIndex};
use crate::core::media::MediaItem;
use crate::core::store::{StatusStore, StoreWriter};
use crate::error::IndexError;
use crate::events::{null_sender, EventSender};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag that stops a reconciliation pass at the next candidate
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Tally of one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileSummary {
    /// Items yielded for review
    pub emitted: usize,
    /// Candidates skipped as already decided or duplicate content
    pub skipped: usize,
    /// Candidates that could not be read, hashed or looked up
    pub failed: usize,
    /// Records re-pointed at a new volatile id
    pub reassigned: usize,
}

/// Reconciliation engine
///
/// Cheap to clone; each pass gets its own [`ReconcileStream`].
#[derive(Clone)]
pub struct Reconciler {
    index: Arc<dyn MediaIndex>,
    store: Arc<dyn StatusStore>,
    writer: StoreWriter,
    hasher: Arc<dyn ContentHasher>,
    events: EventSender,
    order: IndexOrder,
    lookahead: usize,
}

impl Reconciler {
    /// Create an engine over `index`, reading `store` and writing through `writer`
    pub fn new(index: Arc<dyn MediaIndex>, store: Arc<dyn StatusStore>, writer: StoreWriter) -> Self {
        Self {
            index,
            store,
            writer,
            hasher: Arc::new(Xxh3ContentHasher),
            events: null_sender(),
            order: IndexOrder::Random,
            lookahead: rayon::current_num_threads(),
        }
    }

    /// Set the content hasher
    pub fn with_hasher(mut self, hasher: Arc<dyn ContentHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    /// Send reconciliation events to `events`
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = events;
        self
    }

    /// Set the candidate order
    pub fn with_order(mut self, order: IndexOrder) -> Self {
        self.order = order;
        self
    }

    /// Number of candidates hashed in parallel ahead of the consumer
    pub fn with_lookahead(mut self, lookahead: usize) -> Self {
        self.lookahead = lookahead.max(1);
        self
    }

    pub fn writer(&self) -> &StoreWriter {
        &self.writer
    }

    pub fn store(&self) -> &Arc<dyn StatusStore> {
        &self.store
    }

    /// Start a pass that yields at most `max_items` items
    pub fn stream(&self, max_items: usize) -> Result<ReconcileStream, IndexError> {
        self.stream_with_cancel(max_items, CancellationToken::new())
    }

    /// Start a pass that stops early once `cancel` is triggered
    pub fn stream_with_cancel(
        &self,
        max_items: usize,
        cancel: CancellationToken,
    ) -> Result<ReconcileStream, IndexError> {
        let candidates = self.index.candidates(self.order)?;
        Ok(ReconcileStream::new(self.clone(), candidates, max_items, cancel))
    }

    /// Run a full pass, handing each item to `on_item_ready`
    pub fn reconcile<F>(&self, max_items: usize, mut on_item_ready: F) -> Result<ReconcileSummary, IndexError>
    where
        F: FnMut(MediaItem),
    {
        let mut stream = self.stream(max_items)?;
        for item in stream.by_ref() {
            on_item_ready(item);
        }
        Ok(stream.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_is_shared_between_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());

        token.cancel();
        assert!(clone.is_cancelled());
    }
}
