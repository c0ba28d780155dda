//! Lazy, cancellable reconciliation pass.

use super::{CancellationToken, ReconcileSummary, Reconciler};
use crate::core::index::{Candidate, CandidateIter};
use crate::core::media::{now_millis, ContentHash, MediaItem, ReviewStatus};
use crate::error::HashError;
use crate::events::{Event, ReconcileEvent, SkipReason};
use rayon::prelude::*;
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info, warn};

/// Candidate after the parallel part of the decision
enum Prepared {
    /// Already decided under this volatile id
    Decided(Candidate),
    /// Needs the hash lookup
    Hashed(Candidate, Result<ContentHash, HashError>),
}

/// A single reconciliation pass, yielding items that need review.
///
/// Candidates are hashed `lookahead` at a time on the rayon pool; the
/// decisions themselves are taken one by one in index order. The pass
/// stops after `max_items` items, when the index is exhausted, or when its
/// [`CancellationToken`] is triggered.
pub struct ReconcileStream {
    engine: Reconciler,
    candidates: CandidateIter,
    buffer: VecDeque<Prepared>,
    seen: HashSet<ContentHash>,
    max_items: usize,
    summary: ReconcileSummary,
    cancel: CancellationToken,
    exhausted: bool,
    completed: bool,
}

impl ReconcileStream {
    pub(super) fn new(
        engine: Reconciler,
        candidates: CandidateIter,
        max_items: usize,
        cancel: CancellationToken,
    ) -> Self {
        engine
            .events
            .send(Event::Reconcile(ReconcileEvent::Started { max_items }));
        debug!("Reconciliation pass started (max {} items)", max_items);

        Self {
            engine,
            candidates,
            buffer: VecDeque::new(),
            seen: HashSet::new(),
            max_items,
            summary: ReconcileSummary::default(),
            cancel,
            exhausted: false,
            completed: false,
        }
    }

    /// Tally so far
    pub fn summary(&self) -> ReconcileSummary {
        self.summary
    }

    /// Whether the pass has ended and will yield nothing more
    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// Token that stops this pass
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Pull the next chunk of candidates and run the parallel checks
    fn fill(&mut self) -> bool {
        if self.exhausted {
            return false;
        }

        let wanted = self
            .engine
            .lookahead
            .min(self.max_items - self.summary.emitted)
            .max(1);
        let chunk: Vec<Candidate> = self.candidates.by_ref().take(wanted).collect();
        if chunk.len() < wanted {
            self.exhausted = true;
        }
        if chunk.is_empty() {
            return false;
        }

        let engine = &self.engine;
        let prepared: Vec<Prepared> = chunk
            .into_par_iter()
            .map(|candidate| prepare(engine, candidate))
            .collect();

        self.buffer.extend(prepared);
        true
    }

    fn skip(&mut self, volatile_id: u64, reason: SkipReason) {
        match reason {
            SkipReason::Unreadable | SkipReason::StoreUnavailable => self.summary.failed += 1,
            SkipReason::AlreadyReviewed | SkipReason::DuplicateContent => self.summary.skipped += 1,
        }
        self.engine
            .events
            .send(Event::Reconcile(ReconcileEvent::Skipped { volatile_id, reason }));
    }

    fn fail(&mut self, volatile_id: u64, reason: SkipReason, message: String) {
        self.engine
            .events
            .send(Event::Reconcile(ReconcileEvent::Error { volatile_id, message }));
        self.skip(volatile_id, reason);
    }

    /// Sequential part of the decision; `Some` if the item needs review
    fn decide(&mut self, prepared: Prepared) -> Option<MediaItem> {
        let (candidate, hashed) = match prepared {
            Prepared::Decided(candidate) => {
                debug!("Skipping {}: already reviewed", candidate.item_ref);
                self.skip(candidate.volatile_id, SkipReason::AlreadyReviewed);
                return None;
            }
            Prepared::Hashed(candidate, hashed) => (candidate, hashed),
        };

        let content_hash = match hashed {
            Ok(hash) => hash,
            Err(e) => {
                warn!("Skipping unreadable item {}: {}", candidate.item_ref, e);
                self.fail(candidate.volatile_id, SkipReason::Unreadable, e.to_string());
                return None;
            }
        };

        if self.seen.contains(&content_hash) {
            debug!("Skipping {}: duplicate content {}", candidate.item_ref, content_hash.short());
            self.skip(candidate.volatile_id, SkipReason::DuplicateContent);
            return None;
        }

        let existing = match self.engine.store.get(&content_hash) {
            Ok(record) => record,
            Err(e) => {
                warn!("Status lookup failed for {}: {}", content_hash, e);
                self.fail(candidate.volatile_id, SkipReason::StoreUnavailable, e.to_string());
                return None;
            }
        };
        self.seen.insert(content_hash.clone());

        let now = now_millis();
        match existing {
            Some(record) => {
                if record.volatile_id != candidate.volatile_id {
                    info!(
                        "Content {} moved from id {} to {}",
                        content_hash.short(),
                        record.volatile_id,
                        candidate.volatile_id
                    );
                    self.engine
                        .writer
                        .submit(record.with_volatile_id(candidate.volatile_id, now));
                    self.summary.reassigned += 1;
                    self.engine.events.send(Event::Reconcile(ReconcileEvent::IdReassigned {
                        content_hash: content_hash.to_string(),
                        old_id: record.volatile_id,
                        new_id: candidate.volatile_id,
                    }));
                }

                if record.status.is_decided() {
                    self.skip(candidate.volatile_id, SkipReason::AlreadyReviewed);
                    return None;
                }

                Some(to_item(candidate, content_hash))
            }
            None => {
                let item = to_item(candidate, content_hash);
                self.engine.writer.submit(item.to_record(now));
                Some(item)
            }
        }
    }

    fn complete(&mut self) {
        if self.completed {
            return;
        }
        self.completed = true;
        // Unhashed look-ahead is dropped, releasing nothing but memory.
        self.buffer.clear();

        let summary = self.summary;
        debug!(
            "Reconciliation pass finished: {} emitted, {} skipped, {} failed, {} reassigned",
            summary.emitted, summary.skipped, summary.failed, summary.reassigned
        );
        self.engine.events.send(Event::Reconcile(ReconcileEvent::Completed {
            emitted: summary.emitted,
            skipped: summary.skipped,
            failed: summary.failed,
        }));
    }
}

impl Iterator for ReconcileStream {
    type Item = MediaItem;

    fn next(&mut self) -> Option<MediaItem> {
        loop {
            if self.completed {
                return None;
            }
            if self.summary.emitted >= self.max_items || self.cancel.is_cancelled() {
                self.complete();
                return None;
            }

            let prepared = match self.buffer.pop_front() {
                Some(prepared) => prepared,
                None => {
                    if !self.fill() {
                        self.complete();
                        return None;
                    }
                    continue;
                }
            };

            if let Some(item) = self.decide(prepared) {
                self.summary.emitted += 1;
                self.engine.events.send(Event::Reconcile(ReconcileEvent::ItemReady {
                    content_hash: item.content_hash.to_string(),
                }));
                return Some(item);
            }
        }
    }
}

/// Volatile-id fast path, then content hashing and metadata loading.
/// Safe to run in parallel.
fn prepare(engine: &Reconciler, mut candidate: Candidate) -> Prepared {
    match engine.store.get_by_volatile_id(candidate.volatile_id) {
        Ok(Some(record)) if record.status.is_decided() => return Prepared::Decided(candidate),
        Ok(_) => {}
        Err(e) => debug!("Id lookup failed for {}, falling back to hash: {}", candidate.volatile_id, e),
    }

    // The reader opened for hashing is dropped before this returns.
    let hashed = engine.index.content_hash(&candidate, engine.hasher.as_ref());
    if hashed.is_ok() {
        engine.index.enrich(&mut candidate);
    }
    Prepared::Hashed(candidate, hashed)
}

fn to_item(candidate: Candidate, content_hash: ContentHash) -> MediaItem {
    let capture_timestamp = candidate.capture_timestamp();
    MediaItem {
        volatile_id: candidate.volatile_id,
        content_hash,
        item_ref: candidate.item_ref,
        capture_timestamp,
        size_bytes: candidate.size_bytes,
        location: candidate.location,
        album: candidate.album,
        description: candidate.description,
        title: candidate.display_name,
        resolution: candidate.resolution,
        status: ReviewStatus::Unset,
    }
}
