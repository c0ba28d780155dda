//! Ordered background persistence.
//!
//! Status writes never run on the interactive path. Each write is routed
//! to one of N worker lanes by the hash of its key; a lane applies its
//! queue strictly in order. Writes to the same content hash therefore land
//! in the order they were issued (last write wins), while writes to
//! different keys proceed in parallel.

use super::{StatusRecord, StatusStore};
use crate::events::{null_sender, Event, EventSender, StoreEvent};
use crossbeam_channel::{bounded, unbounded, Sender};
use std::sync::Arc;
use std::thread;
use tracing::{debug, warn};
use xxhash_rust::xxh3::xxh3_64;

enum WriteOp {
    Upsert(StatusRecord),
    Flush(Sender<()>),
}

/// Handle to the persistence lanes. Cheap to clone.
///
/// Lanes shut down once every clone has been dropped and their queues
/// have drained.
#[derive(Clone)]
pub struct StoreWriter {
    lanes: Arc<Vec<Sender<WriteOp>>>,
}

impl StoreWriter {
    /// Start `lanes` worker threads writing into `store`
    pub fn spawn(store: Arc<dyn StatusStore>, lanes: usize) -> Self {
        Self::spawn_with_events(store, lanes, null_sender())
    }

    /// Start worker threads, reporting failed writes on `events`
    pub fn spawn_with_events(store: Arc<dyn StatusStore>, lanes: usize, events: EventSender) -> Self {
        let lanes = lanes.max(1);
        let mut senders = Vec::with_capacity(lanes);

        for lane in 0..lanes {
            let (tx, rx) = unbounded::<WriteOp>();
            let store = Arc::clone(&store);
            let events = events.clone();

            let spawned = thread::Builder::new()
                .name(format!("status-writer-{}", lane))
                .spawn(move || {
                    for op in rx.iter() {
                        match op {
                            WriteOp::Upsert(record) => {
                                if let Err(e) = store.upsert(&record) {
                                    warn!(
                                        content_hash = %record.content_hash,
                                        error = %e,
                                        "status write failed; keeping in-memory state"
                                    );
                                    events.send(Event::Store(StoreEvent::WriteFailed {
                                        content_hash: record.content_hash.to_string(),
                                        message: e.to_string(),
                                    }));
                                } else {
                                    debug!(
                                        content_hash = %record.content_hash,
                                        status = %record.status,
                                        lane,
                                        "status written"
                                    );
                                }
                            }
                            WriteOp::Flush(ack) => {
                                let _ = ack.send(());
                            }
                        }
                    }
                });

            match spawned {
                Ok(_) => senders.push(tx),
                Err(e) => warn!(lane, error = %e, "failed to start status writer lane"),
            }
        }

        Self {
            lanes: Arc::new(senders),
        }
    }

    /// Number of running lanes
    pub fn lanes(&self) -> usize {
        self.lanes.len()
    }

    /// Queue a write. Returns immediately.
    pub fn submit(&self, record: StatusRecord) {
        if self.lanes.is_empty() {
            warn!(content_hash = %record.content_hash, "no status writer lanes; write dropped");
            return;
        }

        let lane = (xxh3_64(record.content_hash.as_str().as_bytes()) % self.lanes.len() as u64) as usize;
        if self.lanes[lane].send(WriteOp::Upsert(record)).is_err() {
            warn!(lane, "status writer lane has stopped; write dropped");
        }
    }

    /// Block until every write submitted before this call has been applied
    pub fn flush(&self) {
        let (ack_tx, ack_rx) = bounded(self.lanes.len());
        let mut pending = 0;

        for lane in self.lanes.iter() {
            if lane.send(WriteOp::Flush(ack_tx.clone())).is_ok() {
                pending += 1;
            }
        }
        drop(ack_tx);

        for _ in 0..pending {
            if ack_rx.recv().is_err() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::media::{ContentHash, ReviewStatus};
    use crate::core::store::fixtures::record;
    use crate::core::store::InMemoryStatusStore;
    use crate::events::EventChannel;

    #[test]
    fn flush_waits_for_queued_writes() {
        let store = Arc::new(InMemoryStatusStore::new());
        let writer = StoreWriter::spawn(store.clone(), 4);

        for i in 0..50 {
            writer.submit(record(&format!("h{}", i), i, ReviewStatus::Unset, 10, 1));
        }
        writer.flush();

        assert_eq!(store.counts().unwrap().unset, 50);
    }

    #[test]
    fn same_key_writes_apply_in_issue_order() {
        let store = Arc::new(InMemoryStatusStore::new());
        let writer = StoreWriter::spawn(store.clone(), 8);

        for i in 0..200u64 {
            let status = if i % 2 == 0 { ReviewStatus::Keep } else { ReviewStatus::Unset };
            writer.submit(record("same", i, status, 10, i as i64));
        }
        writer.submit(record("same", 999, ReviewStatus::Delete, 10, 999));
        writer.flush();

        let stored = store.get(&ContentHash::new("same")).unwrap().unwrap();
        assert_eq!(stored.volatile_id, 999);
        assert_eq!(stored.status, ReviewStatus::Delete);
    }

    #[test]
    fn failed_writes_are_reported_not_propagated() {
        let store = Arc::new(InMemoryStatusStore::new());
        store.set_fail_writes(true);
        let (sender, receiver) = EventChannel::new();
        let writer = StoreWriter::spawn_with_events(store.clone(), 1, sender);

        writer.submit(record("h1", 1, ReviewStatus::Keep, 10, 1));
        writer.flush();

        let failures: Vec<_> = receiver
            .drain()
            .into_iter()
            .filter(|e| matches!(e, Event::Store(StoreEvent::WriteFailed { .. })))
            .collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(store.counts().unwrap().total(), 0);
    }

    #[test]
    fn zero_lanes_is_clamped_to_one() {
        let store = Arc::new(InMemoryStatusStore::new());
        let writer = StoreWriter::spawn(store, 0);
        assert_eq!(writer.lanes(), 1);
    }
}
