//! Two-phase ingestion: a small synchronous batch, the rest in the background.

use super::{CancellationToken, ReconcileStream, ReconcileSummary};
use crate::core::media::MediaItem;
use crossbeam_channel::{unbounded, Receiver};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Remainder of a reconciliation pass running on its own thread.
///
/// The thread only produces items; the owner of the review queue pulls
/// them with [`try_recv`](Self::try_recv) / [`drain`](Self::drain) so the
/// queue keeps a single writer.
pub struct Ingestion {
    receiver: Receiver<MediaItem>,
    handle: Option<JoinHandle<ReconcileSummary>>,
    cancel: CancellationToken,
}

impl Ingestion {
    /// Take `eager_count` items synchronously and continue the pass in the
    /// background.
    pub fn start(mut stream: ReconcileStream, eager_count: usize) -> (Vec<MediaItem>, Ingestion) {
        let eager: Vec<MediaItem> = stream.by_ref().take(eager_count).collect();
        debug!("Eager batch ready with {} items", eager.len());

        let cancel = stream.cancellation_token();
        let (tx, rx) = unbounded();

        if stream.is_complete() {
            let ingestion = Ingestion {
                receiver: rx,
                handle: None,
                cancel,
            };
            return (eager, ingestion);
        }

        let spawned = thread::Builder::new()
            .name("reconcile-ingest".to_string())
            .spawn(move || {
                for item in stream.by_ref() {
                    if tx.send(item).is_err() {
                        break;
                    }
                }
                stream.summary()
            });

        let handle = match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Failed to start background ingestion: {}", e);
                None
            }
        };

        let ingestion = Ingestion {
            receiver: rx,
            handle,
            cancel,
        };
        (eager, ingestion)
    }

    /// Next item if one is ready, without blocking
    pub fn try_recv(&self) -> Option<MediaItem> {
        self.receiver.try_recv().ok()
    }

    /// Every item ready so far
    pub fn drain(&self) -> Vec<MediaItem> {
        self.receiver.try_iter().collect()
    }

    /// Whether the background pass has finished producing items
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Stop the background pass at its next candidate
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Block until the background pass ends; returns the items it produced
    /// that were not yet drained, and its summary.
    pub fn wait(mut self) -> (Vec<MediaItem>, Option<ReconcileSummary>) {
        let summary = match self.handle.take() {
            Some(handle) => match handle.join() {
                Ok(summary) => Some(summary),
                Err(_) => {
                    warn!("Background ingestion thread panicked");
                    None
                }
            },
            None => None,
        };
        (self.drain(), summary)
    }
}
