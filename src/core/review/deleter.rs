//! Physical deletion of confirmed items.

use crate::core::media::ItemRef;
use crate::error::DeletionError;
use std::collections::HashSet;
use std::sync::Mutex;
use tracing::warn;

/// Per-item result of a deletion request; may be partial
#[derive(Debug, Default)]
pub struct DeletionOutcome {
    pub deleted: Vec<ItemRef>,
    pub failed: Vec<(ItemRef, DeletionError)>,
}

impl DeletionOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Removes items from the user's storage
pub trait Deleter: Send + Sync {
    fn request_deletion(&self, items: &[ItemRef]) -> DeletionOutcome;
}

/// Moves files to the platform trash
#[derive(Debug, Clone, Copy, Default)]
pub struct TrashDeleter;

impl Deleter for TrashDeleter {
    fn request_deletion(&self, items: &[ItemRef]) -> DeletionOutcome {
        let mut outcome = DeletionOutcome::default();

        for item in items {
            let path = item.as_path();
            if !path.exists() {
                outcome.failed.push((
                    item.clone(),
                    DeletionError::Missing {
                        item: item.to_string(),
                    },
                ));
                continue;
            }

            match trash::delete(path) {
                Ok(()) => outcome.deleted.push(item.clone()),
                Err(e) => {
                    warn!("Failed to trash {}: {}", item, e);
                    outcome.failed.push((
                        item.clone(),
                        DeletionError::Trash {
                            item: item.to_string(),
                            reason: e.to_string(),
                        },
                    ));
                }
            }
        }

        outcome
    }
}

/// Records deletion requests without touching storage.
///
/// Items listed with [`refuse`](Self::refuse) fail with
/// `DeletionError::Refused`.
#[derive(Debug, Default)]
pub struct RecordingDeleter {
    requested: Mutex<Vec<ItemRef>>,
    refused: Mutex<HashSet<ItemRef>>,
}

impl RecordingDeleter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refuse(&self, item: ItemRef) {
        if let Ok(mut refused) = self.refused.lock() {
            refused.insert(item);
        }
    }

    /// Every item requested so far, in request order
    pub fn requested(&self) -> Vec<ItemRef> {
        self.requested
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl Deleter for RecordingDeleter {
    fn request_deletion(&self, items: &[ItemRef]) -> DeletionOutcome {
        let mut outcome = DeletionOutcome::default();
        let refused = self.refused.lock().map(|r| r.clone()).unwrap_or_default();

        if let Ok(mut requested) = self.requested.lock() {
            requested.extend(items.iter().cloned());
        }

        for item in items {
            if refused.contains(item) {
                outcome.failed.push((
                    item.clone(),
                    DeletionError::Refused {
                        item: item.to_string(),
                    },
                ));
            } else {
                outcome.deleted.push(item.clone());
            }
        }

        outcome
    }
}
