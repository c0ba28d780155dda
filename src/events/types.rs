//! Event type definitions for progress reporting and user notices.

use crate::core::review::ReviewState;
use crate::core::stats::TimeWindow;
use serde::{Deserialize, Serialize};

/// All events emitted by the triage engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Reconciliation pass events
    Reconcile(ReconcileEvent),
    /// Review state machine events
    Review(ReviewEvent),
    /// Background persistence events
    Store(StoreEvent),
}

/// Why a candidate was not handed to the review queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// A KEEP or DELETE decision already exists for this item
    AlreadyReviewed,
    /// The same content was already emitted during this pass
    DuplicateContent,
    /// The item's bytes could not be read or hashed
    Unreadable,
    /// The status store could not be queried for this item
    StoreUnavailable,
}

/// Events during a reconciliation pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReconcileEvent {
    /// A pass has started
    Started { max_items: usize },
    /// An item needs review and was emitted
    ItemReady { content_hash: String },
    /// A candidate was skipped
    Skipped { volatile_id: u64, reason: SkipReason },
    /// The media index assigned a new id to known content
    IdReassigned {
        content_hash: String,
        old_id: u64,
        new_id: u64,
    },
    /// A candidate failed but the pass continues
    Error { volatile_id: u64, message: String },
    /// The pass finished (limit reached, index exhausted or cancelled)
    Completed {
        emitted: usize,
        skipped: usize,
        failed: usize,
    },
}

/// Non-fatal conditions the user should be told about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    /// `undo` was requested with nothing before the cursor
    NothingToUndo,
    /// `delete_photos` was requested with nothing marked for deletion
    NothingToDelete,
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::NothingToUndo => write!(f, "Nothing to undo!"),
            Notice::NothingToDelete => write!(f, "No photos were deleted"),
        }
    }
}

/// Events from the review state machine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReviewEvent {
    /// A user-visible notice
    Notice(Notice),
    /// The machine moved between browsing and pending review
    StateChanged { state: ReviewState },
    /// Confirmed deletions were applied to the queue
    Deleted { count: usize, bytes: u64 },
    /// The space-saved aggregate was recomputed
    StatsUpdated { window: TimeWindow, bytes: u64 },
}

/// Events from background persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StoreEvent {
    /// A status record could not be written; in-memory state is unaffected
    WriteFailed {
        content_hash: String,
        message: String,
    },
}
