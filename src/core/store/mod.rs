//! # Status Store Module
//!
//! Durable per-item review status, keyed by content hash.
//!
//! ## Record Lifecycle
//! - Created on the first sighting of a new content hash (status UNSET)
//! - Updated on every KEEP/UNSET decision, on confirmed deletion and
//!   whenever the media index reassigns the item's volatile id
//! - Never deleted: DELETE records feed the space-saved statistics
//!
//! ## Backends
//! - `SqliteStatusStore` - Persistent storage using SQLite
//! - `InMemoryStatusStore` - For testing
//!
//! Writes issued from the review path and from reconciliation go through
//! [`StoreWriter`], which applies writes to the same key in issue order.

mod memory;
mod sqlite;
mod traits;
mod writer;

pub use memory::InMemoryStatusStore;
pub use sqlite::SqliteStatusStore;
pub use traits::StatusStore;
pub use writer::StoreWriter;

use crate::core::media::{ContentHash, ReviewStatus, VolatileId};
use serde::{Deserialize, Serialize};

/// Durable review status of one distinct piece of content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    /// Primary key
    pub content_hash: ContentHash,
    /// Last volatile id the item was seen under; advisory only
    pub volatile_id: VolatileId,
    pub status: ReviewStatus,
    pub size_bytes: u64,
    /// Unix millis of the last status or id change
    pub last_modified: i64,
}

impl StatusRecord {
    /// Same record, re-pointed at a new volatile id
    pub fn with_volatile_id(&self, volatile_id: VolatileId, now: i64) -> Self {
        Self {
            volatile_id,
            last_modified: now,
            ..self.clone()
        }
    }
}

/// Number of records per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub unset: usize,
    pub keep: usize,
    pub delete: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.unset + self.keep + self.delete
    }

    pub(crate) fn add(&mut self, status: ReviewStatus, count: usize) {
        match status {
            ReviewStatus::Unset => self.unset += count,
            ReviewStatus::Keep => self.keep += count,
            ReviewStatus::Delete => self.delete += count,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_volatile_id_keeps_status() {
        let record = fixtures::record("abc", 5, ReviewStatus::Keep, 100, 1);

        let moved = record.with_volatile_id(9, 2);

        assert_eq!(moved.volatile_id, 9);
        assert_eq!(moved.last_modified, 2);
        assert_eq!(moved.status, ReviewStatus::Keep);
        assert_eq!(moved.content_hash, record.content_hash);
    }

    #[test]
    fn counts_total_sums_statuses() {
        let mut counts = StatusCounts::default();
        counts.add(ReviewStatus::Keep, 3);
        counts.add(ReviewStatus::Delete, 2);
        counts.add(ReviewStatus::Unset, 1);
        assert_eq!(counts.total(), 6);
    }
}
