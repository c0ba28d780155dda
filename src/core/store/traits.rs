//! Status store trait definition.

use super::{StatusCounts, StatusRecord};
use crate::core::media::{ContentHash, ReviewStatus, VolatileId};
use crate::error::StoreError;

/// Durable key-value store of status records keyed by content hash.
///
/// Implementations must apply `upsert` with replace-by-key semantics.
/// Ordering between writes to the same key is provided by
/// [`StoreWriter`](super::StoreWriter), not by the backend.
pub trait StatusStore: Send + Sync {
    /// Look up a record by its content hash
    fn get(&self, content_hash: &ContentHash) -> Result<Option<StatusRecord>, StoreError>;

    /// Look up a record by the last known volatile id.
    ///
    /// Ids are advisory, so more than one record may match after churn;
    /// any one of them is returned.
    fn get_by_volatile_id(&self, id: VolatileId) -> Result<Option<StatusRecord>, StoreError>;

    /// Insert or replace the record for `record.content_hash`
    fn upsert(&self, record: &StatusRecord) -> Result<(), StoreError>;

    /// Sizes of every record with `status` modified within `[from, to]` (Unix millis)
    fn sizes_between(&self, status: ReviewStatus, from: i64, to: i64) -> Result<Vec<u64>, StoreError>;

    /// Number of records per status
    fn counts(&self) -> Result<StatusCounts, StoreError>;
}
