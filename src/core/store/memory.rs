//! In-memory status store backend for testing.

use super::{StatusCounts, StatusRecord, StatusStore};
use crate::core::media::{ContentHash, ReviewStatus, VolatileId};
use crate::error::StoreError;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

/// In-memory status store
///
/// Useful for testing and for dry runs where nothing should persist.
/// Writes can be made to fail on demand to exercise durability gaps.
pub struct InMemoryStatusStore {
    records: RwLock<HashMap<ContentHash, StatusRecord>>,
    fail_writes: AtomicBool,
}

impl InMemoryStatusStore {
    /// Create a new, empty store
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Create a store pre-populated with records
    pub fn with_records(records: impl IntoIterator<Item = StatusRecord>) -> Self {
        let store = Self::new();
        if let Ok(mut map) = store.records.write() {
            for record in records {
                map.insert(record.content_hash.clone(), record);
            }
        }
        store
    }

    /// Make every subsequent `upsert` fail (or succeed again)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of every stored record
    pub fn records(&self) -> Vec<StatusRecord> {
        self.records
            .read()
            .map(|map| map.values().cloned().collect())
            .unwrap_or_default()
    }

    fn poisoned() -> StoreError {
        StoreError::Poisoned {
            path: PathBuf::from("memory"),
        }
    }
}

impl Default for InMemoryStatusStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusStore for InMemoryStatusStore {
    fn get(&self, content_hash: &ContentHash) -> Result<Option<StatusRecord>, StoreError> {
        let records = self.records.read().map_err(|_| Self::poisoned())?;
        Ok(records.get(content_hash).cloned())
    }

    fn get_by_volatile_id(&self, id: VolatileId) -> Result<Option<StatusRecord>, StoreError> {
        let records = self.records.read().map_err(|_| Self::poisoned())?;
        Ok(records.values().find(|r| r.volatile_id == id).cloned())
    }

    fn upsert(&self, record: &StatusRecord) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::WriteFailed {
                content_hash: record.content_hash.to_string(),
                reason: "writes disabled".to_string(),
            });
        }

        let mut records = self.records.write().map_err(|_| Self::poisoned())?;
        records.insert(record.content_hash.clone(), record.clone());
        Ok(())
    }

    fn sizes_between(&self, status: ReviewStatus, from: i64, to: i64) -> Result<Vec<u64>, StoreError> {
        let records = self.records.read().map_err(|_| Self::poisoned())?;
        Ok(records
            .values()
            .filter(|r| r.status == status && r.last_modified >= from && r.last_modified <= to)
            .map(|r| r.size_bytes)
            .collect())
    }

    fn counts(&self) -> Result<StatusCounts, StoreError> {
        let records = self.records.read().map_err(|_| Self::poisoned())?;
        let mut counts = StatusCounts::default();
        for record in records.values() {
            counts.add(record.status, 1);
        }
        Ok(counts)
    }
}
