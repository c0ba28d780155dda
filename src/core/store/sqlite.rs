//! SQLite status store backend.

use super::{StatusCounts, StatusRecord, StatusStore};
use crate::core::media::{ContentHash, ReviewStatus, VolatileId};
use crate::error::StoreError;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// SQLite-backed persistent status store
///
/// Uses WAL (Write-Ahead Logging) mode so statistics queries can run
/// while persistence lanes are writing.
pub struct SqliteStatusStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteStatusStore {
    /// Open or create a status database at the given path
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::OpenFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        }

        let conn = Connection::open(path).map_err(|e| StoreError::OpenFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::initialize(conn, path.to_path_buf())
    }

    /// Open a private in-memory database (useful for tests and dry runs)
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::OpenFailed {
            path: PathBuf::from(":memory:"),
            reason: e.to_string(),
        })?;

        Self::initialize(conn, PathBuf::from(":memory:"))
    }

    fn initialize(conn: Connection, db_path: PathBuf) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS media_status (
                content_hash TEXT PRIMARY KEY,
                volatile_id INTEGER NOT NULL,
                status TEXT NOT NULL,
                size_bytes INTEGER NOT NULL,
                last_modified INTEGER NOT NULL
            )",
            [],
        )
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        // Volatile ids are not unique: stale rows may share an id after churn
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_media_status_volatile_id ON media_status(volatile_id)",
            [],
        )
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_media_status_status_time
             ON media_status(status, last_modified)",
            [],
        )
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    /// Path of the underlying database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned {
            path: self.db_path.clone(),
        })
    }

    fn row_to_record(row: &Row<'_>) -> Result<StatusRecord, StoreError> {
        let column = |e: rusqlite::Error| StoreError::QueryFailed(e.to_string());
        Ok(StatusRecord {
            content_hash: ContentHash::new(row.get::<_, String>(0).map_err(column)?),
            volatile_id: row.get::<_, i64>(1).map_err(column)? as u64,
            status: parse_status(row.get(2).map_err(column)?)?,
            size_bytes: row.get::<_, i64>(3).map_err(column)? as u64,
            last_modified: row.get(4).map_err(column)?,
        })
    }
}

fn parse_status(raw: String) -> Result<ReviewStatus, StoreError> {
    match ReviewStatus::from_str(&raw) {
        Some(status) => Ok(status),
        None => Err(StoreError::UnknownStatus(raw)),
    }
}

impl StatusStore for SqliteStatusStore {
    fn get(&self, content_hash: &ContentHash) -> Result<Option<StatusRecord>, StoreError> {
        let conn = self.lock()?;

        conn.query_row(
            "SELECT content_hash, volatile_id, status, size_bytes, last_modified
             FROM media_status WHERE content_hash = ?",
            [content_hash.as_str()],
            |row| Ok(Self::row_to_record(row)),
        )
        .optional()
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?
        .transpose()
    }

    fn get_by_volatile_id(&self, id: VolatileId) -> Result<Option<StatusRecord>, StoreError> {
        let conn = self.lock()?;

        conn.query_row(
            "SELECT content_hash, volatile_id, status, size_bytes, last_modified
             FROM media_status WHERE volatile_id = ? LIMIT 1",
            [id as i64],
            |row| Ok(Self::row_to_record(row)),
        )
        .optional()
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?
        .transpose()
    }

    fn upsert(&self, record: &StatusRecord) -> Result<(), StoreError> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT OR REPLACE INTO media_status
             (content_hash, volatile_id, status, size_bytes, last_modified)
             VALUES (?, ?, ?, ?, ?)",
            params![
                record.content_hash.as_str(),
                record.volatile_id as i64,
                record.status.as_str(),
                record.size_bytes as i64,
                record.last_modified,
            ],
        )
        .map_err(|e| StoreError::WriteFailed {
            content_hash: record.content_hash.to_string(),
            reason: e.to_string(),
        })?;

        Ok(())
    }

    fn sizes_between(&self, status: ReviewStatus, from: i64, to: i64) -> Result<Vec<u64>, StoreError> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(
                "SELECT size_bytes FROM media_status
                 WHERE status = ? AND last_modified BETWEEN ? AND ?",
            )
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        let sizes = stmt
            .query_map(params![status.as_str(), from, to], |row| {
                row.get::<_, i64>(0).map(|v| v as u64)
            })
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Ok(sizes)
    }

    fn counts(&self) -> Result<StatusCounts, StoreError> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare("SELECT status, COUNT(*) FROM media_status GROUP BY status")
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
            })
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        let mut counts = StatusCounts::default();
        for row in rows {
            let (status, count) = row.map_err(|e| StoreError::QueryFailed(e.to_string()))?;
            counts.add(parse_status(status)?, count);
        }

        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::fixtures::record;
    use tempfile::TempDir;

    #[test]
    fn sqlite_store_creates_database() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("status.db");

        let store = SqliteStatusStore::open(&db_path).unwrap();

        assert!(db_path.exists());
        assert_eq!(store.counts().unwrap().total(), 0);
    }

    #[test]
    fn stores_and_retrieves_by_hash_and_id() {
        let store = SqliteStatusStore::open_in_memory().unwrap();
        store.upsert(&record("h1", 5, ReviewStatus::Keep, 1000, 10)).unwrap();

        let by_hash = store.get(&ContentHash::new("h1")).unwrap().unwrap();
        assert_eq!(by_hash.volatile_id, 5);
        assert_eq!(by_hash.status, ReviewStatus::Keep);

        let by_id = store.get_by_volatile_id(5).unwrap().unwrap();
        assert_eq!(by_id.content_hash, ContentHash::new("h1"));

        assert!(store.get(&ContentHash::new("missing")).unwrap().is_none());
        assert!(store.get_by_volatile_id(6).unwrap().is_none());
    }

    #[test]
    fn upsert_replaces_by_key() {
        let store = SqliteStatusStore::open_in_memory().unwrap();
        store.upsert(&record("h1", 5, ReviewStatus::Unset, 1000, 10)).unwrap();
        store.upsert(&record("h1", 9, ReviewStatus::Delete, 1000, 20)).unwrap();

        let counts = store.counts().unwrap();
        assert_eq!(counts.total(), 1);
        assert_eq!(counts.delete, 1);

        let stored = store.get(&ContentHash::new("h1")).unwrap().unwrap();
        assert_eq!(stored.volatile_id, 9);
        assert_eq!(stored.last_modified, 20);
    }

    #[test]
    fn sizes_between_filters_status_and_time() {
        let store = SqliteStatusStore::open_in_memory().unwrap();
        store.upsert(&record("a", 1, ReviewStatus::Delete, 100, 50)).unwrap();
        store.upsert(&record("b", 2, ReviewStatus::Delete, 200, 150)).unwrap();
        store.upsert(&record("c", 3, ReviewStatus::Keep, 400, 60)).unwrap();

        let mut sizes = store.sizes_between(ReviewStatus::Delete, 0, 100).unwrap();
        sizes.sort();
        assert_eq!(sizes, vec![100]);

        let sizes = store.sizes_between(ReviewStatus::Delete, 1000, 2000).unwrap();
        assert!(sizes.is_empty());
    }

    #[test]
    fn unknown_status_is_an_error() {
        let store = SqliteStatusStore::open_in_memory().unwrap();
        store
            .lock()
            .unwrap()
            .execute(
                "INSERT INTO media_status VALUES ('h1', 5, 'maybe', 10, 10)",
                [],
            )
            .unwrap();

        let by_hash = store.get(&ContentHash::new("h1"));
        assert!(matches!(by_hash, Err(StoreError::UnknownStatus(ref s)) if s == "maybe"));
        assert!(matches!(store.get_by_volatile_id(5), Err(StoreError::UnknownStatus(_))));
        assert!(matches!(store.counts(), Err(StoreError::UnknownStatus(_))));
    }

    #[test]
    fn persists_across_opens() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("status.db");

        {
            let store = SqliteStatusStore::open(&db_path).unwrap();
            store.upsert(&record("h1", 5, ReviewStatus::Keep, 1000, 10)).unwrap();
        }

        let store = SqliteStatusStore::open(&db_path).unwrap();
        assert_eq!(store.counts().unwrap().keep, 1);
    }
}
