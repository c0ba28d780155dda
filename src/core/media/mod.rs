//! # Media Module
//!
//! The data model shared by reconciliation, review and stats.
//!
//! A [`MediaItem`] is transient: it is created by the reconciler when an
//! item needs review, mutated only by the review session and dropped when
//! its deletion is confirmed. The durable counterpart is
//! [`StatusRecord`](crate::core::store::StatusRecord).

use crate::core::store::StatusRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Identifier assigned by the media index. May change across sessions.
pub type VolatileId = u64;

/// Current wall-clock time as Unix milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Review decision for a single item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    #[default]
    Unset,
    Keep,
    Delete,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Keep => "keep",
            Self::Delete => "delete",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "unset" => Some(Self::Unset),
            "keep" => Some(Self::Keep),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    /// True once a KEEP or DELETE decision has been made
    pub fn is_decided(&self) -> bool {
        !matches!(self, Self::Unset)
    }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unset => write!(f, "UNSET"),
            Self::Keep => write!(f, "KEEP"),
            Self::Delete => write!(f, "DELETE"),
        }
    }
}

/// Stable identity of an item, derived from its bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Wrap an already-encoded hash
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// Encode raw digest bytes as lowercase hex
    pub fn from_digest(bytes: &[u8]) -> Self {
        Self(bytes.iter().map(|b| format!("{:02x}", b)).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, for log lines and terminal output
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(8)]
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle used to open, share or delete an item through its media index
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemRef(PathBuf);

impl ItemRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl std::fmt::Display for ItemRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// An item in the review queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub volatile_id: VolatileId,
    pub content_hash: ContentHash,
    pub item_ref: ItemRef,
    /// Capture time (Unix millis); falls back to the time the item was added
    pub capture_timestamp: i64,
    pub size_bytes: u64,
    /// Latitude, longitude in decimal degrees
    pub location: Option<[f64; 2]>,
    pub album: Option<String>,
    pub description: Option<String>,
    pub title: Option<String>,
    pub resolution: Option<String>,
    pub status: ReviewStatus,
}

impl MediaItem {
    /// Durable record reflecting this item's current status
    pub fn to_record(&self, last_modified: i64) -> StatusRecord {
        StatusRecord {
            content_hash: self.content_hash.clone(),
            volatile_id: self.volatile_id,
            status: self.status,
            size_bytes: self.size_bytes,
            last_modified,
        }
    }

    /// Capture date as `YYYY-MM-DD`
    pub fn formatted_date(&self) -> String {
        DateTime::<Utc>::from_timestamp_millis(self.capture_timestamp)
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "1970-01-01".to_string())
    }

    /// `geo:` URI for handing the location to a maps application
    pub fn geo_uri(&self) -> Option<String> {
        self.location
            .map(|[lat, lon]| format!("geo:{},{}", lat, lon))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// A reviewable item whose hash is derived from `id`
    pub fn item(id: VolatileId, size_bytes: u64) -> MediaItem {
        MediaItem {
            volatile_id: id,
            content_hash: ContentHash::new(format!("hash-{}", id)),
            item_ref: ItemRef::new(format!("/photos/{}.jpg", id)),
            capture_timestamp: 1_700_000_000_000,
            size_bytes,
            location: None,
            album: Some("Camera".to_string()),
            description: None,
            title: Some(format!("{}.jpg", id)),
            resolution: Some("4032x3024".to_string()),
            status: ReviewStatus::Unset,
        }
    }
}
