//! # Media Index Module
//!
//! The read-only source of candidate items.
//!
//! A media index lists candidates cheaply, fills in the metadata shown on
//! the review card on request, and gives access to each candidate's bytes
//! for content hashing.
//! The identifier it assigns is *volatile*: a rescan, a reinstall or a
//! moved file may give the same content a new id.
//!
//! ## Implementations
//! - `DirectoryIndex` - Photos under one or more folders (walkdir)
//! - `InMemoryIndex` - Fixed candidates with in-memory bytes, for testing
//!
//! ## Supported Formats
//! JPEG, PNG, WebP, HEIC/HEIF, GIF, BMP, TIFF

mod directory;
mod filter;
mod memory;

pub use directory::{volatile_id_for, DirectoryIndex, IndexConfig};
pub use filter::ImageFilter;
pub use memory::InMemoryIndex;

use crate::core::hasher::ContentHasher;
use crate::core::media::{ContentHash, ItemRef, VolatileId};
use crate::error::{HashError, IndexError};
use serde::{Deserialize, Serialize};
use std::io::Read;

/// A candidate item as listed by a media index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub volatile_id: VolatileId,
    pub item_ref: ItemRef,
    /// Capture time (Unix millis), when the index knows it
    pub date_taken: Option<i64>,
    /// Time the item entered the index (Unix millis)
    pub date_added: i64,
    pub size_bytes: u64,
    pub album: Option<String>,
    pub description: Option<String>,
    pub display_name: Option<String>,
    pub resolution: Option<String>,
    /// Latitude, longitude in decimal degrees
    pub location: Option<[f64; 2]>,
}

impl Candidate {
    /// Capture time, falling back to the time the item was added
    pub fn capture_timestamp(&self) -> i64 {
        match self.date_taken {
            Some(taken) if taken > 0 => taken,
            _ => self.date_added,
        }
    }
}

/// Order in which candidates are listed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexOrder {
    /// Shuffled, so each session surfaces a different slice of the library
    #[default]
    Random,
    /// Whatever order the index produces natively
    Natural,
}

/// Boxed lazy sequence of candidates
pub type CandidateIter = Box<dyn Iterator<Item = Candidate> + Send>;

/// Trait for media indexes
pub trait MediaIndex: Send + Sync {
    /// List candidates in the requested order
    fn candidates(&self, order: IndexOrder) -> Result<CandidateIter, IndexError>;

    /// Load the card metadata that is too costly to read while listing.
    /// Only called for candidates that were not skipped by their id.
    fn enrich(&self, _candidate: &mut Candidate) {}

    /// Open a candidate's bytes. Dropping the reader releases the handle.
    fn open(&self, candidate: &Candidate) -> Result<Box<dyn Read + Send>, HashError>;

    /// Hash a candidate's content
    fn content_hash(
        &self,
        candidate: &Candidate,
        hasher: &dyn ContentHasher,
    ) -> Result<ContentHash, HashError> {
        let mut reader = self.open(candidate)?;
        hasher.hash_reader(&candidate.item_ref.to_string(), &mut reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(date_taken: Option<i64>) -> Candidate {
        Candidate {
            volatile_id: 1,
            item_ref: ItemRef::new("/photos/a.jpg"),
            date_taken,
            date_added: 500,
            size_bytes: 10,
            album: None,
            description: None,
            display_name: None,
            resolution: None,
            location: None,
        }
    }

    #[test]
    fn capture_timestamp_prefers_date_taken() {
        assert_eq!(candidate(Some(100)).capture_timestamp(), 100);
    }

    #[test]
    fn capture_timestamp_falls_back_to_date_added() {
        assert_eq!(candidate(None).capture_timestamp(), 500);
        assert_eq!(candidate(Some(0)).capture_timestamp(), 500);
    }
}
