//! In-memory media index for testing.

use super::{Candidate, CandidateIter, IndexOrder, MediaIndex};
use crate::core::media::{ItemRef, VolatileId};
use crate::error::{HashError, IndexError};
use rand::seq::SliceRandom;
use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

/// Media index backed by a fixed list of candidates with in-memory bytes.
///
/// Candidates added without bytes are listed but fail to open, the way a
/// file deleted behind the index's back would.
#[derive(Default)]
pub struct InMemoryIndex {
    entries: RwLock<Vec<(Candidate, Option<Vec<u8>>)>>,
    unavailable: AtomicBool,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a candidate with the given bytes
    pub fn add(&self, candidate: Candidate, bytes: Option<Vec<u8>>) {
        if let Ok(mut entries) = self.entries.write() {
            entries.push((candidate, bytes));
        }
    }

    /// Add a photo named `name` with `bytes` as its content
    pub fn add_photo(&self, volatile_id: VolatileId, name: &str, bytes: &[u8]) -> Candidate {
        let candidate = photo_candidate(volatile_id, name, bytes.len() as u64);
        self.add(candidate.clone(), Some(bytes.to_vec()));
        candidate
    }

    /// Add a photo that is listed but cannot be read
    pub fn add_unreadable(&self, volatile_id: VolatileId, name: &str) -> Candidate {
        let candidate = photo_candidate(volatile_id, name, 0);
        self.add(candidate.clone(), None);
        candidate
    }

    /// Give the candidate currently known as `old` a new volatile id
    pub fn reassign_id(&self, old: VolatileId, new: VolatileId) {
        if let Ok(mut entries) = self.entries.write() {
            for (candidate, _) in entries.iter_mut().filter(|(c, _)| c.volatile_id == old) {
                candidate.volatile_id = new;
            }
        }
    }

    /// Drop a candidate from the listing
    pub fn remove(&self, volatile_id: VolatileId) {
        if let Ok(mut entries) = self.entries.write() {
            entries.retain(|(c, _)| c.volatile_id != volatile_id);
        }
    }

    /// Make `candidates` fail, as an index whose permission was revoked
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn photo_candidate(volatile_id: VolatileId, name: &str, size_bytes: u64) -> Candidate {
    Candidate {
        volatile_id,
        item_ref: ItemRef::new(format!("memory://{}", name)),
        date_taken: None,
        date_added: 1_700_000_000_000,
        size_bytes,
        album: None,
        description: None,
        display_name: Some(name.to_string()),
        resolution: None,
        location: None,
    }
}

impl MediaIndex for InMemoryIndex {
    fn candidates(&self, order: IndexOrder) -> Result<CandidateIter, IndexError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(IndexError::Unavailable("access revoked".to_string()));
        }

        let mut candidates: Vec<Candidate> = self
            .entries
            .read()
            .map_err(|_| IndexError::Unavailable("index lock poisoned".to_string()))?
            .iter()
            .map(|(c, _)| c.clone())
            .collect();

        if order == IndexOrder::Random {
            candidates.shuffle(&mut rand::thread_rng());
        }

        Ok(Box::new(candidates.into_iter()))
    }

    fn open(&self, candidate: &Candidate) -> Result<Box<dyn Read + Send>, HashError> {
        let item = candidate.item_ref.to_string();
        let entries = self
            .entries
            .read()
            .map_err(|_| HashError::Unreadable { item: item.clone() })?;

        match entries.iter().find(|(c, _)| c.item_ref == candidate.item_ref) {
            Some((_, Some(bytes))) => Ok(Box::new(Cursor::new(bytes.clone()))),
            _ => Err(HashError::Unreadable { item }),
        }
    }
}
