//! In-memory review queue.

use crate::core::media::{ContentHash, MediaItem, ReviewStatus};
use std::collections::HashSet;

/// Ordered working set of items with a cursor and a cached UNSET count.
///
/// Invariants: `unset_count() == count(status == UNSET)` and
/// `cursor() <= len()`. Every status change goes through
/// [`set_status`](Self::set_status), which keeps the count in step.
#[derive(Debug, Default)]
pub struct ReviewQueue {
    items: Vec<MediaItem>,
    hashes: HashSet<ContentHash>,
    cursor: usize,
    unset_count: usize,
}

impl ReviewQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&MediaItem> {
        self.items.get(index)
    }

    /// Item under the cursor, `None` once the cursor is past the end
    pub fn current(&self) -> Option<&MediaItem> {
        self.items.get(self.cursor)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn unset_count(&self) -> usize {
        self.unset_count
    }

    pub fn delete_count(&self) -> usize {
        self.items
            .iter()
            .filter(|i| i.status == ReviewStatus::Delete)
            .count()
    }

    pub fn contains(&self, content_hash: &ContentHash) -> bool {
        self.hashes.contains(content_hash)
    }

    pub fn index_of(&self, content_hash: &ContentHash) -> Option<usize> {
        self.items.iter().position(|i| &i.content_hash == content_hash)
    }

    /// Append an item; content already in the queue is ignored
    pub fn push(&mut self, item: MediaItem) -> bool {
        if !self.hashes.insert(item.content_hash.clone()) {
            return false;
        }
        if item.status == ReviewStatus::Unset {
            self.unset_count += 1;
        }
        self.items.push(item);
        true
    }

    /// Change an item's status, returning the previous one
    pub fn set_status(&mut self, index: usize, status: ReviewStatus) -> Option<ReviewStatus> {
        let item = self.items.get_mut(index)?;
        let previous = item.status;
        item.status = status;

        match (previous == ReviewStatus::Unset, status == ReviewStatus::Unset) {
            (true, false) => self.unset_count -= 1,
            (false, true) => self.unset_count += 1,
            _ => {}
        }
        Some(previous)
    }

    /// Move the cursor, clamped to `len()`
    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.items.len());
    }

    /// Move the cursor one item forward
    pub fn advance(&mut self) {
        self.set_cursor(self.cursor + 1);
    }

    pub fn first_unset(&self) -> Option<usize> {
        self.items
            .iter()
            .position(|i| i.status == ReviewStatus::Unset)
    }

    /// Put the cursor on the first UNSET item, or past the end if none
    pub fn seek_first_unset(&mut self) {
        self.cursor = self.first_unset().unwrap_or(self.items.len());
    }

    pub fn marked_for_deletion(&self) -> impl Iterator<Item = &MediaItem> {
        self.items
            .iter()
            .filter(|i| i.status == ReviewStatus::Delete)
    }

    /// Remove every DELETE-marked item and shift the cursor left by the
    /// number removed
    pub fn remove_marked_for_deletion(&mut self) -> Vec<MediaItem> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.items)
            .into_iter()
            .partition(|i| i.status == ReviewStatus::Delete);

        self.items = kept;
        for item in &removed {
            self.hashes.remove(&item.content_hash);
        }
        self.set_cursor(self.cursor.saturating_sub(removed.len()));
        removed
    }

    /// Recount UNSET items; equals `unset_count()` whenever the queue is sound
    pub fn count_unset(&self) -> usize {
        self.items
            .iter()
            .filter(|i| i.status == ReviewStatus::Unset)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::media::fixtures::item;

    fn queue(len: u64) -> ReviewQueue {
        let mut queue = ReviewQueue::new();
        for id in 0..len {
            queue.push(item(id, 100 + id));
        }
        queue
    }

    #[test]
    fn push_counts_unset_items() {
        let queue = queue(3);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.unset_count(), 3);
        assert_eq!(queue.cursor(), 0);
    }

    #[test]
    fn push_ignores_duplicate_content() {
        let mut queue = queue(2);
        let mut duplicate = item(1, 100);
        duplicate.volatile_id = 99;

        assert!(!queue.push(duplicate));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.unset_count(), 2);
    }

    #[test]
    fn set_status_tracks_unset_count() {
        let mut queue = queue(3);

        queue.set_status(0, ReviewStatus::Keep);
        queue.set_status(1, ReviewStatus::Delete);
        assert_eq!(queue.unset_count(), 1);

        queue.set_status(1, ReviewStatus::Keep);
        assert_eq!(queue.unset_count(), 1);

        queue.set_status(0, ReviewStatus::Unset);
        assert_eq!(queue.unset_count(), 2);
        assert_eq!(queue.unset_count(), queue.count_unset());
    }

    #[test]
    fn set_status_out_of_range_is_none() {
        let mut queue = queue(1);
        assert_eq!(queue.set_status(5, ReviewStatus::Keep), None);
        assert_eq!(queue.unset_count(), 1);
    }

    #[test]
    fn cursor_is_clamped_to_len() {
        let mut queue = queue(2);
        queue.advance();
        queue.advance();
        queue.advance();
        assert_eq!(queue.cursor(), 2);
        assert!(queue.current().is_none());
    }

    #[test]
    fn seek_first_unset_goes_past_end_when_all_decided() {
        let mut queue = queue(2);
        queue.set_status(0, ReviewStatus::Keep);
        queue.seek_first_unset();
        assert_eq!(queue.cursor(), 1);

        queue.set_status(1, ReviewStatus::Keep);
        queue.seek_first_unset();
        assert_eq!(queue.cursor(), 2);
    }

    #[test]
    fn removing_deletions_shifts_cursor() {
        let mut queue = queue(8);
        queue.set_status(2, ReviewStatus::Delete);
        queue.set_status(5, ReviewStatus::Delete);
        queue.set_cursor(6);

        let removed = queue.remove_marked_for_deletion();

        assert_eq!(removed.len(), 2);
        assert_eq!(queue.len(), 6);
        assert_eq!(queue.cursor(), 4);
        assert!(!queue.contains(&removed[0].content_hash));
    }

    #[test]
    fn removing_deletions_never_underflows_cursor() {
        let mut queue = queue(3);
        queue.set_status(1, ReviewStatus::Delete);
        queue.set_status(2, ReviewStatus::Delete);
        queue.set_cursor(1);

        queue.remove_marked_for_deletion();
        assert_eq!(queue.cursor(), 0);
    }
}
