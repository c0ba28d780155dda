//! # Stats Module
//!
//! Space saved by confirmed deletions over a rolling time window.
//!
//! The aggregate is a pure read over the status store: the sum of
//! `size_bytes` for every DELETE record modified within
//! `[now - window, now]`.

use crate::core::media::{now_millis, ReviewStatus};
use crate::core::store::StatusStore;
use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Rolling window for space-saved statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeWindow {
    Day,
    #[default]
    Week,
    Month,
    Year,
}

impl TimeWindow {
    /// Every window, in cycling order
    pub const ALL: [TimeWindow; 4] = [Self::Day, Self::Week, Self::Month, Self::Year];

    /// The window after this one, wrapping from YEAR back to DAY
    pub fn next(self) -> Self {
        match self {
            Self::Day => Self::Week,
            Self::Week => Self::Month,
            Self::Month => Self::Year,
            Self::Year => Self::Day,
        }
    }

    /// Window length in milliseconds (month and year are mean Gregorian lengths)
    pub fn duration_millis(self) -> i64 {
        match self {
            Self::Day => 86_400_000,
            Self::Week => 604_800_000,
            Self::Month => 2_629_746_000,
            Self::Year => 31_556_952_000,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "year" => Some(Self::Year),
            _ => None,
        }
    }

    /// Label shown next to the total, e.g. "this week"
    pub fn label(&self) -> &'static str {
        match self {
            Self::Day => "today",
            Self::Week => "this week",
            Self::Month => "this month",
            Self::Year => "this year",
        }
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Computes space-saved totals from the status store
#[derive(Clone)]
pub struct StatsAggregator {
    store: Arc<dyn StatusStore>,
}

impl StatsAggregator {
    pub fn new(store: Arc<dyn StatusStore>) -> Self {
        Self { store }
    }

    /// Bytes freed by deletions within `window` of now
    pub fn space_saved(&self, window: TimeWindow) -> Result<u64, StoreError> {
        self.space_saved_at(window, now_millis())
    }

    /// Bytes freed by deletions within `window` of `now` (Unix millis)
    pub fn space_saved_at(&self, window: TimeWindow, now: i64) -> Result<u64, StoreError> {
        let from = now.saturating_sub(window.duration_millis());
        let sizes = self.store.sizes_between(ReviewStatus::Delete, from, now)?;
        Ok(sizes.iter().sum())
    }
}

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::fixtures::record;
    use crate::core::store::InMemoryStatusStore;

    const NOW: i64 = 1_700_000_000_000;
    const HOUR: i64 = 3_600_000;

    fn aggregator(records: Vec<crate::core::store::StatusRecord>) -> StatsAggregator {
        StatsAggregator::new(Arc::new(InMemoryStatusStore::with_records(records)))
    }

    #[test]
    fn cycling_four_times_returns_to_start() {
        let mut window = TimeWindow::Day;
        let mut visited = Vec::new();
        for _ in 0..4 {
            window = window.next();
            visited.push(window);
        }

        assert_eq!(
            visited,
            vec![TimeWindow::Week, TimeWindow::Month, TimeWindow::Year, TimeWindow::Day]
        );
    }

    #[test]
    fn durations_grow_with_each_window() {
        let durations: Vec<_> = TimeWindow::ALL.iter().map(|w| w.duration_millis()).collect();
        assert!(durations.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn empty_store_saves_nothing() {
        let stats = aggregator(vec![]);
        assert_eq!(stats.space_saved_at(TimeWindow::Year, NOW).unwrap(), 0);
    }

    #[test]
    fn only_deleted_records_in_window_count() {
        let stats = aggregator(vec![
            record("a", 1, ReviewStatus::Delete, 100, NOW - HOUR),
            record("b", 2, ReviewStatus::Delete, 200, NOW - 2 * 86_400_000),
            record("c", 3, ReviewStatus::Keep, 400, NOW - HOUR),
            record("d", 4, ReviewStatus::Unset, 800, NOW - HOUR),
        ]);

        assert_eq!(stats.space_saved_at(TimeWindow::Day, NOW).unwrap(), 100);
        assert_eq!(stats.space_saved_at(TimeWindow::Week, NOW).unwrap(), 300);
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let stats = aggregator(vec![
            record("edge", 1, ReviewStatus::Delete, 10, NOW - TimeWindow::Day.duration_millis()),
            record("now", 2, ReviewStatus::Delete, 5, NOW),
            record("future", 3, ReviewStatus::Delete, 1, NOW + 1),
        ]);

        assert_eq!(stats.space_saved_at(TimeWindow::Day, NOW).unwrap(), 15);
    }

    #[test]
    fn window_parses_case_insensitively() {
        assert_eq!(TimeWindow::from_str("MONTH"), Some(TimeWindow::Month));
        assert_eq!(TimeWindow::from_str("decade"), None);
    }

    #[test]
    fn format_bytes_handles_all_sizes() {
        assert_eq!(format_bytes(500), "500 B");
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(1024 * 1024), "1.0 MB");
        assert_eq!(format_bytes(5_000_000), "4.8 MB");
        assert_eq!(format_bytes(1024 * 1024 * 1024), "1.0 GB");
    }
}
