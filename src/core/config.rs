//! Session configuration.

use crate::core::stats::TimeWindow;
use crate::error::{Result, TriageError};
use std::path::PathBuf;

const APP_DIR: &str = "photo-triage";

/// Settings for a triage session
#[derive(Debug, Clone)]
pub struct TriageConfig {
    /// Items requested per reconciliation pass
    pub batch_size: usize,
    /// Items loaded synchronously before the rest of a pass goes to the background
    pub eager_count: usize,
    /// Randomise the candidate order
    pub shuffle: bool,
    /// Status database location
    pub store_path: PathBuf,
    /// Preference file location
    pub preferences_path: PathBuf,
    /// Parallel persistence lanes
    pub writer_shards: usize,
    /// Candidates hashed in parallel ahead of the reviewer
    pub lookahead: usize,
    /// Initial stats window
    pub stats_window: TimeWindow,
    /// Walk hidden files and folders
    pub include_hidden: bool,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            batch_size: 30,
            eager_count: 2,
            shuffle: true,
            store_path: default_store_path(),
            preferences_path: default_preferences_path(),
            writer_shards: 4,
            lookahead: rayon::current_num_threads(),
            stats_window: TimeWindow::default(),
            include_hidden: false,
        }
    }
}

impl TriageConfig {
    pub fn builder() -> TriageConfigBuilder {
        TriageConfigBuilder::default()
    }
}

/// `<data dir>/photo-triage/status.db`
pub fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("status.db")
}

/// `<config dir>/photo-triage/preferences.json`
pub fn default_preferences_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("preferences.json")
}

/// Builder for [`TriageConfig`]
#[derive(Debug, Clone, Default)]
pub struct TriageConfigBuilder {
    config: TriageConfig,
}

impl TriageConfigBuilder {
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    pub fn eager_count(mut self, eager_count: usize) -> Self {
        self.config.eager_count = eager_count;
        self
    }

    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.config.shuffle = shuffle;
        self
    }

    pub fn store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.store_path = path.into();
        self
    }

    pub fn preferences_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.preferences_path = path.into();
        self
    }

    pub fn writer_shards(mut self, shards: usize) -> Self {
        self.config.writer_shards = shards;
        self
    }

    pub fn lookahead(mut self, lookahead: usize) -> Self {
        self.config.lookahead = lookahead;
        self
    }

    pub fn stats_window(mut self, window: TimeWindow) -> Self {
        self.config.stats_window = window;
        self
    }

    pub fn include_hidden(mut self, include: bool) -> Self {
        self.config.include_hidden = include;
        self
    }

    /// Validate and build
    pub fn build(self) -> Result<TriageConfig> {
        let config = self.config;

        if config.batch_size == 0 {
            return Err(TriageError::Config("batch size must be at least 1".to_string()));
        }
        if config.eager_count > config.batch_size {
            return Err(TriageError::Config(format!(
                "eager count ({}) cannot exceed batch size ({})",
                config.eager_count, config.batch_size
            )));
        }
        if config.writer_shards == 0 {
            return Err(TriageError::Config("writer shards must be at least 1".to_string()));
        }
        if config.lookahead == 0 {
            return Err(TriageError::Config("lookahead must be at least 1".to_string()));
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = TriageConfig::builder().build().unwrap();
        assert_eq!(config.batch_size, 30);
        assert_eq!(config.eager_count, 2);
        assert_eq!(config.writer_shards, 4);
        assert_eq!(config.stats_window, TimeWindow::Week);
        assert!(config.shuffle);
    }

    #[test]
    fn default_paths_live_under_app_dir() {
        let config = TriageConfig::default();
        assert!(config.store_path.ends_with("photo-triage/status.db"));
        assert!(config.preferences_path.ends_with("photo-triage/preferences.json"));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let result = TriageConfig::builder().batch_size(0).eager_count(0).build();
        assert!(matches!(result, Err(TriageError::Config(_))));
    }

    #[test]
    fn eager_count_cannot_exceed_batch() {
        let result = TriageConfig::builder().batch_size(5).eager_count(6).build();
        assert!(matches!(result, Err(TriageError::Config(_))));
    }

    #[test]
    fn zero_writer_shards_is_rejected() {
        let result = TriageConfig::builder().writer_shards(0).build();
        assert!(result.is_err());
    }
}
