//! User preferences that outlive a session.

use crate::error::PreferenceError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use tracing::debug;

/// Persisted key-value preferences
pub trait PreferenceStore: Send + Sync {
    /// Whether deletions go through the review dialog (default true)
    fn review_dialog_enabled(&self) -> bool;

    fn set_review_dialog_enabled(&self, enabled: bool) -> Result<(), PreferenceError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Preferences {
    #[serde(default = "enabled_by_default")]
    review_dialog_enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            review_dialog_enabled: true,
        }
    }
}

/// Preferences kept in a JSON file; a missing file means defaults
#[derive(Debug)]
pub struct JsonPreferenceStore {
    path: PathBuf,
    prefs: RwLock<Preferences>,
}

impl JsonPreferenceStore {
    pub fn open(path: &Path) -> Result<Self, PreferenceError> {
        let prefs = match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| PreferenceError::Malformed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No preferences at {}, using defaults", path.display());
                Preferences::default()
            }
            Err(e) => {
                return Err(PreferenceError::Read {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            prefs: RwLock::new(prefs),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, prefs: &Preferences) -> Result<(), PreferenceError> {
        let write_err = |source| PreferenceError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(prefs).map_err(|e| PreferenceError::Malformed {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        fs::write(&self.path, json).map_err(write_err)
    }
}

impl PreferenceStore for JsonPreferenceStore {
    fn review_dialog_enabled(&self) -> bool {
        self.prefs
            .read()
            .map(|p| p.review_dialog_enabled)
            .unwrap_or(true)
    }

    fn set_review_dialog_enabled(&self, enabled: bool) -> Result<(), PreferenceError> {
        let updated = match self.prefs.write() {
            Ok(mut prefs) => {
                prefs.review_dialog_enabled = enabled;
                prefs.clone()
            }
            Err(poisoned) => {
                let mut prefs = poisoned.into_inner();
                prefs.review_dialog_enabled = enabled;
                prefs.clone()
            }
        };
        self.save(&updated)
    }
}

/// Preferences that last as long as the process
#[derive(Debug)]
pub struct InMemoryPreferenceStore {
    review_dialog_enabled: AtomicBool,
}

impl InMemoryPreferenceStore {
    pub fn new(review_dialog_enabled: bool) -> Self {
        Self {
            review_dialog_enabled: AtomicBool::new(review_dialog_enabled),
        }
    }
}

impl Default for InMemoryPreferenceStore {
    fn default() -> Self {
        Self::new(true)
    }
}

impl PreferenceStore for InMemoryPreferenceStore {
    fn review_dialog_enabled(&self) -> bool {
        self.review_dialog_enabled.load(Ordering::SeqCst)
    }

    fn set_review_dialog_enabled(&self, enabled: bool) -> Result<(), PreferenceError> {
        self.review_dialog_enabled.store(enabled, Ordering::SeqCst);
        Ok(())
    }
}
