//! # Error Module
//!
//! Error types for the photo triage engine.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, hashes, ids, what went wrong
//! - **Degrade, don't abort** - per-item failures are logged and the item is
//!   skipped; only construction-time failures reach the caller
//! - **Recovery hints** - suggest how to fix when possible

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Media index error: {0}")]
    Index(#[from] IndexError),

    #[error("Hashing error: {0}")]
    Hash(#[from] HashError),

    #[error("Status store error: {0}")]
    Store(#[from] StoreError),

    #[error("Deletion error: {0}")]
    Deletion(#[from] DeletionError),

    #[error("Preference error: {0}")]
    Preference(#[from] PreferenceError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors raised by a media index while listing candidates
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Library root not found: {path}")]
    RootNotFound { path: PathBuf },

    #[error("Failed to read library directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Media index is unavailable: {0}")]
    Unavailable(String),
}

/// Errors that occur while reading or hashing a single item
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Failed to open {item}: {source}")]
    Open {
        item: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {item}: {source}")]
    Read {
        item: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Item {item} has no readable content")]
    Unreadable { item: String },
}

/// Errors raised by a status store backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open status database at {path}: {reason}")]
    OpenFailed { path: PathBuf, reason: String },

    #[error("Status query failed: {0}")]
    QueryFailed(String),

    #[error("Status write failed for {content_hash}: {reason}")]
    WriteFailed { content_hash: String, reason: String },

    #[error("Status database at {path} is unusable (lock poisoned). Restart the application.")]
    Poisoned { path: PathBuf },

    #[error("Unknown review status {0:?} in status database")]
    UnknownStatus(String),
}

/// Errors raised while physically deleting an item
#[derive(Error, Debug)]
pub enum DeletionError {
    #[error("{item} no longer exists")]
    Missing { item: String },

    #[error("Failed to move {item} to trash: {reason}")]
    Trash { item: String, reason: String },

    #[error("Deletion of {item} was refused")]
    Refused { item: String },
}

/// Errors raised by the preference store
#[derive(Error, Debug)]
pub enum PreferenceError {
    #[error("Failed to read preferences at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write preferences at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Preferences at {path} are malformed ({reason}). Delete this file to reset them.")]
    Malformed { path: PathBuf, reason: String },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, TriageError>;
