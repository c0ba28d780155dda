//! # Photo Triage
//!
//! Swipe through a photo library one picture at a time, keep or discard
//! each, then batch-delete the discards after an optional review.
//!
//! ## Core Philosophy
//! - **Review once** - content already decided is never shown again, even
//!   after files are renamed, moved or rescanned
//! - **Nothing durable until confirmed** - a DELETE mark only becomes a
//!   record when the deletion is confirmed
//! - **Degrade, don't abort** - unreadable photos and failed writes are
//!   logged and skipped
//!
//! ## Architecture
//! - `core` - Reconciliation engine, review state machine, stats
//! - `events` - Event-driven progress and user notices (UI-ready)
//! - `error` - User-friendly error types
//!
//! ## Example
//! ```rust,ignore
//! use photo_triage::core::index::{DirectoryIndex, IndexConfig};
//! use photo_triage::core::store::{SqliteStatusStore, StoreWriter};
//! use photo_triage::core::{Reconciler, ReviewSession, ReviewStatus};
//!
//! let store = Arc::new(SqliteStatusStore::open(&db_path)?);
//! let index = Arc::new(DirectoryIndex::new(vec![photos], IndexConfig::default()));
//! let writer = StoreWriter::spawn(store.clone(), 4);
//! let mut session = ReviewSession::builder(Reconciler::new(index, store, writer)).build();
//!
//! session.fetch_photos()?;
//! session.swipe(ReviewStatus::Keep);
//! ```

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{Result, TriageError};

/// Initialize tracing for the library
///
/// This should be called by the application entry point. `RUST_LOG`
/// controls verbosity; calling it twice leaves the first subscriber in place.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}
