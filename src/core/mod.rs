//! # Core Module
//!
//! The UI-agnostic triage engine.
//!
//! ## Modules
//! - `media` - Shared data model (items, statuses, content hashes)
//! - `hasher` - Content identity hashing
//! - `metadata` - Extracts EXIF metadata from photos
//! - `index` - Lists candidate photos
//! - `store` - Durable per-item review status
//! - `reconcile` - Decides which candidates need review
//! - `review` - Review queue and keep/delete/undo workflow
//! - `stats` - Space saved over a time window
//! - `config` - Session settings

pub mod config;
pub mod hasher;
pub mod index;
pub mod media;
pub mod metadata;
pub mod reconcile;
pub mod review;
pub mod stats;
pub mod store;

// Re-export commonly used types
pub use config::TriageConfig;
pub use media::{ContentHash, ItemRef, MediaItem, ReviewStatus};
pub use reconcile::Reconciler;
pub use review::{ReviewSession, ReviewState};
pub use stats::TimeWindow;
