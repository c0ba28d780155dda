//! # Review Module
//!
//! The in-memory review queue and the state machine built on it.
//!
//! ## States
//! - `Browsing` - deciding UNSET items one at a time
//! - `PendingReview` - the delete-confirmation dialog is open
//!
//! There is no terminal state; a session lives as long as the app.
//!
//! ## Collaborators
//! - [`Deleter`] - physical deletion (platform trash by default)
//! - [`PreferenceStore`] - remembers whether the dialog is wanted

mod deleter;
mod preferences;
mod queue;
mod session;

pub use deleter::{DeletionOutcome, Deleter, RecordingDeleter, TrashDeleter};
pub use preferences::{InMemoryPreferenceStore, JsonPreferenceStore, PreferenceStore};
pub use queue::ReviewQueue;
pub use session::{ReviewSession, ReviewSessionBuilder, ReviewState, SessionSnapshot};
