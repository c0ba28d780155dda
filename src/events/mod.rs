//! # Events Module
//!
//! Event-driven reporting for reconciliation progress and user notices.
//!
//! ## Design
//! The engine emits events through channels, allowing any UI
//! (CLI, GUI, web) to subscribe. User-visible notices such as
//! "Nothing to undo!" travel here rather than through the log.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//! let session = ReviewSession::builder(reconciler).events(sender).build();
//!
//! for notice in receiver.notices() {
//!     println!("{}", notice);
//! }
//! ```

mod channel;
mod types;

pub use channel::{EventChannel, EventReceiver, EventSender, null_sender};
pub use types::*;
