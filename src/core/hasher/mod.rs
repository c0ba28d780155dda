//! # Hasher Module
//!
//! Computes the content identity used as the durable dedup key.
//!
//! The platform identifier of an item can change between sessions; its
//! bytes do not. Every status record is therefore keyed by a hash of the
//! full content, so an item is reviewed at most once no matter how often
//! its identifier is reassigned.
//!
//! ## Algorithm
//! xxh3-128 over the whole byte stream, hex encoded (32 characters).
//! Files of 1 MiB and more are memory-mapped; smaller ones are read
//! directly.
//!
//! ## Example
//! ```rust,ignore
//! use photo_triage::core::hasher::{ContentHasher, Xxh3ContentHasher};
//!
//! let hash = Xxh3ContentHasher.hash_path(&path)?;
//! ```

mod mmap;
mod traits;

pub use mmap::{read_file_bytes, FileBytes};
pub use traits::{ContentHasher, Xxh3ContentHasher};

/// Number of hex characters in a content hash
pub const CONTENT_HASH_LEN: usize = 32;
