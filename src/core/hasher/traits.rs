//! Content hasher trait and the xxh3 implementation.

use super::mmap::read_file_bytes;
use crate::core::media::ContentHash;
use crate::error::HashError;
use std::io::Read;
use std::path::Path;
use xxhash_rust::xxh3::{xxh3_128, Xxh3};

const READ_CHUNK: usize = 64 * 1024;

/// Computes a stable hash from an item's bytes
pub trait ContentHasher: Send + Sync {
    /// Hash a byte stream, reading it to the end.
    ///
    /// `item` names the source in error messages.
    fn hash_reader(&self, item: &str, reader: &mut dyn Read) -> Result<ContentHash, HashError>;

    /// Hash a file on disk.
    fn hash_path(&self, path: &Path) -> Result<ContentHash, HashError> {
        let mut file = std::fs::File::open(path).map_err(|e| HashError::Open {
            item: path.display().to_string(),
            source: e,
        })?;
        self.hash_reader(&path.display().to_string(), &mut file)
    }
}

/// xxh3-128 content hasher
#[derive(Debug, Clone, Copy, Default)]
pub struct Xxh3ContentHasher;

impl ContentHasher for Xxh3ContentHasher {
    fn hash_reader(&self, item: &str, reader: &mut dyn Read) -> Result<ContentHash, HashError> {
        let mut hasher = Xxh3::new();
        let mut buffer = vec![0u8; READ_CHUNK];

        loop {
            let read = reader.read(&mut buffer).map_err(|e| HashError::Read {
                item: item.to_string(),
                source: e,
            })?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }

        Ok(ContentHash::from_digest(&hasher.digest128().to_be_bytes()))
    }

    fn hash_path(&self, path: &Path) -> Result<ContentHash, HashError> {
        let bytes = read_file_bytes(path)?;
        Ok(ContentHash::from_digest(&xxh3_128(&bytes).to_be_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hasher::CONTENT_HASH_LEN;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "device gone"))
        }
    }

    #[test]
    fn same_bytes_same_hash() {
        let hasher = Xxh3ContentHasher;
        let a = hasher.hash_reader("a", &mut Cursor::new(b"sunset".to_vec())).unwrap();
        let b = hasher.hash_reader("b", &mut Cursor::new(b"sunset".to_vec())).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_bytes_different_hash() {
        let hasher = Xxh3ContentHasher;
        let a = hasher.hash_reader("a", &mut Cursor::new(b"sunset".to_vec())).unwrap();
        let b = hasher.hash_reader("b", &mut Cursor::new(b"sunrise".to_vec())).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn hash_has_fixed_length() {
        let hash = Xxh3ContentHasher
            .hash_reader("empty", &mut Cursor::new(Vec::new()))
            .unwrap();
        assert_eq!(hash.as_str().len(), CONTENT_HASH_LEN);
    }

    #[test]
    fn streaming_and_file_hash_agree() {
        let content = vec![42u8; 200_000];
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&content).unwrap();
        file.flush().unwrap();

        let hasher = Xxh3ContentHasher;
        let from_file = hasher.hash_path(file.path()).unwrap();
        let from_stream = hasher.hash_reader("stream", &mut Cursor::new(content)).unwrap();

        assert_eq!(from_file, from_stream);
    }

    #[test]
    fn read_failure_is_reported() {
        let result = Xxh3ContentHasher.hash_reader("broken", &mut FailingReader);
        match result {
            Err(HashError::Read { item, .. }) => assert_eq!(item, "broken"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
