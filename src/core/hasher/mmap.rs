//! Memory-mapped file reads for hashing large photos.

use crate::error::HashError;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// Minimum file size to use memory-mapped I/O (1MB)
const MMAP_THRESHOLD: u64 = 1024 * 1024;

/// Read file bytes, memory-mapping files of 1MB and more.
pub fn read_file_bytes(path: &Path) -> Result<FileBytes, HashError> {
    let metadata = std::fs::metadata(path).map_err(|e| HashError::Open {
        item: path.display().to_string(),
        source: e,
    })?;

    if metadata.len() >= MMAP_THRESHOLD {
        read_mmap(path)
    } else {
        read_standard(path)
    }
}

fn read_mmap(path: &Path) -> Result<FileBytes, HashError> {
    let file = File::open(path).map_err(|e| HashError::Open {
        item: path.display().to_string(),
        source: e,
    })?;

    // SAFETY: read-only mapping; the file handle outlives the map.
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| HashError::Read {
        item: path.display().to_string(),
        source: e,
    })?;

    Ok(FileBytes::Mmap(mmap))
}

fn read_standard(path: &Path) -> Result<FileBytes, HashError> {
    let bytes = std::fs::read(path).map_err(|e| HashError::Read {
        item: path.display().to_string(),
        source: e,
    })?;

    Ok(FileBytes::Vec(bytes))
}

/// File bytes that may be either owned or memory-mapped.
pub enum FileBytes {
    /// Standard heap-allocated bytes
    Vec(Vec<u8>),
    /// Memory-mapped bytes
    Mmap(Mmap),
}

impl AsRef<[u8]> for FileBytes {
    fn as_ref(&self) -> &[u8] {
        match self {
            FileBytes::Vec(v) => v,
            FileBytes::Mmap(m) => m,
        }
    }
}

impl std::ops::Deref for FileBytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_ref()
    }
}
