//! Media index over photo folders, using walkdir.

use super::{filter::ImageFilter, Candidate, CandidateIter, IndexOrder, MediaIndex};
use crate::core::hasher::ContentHasher;
use crate::core::media::{ContentHash, ItemRef, VolatileId};
use crate::core::metadata::extract_metadata;
use crate::error::{HashError, IndexError};
use rand::seq::SliceRandom;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::{debug, warn};
use walkdir::WalkDir;
use xxhash_rust::xxh3::Xxh3;

/// Configuration for the directory index
#[derive(Debug, Clone, Default)]
pub struct IndexConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Maximum directory depth (None = unlimited)
    pub max_depth: Option<usize>,
    /// Custom extensions to include (None = use defaults)
    pub extensions: Option<Vec<String>>,
}

/// Lists the photos under one or more library roots.
///
/// The volatile id is derived from the file's absolute path, length and
/// modification time. Moving, renaming or rewriting a file gives it a new
/// id; only the content hash says whether it was seen before.
///
/// Listing reads filesystem metadata only. EXIF and pixel dimensions are
/// loaded by [`MediaIndex::enrich`].
pub struct DirectoryIndex {
    roots: Vec<PathBuf>,
    config: IndexConfig,
    filter: ImageFilter,
}

impl DirectoryIndex {
    pub fn new(roots: Vec<PathBuf>, config: IndexConfig) -> Self {
        let mut filter = ImageFilter::new().with_hidden(config.include_hidden);

        if let Some(ref extensions) = config.extensions {
            filter = filter.with_extensions(extensions.clone());
        }

        Self {
            roots,
            config,
            filter,
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn walk_root(&self, root: &Path) -> Result<Vec<PathBuf>, IndexError> {
        if !root.is_dir() {
            return Err(IndexError::RootNotFound {
                path: root.to_path_buf(),
            });
        }

        let root = root.canonicalize().map_err(|e| IndexError::ReadDirectory {
            path: root.to_path_buf(),
            source: e,
        })?;

        let mut walker = WalkDir::new(&root).follow_links(self.config.follow_symlinks);
        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        let include_hidden = self.filter.includes_hidden();
        let entries = walker.into_iter().filter_entry(|entry| {
            include_hidden || entry.depth() == 0 || !super::filter::is_hidden(entry.path())
        });

        let mut paths = Vec::new();
        for entry in entries {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && self.filter.should_include(entry.path()) {
                        paths.push(entry.into_path());
                    }
                }
                Err(e) => {
                    let path = e.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    warn!("Skipping unreadable entry {}: {}", path.display(), e);
                }
            }
        }

        Ok(paths)
    }
}

impl MediaIndex for DirectoryIndex {
    fn candidates(&self, order: IndexOrder) -> Result<CandidateIter, IndexError> {
        let mut paths = Vec::new();
        for root in &self.roots {
            paths.extend(self.walk_root(root)?);
        }

        match order {
            IndexOrder::Random => paths.shuffle(&mut rand::thread_rng()),
            IndexOrder::Natural => paths.sort(),
        }

        debug!("Directory index listed {} photos", paths.len());
        Ok(Box::new(paths.into_iter().filter_map(|path| describe(&path))))
    }

    fn enrich(&self, candidate: &mut Candidate) {
        let path = candidate.item_ref.as_path();
        let exif = extract_metadata(path);
        candidate.resolution = exif.dimensions_display().or_else(|| {
            image::image_dimensions(path)
                .ok()
                .map(|(w, h)| format!("{}x{}", w, h))
        });
        candidate.date_taken = exif.date_taken;
        candidate.description = exif.description;
        candidate.location = exif.location;
    }

    fn open(&self, candidate: &Candidate) -> Result<Box<dyn Read + Send>, HashError> {
        let path = candidate.item_ref.as_path();
        let file = File::open(path).map_err(|e| HashError::Open {
            item: path.display().to_string(),
            source: e,
        })?;
        Ok(Box::new(file))
    }

    fn content_hash(
        &self,
        candidate: &Candidate,
        hasher: &dyn ContentHasher,
    ) -> Result<ContentHash, HashError> {
        hasher.hash_path(candidate.item_ref.as_path())
    }
}

/// Volatile id for a file: a hash of its path, length and modification time
pub fn volatile_id_for(path: &Path, meta: &fs::Metadata) -> VolatileId {
    let mut hasher = Xxh3::new();
    hasher.update(path.to_string_lossy().as_bytes());
    hasher.update(&meta.len().to_le_bytes());
    hasher.update(&modified_nanos(meta).to_le_bytes());
    hasher.digest()
}

fn modified_nanos(meta: &fs::Metadata) -> u128 {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_nanos())
        .unwrap_or(0)
}

/// Cheap candidate for a file, or `None` if it vanished since the walk
fn describe(path: &Path) -> Option<Candidate> {
    let file_meta = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) => {
            warn!("Skipping {}: {}", path.display(), e);
            return None;
        }
    };

    Some(Candidate {
        volatile_id: volatile_id_for(path, &file_meta),
        item_ref: ItemRef::new(path),
        date_taken: None,
        date_added: (modified_nanos(&file_meta) / 1_000_000) as i64,
        size_bytes: file_meta.len(),
        album: path
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned()),
        description: None,
        display_name: path.file_name().map(|n| n.to_string_lossy().into_owned()),
        resolution: None,
        location: None,
    })
}
