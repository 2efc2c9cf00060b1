//! Candidate references and size-based grouping.
//!
//! # Overview
//!
//! Size grouping is the first phase of deduplication. Files with different
//! sizes can never be identical, so grouping by exact size discards most
//! candidates before any identity query or hashing happens.
//!
//! Within a group the discovery order is preserved: downstream phases pick
//! the first member of a class as its representative and the first
//! representative of a digest as the primary retained copy.
//!
//! # Example
//!
//! ```
//! use linkdupe::duplicates::{group_by_size, FileRef};
//! use std::path::PathBuf;
//!
//! let files = vec![
//!     FileRef::new(PathBuf::from("/file1.bin"), 1024),
//!     FileRef::new(PathBuf::from("/file2.bin"), 1024),
//!     FileRef::new(PathBuf::from("/file3.bin"), 2048),
//! ];
//!
//! let (groups, stats) = group_by_size(files);
//!
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(stats.potential_duplicates, 2);
//! assert_eq!(groups.len(), 1);
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::platform::FileIdentity;
use crate::scanner::FileEntry;

/// A candidate file flowing through the deduplication pipeline.
///
/// `identity` is filled in by identity grouping. It stays `None` until then,
/// and files whose identity query fails never leave that phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRef {
    /// Storage-object identity, once known
    pub identity: Option<FileIdentity>,
    /// Path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileRef {
    /// Create a reference with unknown identity.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self {
            identity: None,
            path,
            size,
        }
    }

    /// Whether both references are known to denote the same storage object.
    ///
    /// Unknown identities never compare equal.
    #[must_use]
    pub fn same_object(&self, other: &FileRef) -> bool {
        matches!((self.identity, other.identity), (Some(a), Some(b)) if a == b)
    }
}

impl From<FileEntry> for FileRef {
    fn from(entry: FileEntry) -> Self {
        Self::new(entry.path, entry.size)
    }
}

/// A group of files with the same size.
#[derive(Debug, Clone)]
pub struct SizeGroup {
    /// File size in bytes (shared by all files in this group)
    pub size: u64,
    /// Files with this exact size, in discovery order
    pub files: Vec<FileRef>,
}

impl SizeGroup {
    /// Create a new, empty size group.
    #[must_use]
    pub fn new(size: u64) -> Self {
        Self {
            size,
            files: Vec::new(),
        }
    }

    /// Add a file to this group.
    ///
    /// # Panics
    ///
    /// Debug assertion fails if file size doesn't match group size.
    pub fn add(&mut self, file: FileRef) {
        debug_assert_eq!(
            file.size, self.size,
            "File size {} doesn't match group size {}",
            file.size, self.size
        );
        self.files.push(file);
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Check if this group has potential duplicates (2+ files).
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.files.len() > 1
    }
}

/// Statistics from size grouping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Number of files fed into grouping
    pub total_files: usize,
    /// Total bytes of all files fed into grouping
    pub total_size: u64,
    /// Files dropped because their size was unique
    pub eliminated_unique: usize,
    /// Files left in groups of two or more
    pub potential_duplicates: usize,
    /// Number of groups kept
    pub size_groups: usize,
}

/// Group files by exact size, dropping sizes seen only once.
///
/// Groups are returned in ascending size order; members keep the order in
/// which they were supplied.
pub fn group_by_size<I>(files: I) -> (Vec<SizeGroup>, GroupingStats)
where
    I: IntoIterator<Item = FileRef>,
{
    let mut stats = GroupingStats::default();
    let mut by_size: HashMap<u64, SizeGroup> = HashMap::new();

    for file in files {
        stats.total_files += 1;
        stats.total_size += file.size;
        by_size
            .entry(file.size)
            .or_insert_with(|| SizeGroup::new(file.size))
            .add(file);
    }

    let mut groups: Vec<SizeGroup> = by_size
        .into_values()
        .filter(|group| {
            if group.has_duplicates() {
                true
            } else {
                stats.eliminated_unique += group.len();
                false
            }
        })
        .collect();
    groups.sort_unstable_by_key(|g| g.size);

    stats.size_groups = groups.len();
    stats.potential_duplicates = groups.iter().map(SizeGroup::len).sum();

    log::debug!(
        "Size grouping: {} files, {} unique sizes eliminated, {} potential duplicates in {} groups",
        stats.total_files,
        stats.eliminated_unique,
        stats.potential_duplicates,
        stats.size_groups
    );

    (groups, stats)
}
