//! Directory walker implementation using jwalk for parallel traversal.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing a directory
//! tree and producing deduplication candidates. It uses [`jwalk`] for
//! parallel directory reading, with children sorted by name so the order in
//! which candidates are produced, and therefore which copy ends up as the
//! retained "main", is reproducible across runs.
//!
//! # Features
//!
//! - Regular files only; symlinks, directories and special files are skipped
//! - Minimum size filter; a minimum of 0 admits empty files
//! - Leftover swap backups are restored before the file is yielded
//! - Each path is yielded at most once
//! - Graceful shutdown via atomic flag
//!
//! # Example
//!
//! ```no_run
//! use linkdupe::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/srv/media"), WalkerConfig { min_size: 4096 });
//! let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
//! println!("{} candidates", files.len());
//! ```

use std::collections::HashSet;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use jwalk::WalkDir;

use super::recovery::{is_backup_path, restore_backup};
use super::{FileEntry, ScanError, WalkerConfig};

/// Directory walker for parallel candidate discovery.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given path.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops yielding entries.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Walk the directory tree and yield candidate files.
    ///
    /// The iterator is lazy and can only be consumed once. Errors for
    /// individual paths are yielded and iteration continues.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry, ScanError>> + '_ {
        let mut seen: HashSet<PathBuf> = HashSet::new();

        let walk_dir = WalkDir::new(&self.root)
            .follow_links(false)
            .skip_hidden(false)
            .process_read_dir(|_depth, _path, _read_dir_state, children| {
                // Sort children for deterministic output
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });
            });

        walk_dir
            .into_iter()
            .take_while(move |_| {
                if self.is_shutdown_requested() {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                    return false;
                }
                true
            })
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => {
                    if !entry.file_type().is_file() {
                        return None;
                    }
                    self.process_file(entry.path(), &mut seen)
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), std::borrow::ToOwned::to_owned);
                    Some(Err(ScanError::Io {
                        path,
                        source: std::io::Error::other(e.to_string()),
                    }))
                }
            })
    }

    /// Turn a regular file into a candidate, restoring it first if it is a
    /// leftover backup.
    fn process_file(
        &self,
        mut path: PathBuf,
        seen: &mut HashSet<PathBuf>,
    ) -> Option<Result<FileEntry, ScanError>> {
        if is_backup_path(&path) {
            path = match restore_backup(&path) {
                Ok(original) => original,
                Err(e) => return Some(Err(e)),
            };
        }

        // The restored original may also be listed on its own
        if !seen.insert(path.clone()) {
            log::trace!("Already yielded: {}", path.display());
            return None;
        }

        let metadata = match std::fs::symlink_metadata(&path) {
            Ok(m) => m,
            Err(e) => return Some(Err(self.handle_io_error(&path, e))),
        };

        self.filter_entry(path, &metadata).map(Ok)
    }

    fn filter_entry(&self, path: PathBuf, metadata: &Metadata) -> Option<FileEntry> {
        if !metadata.is_file() {
            return None;
        }

        let size = metadata.len();
        if size < self.config.min_size {
            log::trace!(
                "Skipping file below minimum size ({}): {}",
                size,
                path.display()
            );
            return None;
        }

        Some(FileEntry::new(path, size))
    }

    /// Handle I/O errors during file access.
    fn handle_io_error(&self, path: &Path, error: std::io::Error) -> ScanError {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::PermissionDenied => ScanError::PermissionDenied(path.to_path_buf()),
            ErrorKind::NotFound => ScanError::NotFound(path.to_path_buf()),
            _ => ScanError::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}
