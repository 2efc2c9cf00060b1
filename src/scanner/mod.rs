//! Scanner module for directory traversal, backup recovery and hashing.
//!
//! This module provides functionality for:
//! - Parallel directory walking using jwalk
//! - Restoring backups left behind by an interrupted link swap
//! - Content fingerprints with BLAKE3
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and candidate discovery
//! - [`recovery`]: The on-disk backup suffix protocol
//! - [`hasher`]: BLAKE3 file fingerprints
//!
//! # Example
//!
//! ```no_run
//! use linkdupe::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig { min_size: 1024 };
//! let walker = Walker::new(Path::new("."), config);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod hasher;
pub mod recovery;
pub mod walker;

use std::path::PathBuf;

pub use hasher::{hash_to_hex, Fingerprinter, Hash, Hasher};
pub use recovery::{backup_path_for, is_backup_path, original_path_for, BACKUP_SUFFIX};
pub use walker::Walker;

/// A regular file discovered during traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileEntry {
    /// Create a new FileEntry.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { path, size }
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Minimum file size to include (in bytes).
    /// Files smaller than this are skipped.
    pub min_size: u64,
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A leftover backup could not be renamed back to its original path.
    #[error("cannot restore backup {backup} to {original}: {source}")]
    Recovery {
        /// Path of the backup file
        backup: PathBuf,
        /// Path the backup belongs to
        original: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::PermissionDenied(p) | Self::NotFound(p) | Self::Io { path: p, .. } => p,
            Self::Recovery { backup, .. } => backup,
        }
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Hashing stopped because shutdown was requested.
    #[error("Hashing interrupted: {0}")]
    Interrupted(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Classify an I/O error raised while hashing `path`.
    #[must_use]
    pub fn from_io(path: &std::path::Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}
