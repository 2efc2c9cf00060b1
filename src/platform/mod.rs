//! Platform capabilities needed for hard-link deduplication.
//!
//! # Overview
//!
//! Deduplication needs two things from the operating system:
//!
//! - the identity of the storage object behind a path, as a
//!   (volume id, object id) pair, so already-linked files are never linked
//!   to each other and links are never attempted across volumes
//! - creation of a hard link at a destination path
//!
//! Both are reached through the [`Platform`] trait so the engine can be
//! exercised against fakes. [`NativePlatform`] is the real implementation.
//!
//! # Platform Support
//!
//! - **Unix**: `(st_dev, st_ino)` from file metadata
//! - **Windows**: `(dwVolumeSerialNumber, nFileIndexHigh:nFileIndexLow)` from
//!   `GetFileInformationByHandle`
//! - **Other**: [`NativePlatform::detect`] fails with
//!   [`PlatformError::Unsupported`]
//!
//! # Example
//!
//! ```no_run
//! use linkdupe::platform::{NativePlatform, Platform};
//! use std::path::Path;
//!
//! let platform = NativePlatform::detect().expect("hard links unsupported");
//! let a = platform.identity_of(Path::new("a.bin")).unwrap();
//! let b = platform.identity_of(Path::new("b.bin")).unwrap();
//! if a == b {
//!     println!("already the same file");
//! }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

#[cfg(unix)]
mod unix;
#[cfg(unix)]
use unix as sys;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
use windows as sys;

/// Identity of the storage object a path refers to.
///
/// Two paths with equal identities are hard links to the same data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FileIdentity {
    /// Filesystem / volume the object lives on
    pub volume: u64,
    /// Object id, unique within the volume (inode or file index)
    pub object: u64,
}

impl FileIdentity {
    /// Create an identity from its parts.
    #[must_use]
    pub const fn new(volume: u64, object: u64) -> Self {
        Self { volume, object }
    }
}

/// Errors raised by platform primitives.
#[derive(thiserror::Error, Debug)]
pub enum PlatformError {
    /// The running platform cannot report identities or create hard links.
    #[error("hard-link deduplication is not supported on this platform")]
    Unsupported,

    /// The identity of a path could not be determined.
    #[error("cannot query identity of {path}: {source}")]
    Identity {
        /// Path that was queried
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Source and destination already denote the same storage object.
    #[error("{destination} is already a hard link to {target}")]
    SameFile {
        /// Existing file the link would point at
        target: PathBuf,
        /// Path where the link would be created
        destination: PathBuf,
    },

    /// Creating the hard link failed.
    #[error("cannot link {destination} to {target}: {source}")]
    Link {
        /// Existing file the link would point at
        target: PathBuf,
        /// Path where the link would be created
        destination: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// OS primitives used by the deduplication engine.
///
/// Implementations must be usable from several threads; identity queries run
/// while representatives are hashed in parallel.
pub trait Platform: Send + Sync {
    /// Query the (volume, object) identity of `path` without following
    /// symbolic links.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Identity`] if the path cannot be inspected.
    fn identity_of(&self, path: &Path) -> Result<FileIdentity, PlatformError>;

    /// Create a hard link at `destination` referring to `target`'s object.
    ///
    /// # Errors
    ///
    /// Fails, rather than silently succeeding, when `destination` exists and
    /// already denotes `target`'s storage object ([`PlatformError::SameFile`]),
    /// and whenever the OS refuses the link.
    fn create_hard_link(&self, target: &Path, destination: &Path) -> Result<(), PlatformError>;

    /// Remove a directory entry.
    ///
    /// # Errors
    ///
    /// Propagates the I/O error from the filesystem.
    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    /// Move a directory entry, replacing `to` if it exists.
    ///
    /// # Errors
    ///
    /// Propagates the I/O error from the filesystem.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }
}

/// Platform implementation backed by the running operating system.
///
/// Only obtainable through [`NativePlatform::detect`]:
///
/// ```compile_fail
/// let platform = linkdupe::platform::NativePlatform::default();
/// ```
#[derive(Debug, Clone, Copy)]
pub struct NativePlatform {
    _private: (),
}

impl NativePlatform {
    /// Check that the running target supports identities and hard links.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Unsupported`] on targets other than Unix and
    /// Windows. Callers should surface this at startup.
    pub fn detect() -> Result<Self, PlatformError> {
        if Self::is_supported() {
            Ok(Self { _private: () })
        } else {
            Err(PlatformError::Unsupported)
        }
    }

    /// Whether this target has a native implementation.
    #[must_use]
    pub const fn is_supported() -> bool {
        cfg!(any(unix, windows))
    }
}

impl Platform for NativePlatform {
    fn identity_of(&self, path: &Path) -> Result<FileIdentity, PlatformError> {
        #[cfg(any(unix, windows))]
        {
            sys::identity_of(path).map_err(|source| PlatformError::Identity {
                path: path.to_path_buf(),
                source,
            })
        }

        #[cfg(not(any(unix, windows)))]
        {
            let _ = path;
            Err(PlatformError::Unsupported)
        }
    }

    fn create_hard_link(&self, target: &Path, destination: &Path) -> Result<(), PlatformError> {
        if destination.symlink_metadata().is_ok() {
            if let (Ok(a), Ok(b)) = (self.identity_of(target), self.identity_of(destination)) {
                if a == b {
                    return Err(PlatformError::SameFile {
                        target: target.to_path_buf(),
                        destination: destination.to_path_buf(),
                    });
                }
            }
        }

        fs::hard_link(target, destination).map_err(|source| PlatformError::Link {
            target: target.to_path_buf(),
            destination: destination.to_path_buf(),
            source,
        })
    }
}
