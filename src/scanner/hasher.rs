//! BLAKE3 content fingerprints.
//!
//! # Overview
//!
//! The deduplication engine only needs "are these bytes identical", and asks
//! for it through the [`Fingerprinter`] trait. [`Hasher`] is the default
//! implementation: small files are streamed through a fixed buffer, large
//! files are memory-mapped and hashed on the rayon pool.
//!
//! # Example
//!
//! ```no_run
//! use linkdupe::scanner::{hash_to_hex, Fingerprinter, Hasher};
//! use std::path::Path;
//!
//! let hasher = Hasher::new();
//! let digest = hasher.fingerprint(Path::new("file.bin")).unwrap();
//! println!("{}", hash_to_hex(&digest));
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::HashError;

/// 32-byte BLAKE3 digest.
pub type Hash = [u8; 32];

/// Files at or above this size are memory-mapped and hashed in parallel.
pub const MMAP_THRESHOLD: u64 = 16 * 1024 * 1024;

/// Read buffer for streamed hashing.
const BUFFER_SIZE: usize = 64 * 1024;

/// Computes a fixed-length content digest for a file.
///
/// Equal digests are treated as equal content; implementations must use a
/// hash with negligible collision probability.
pub trait Fingerprinter: Send + Sync {
    /// Hash the full content of `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] if the file cannot be read.
    fn fingerprint(&self, path: &Path) -> Result<Hash, HashError>;
}

/// BLAKE3 file hasher.
#[derive(Debug, Clone)]
pub struct Hasher {
    mmap_threshold: u64,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher with the default memory-map threshold.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mmap_threshold: MMAP_THRESHOLD,
            shutdown_flag: None,
        }
    }

    /// Override the size at which files are memory-mapped.
    #[must_use]
    pub fn with_mmap_threshold(mut self, bytes: u64) -> Self {
        self.mmap_threshold = bytes;
        self
    }

    /// Abort streamed hashing when the flag is raised.
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

    /// Hash the entire content of a file.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::Interrupted`] if shutdown was requested, or the
    /// classified I/O error otherwise.
    pub fn full_hash(&self, path: &Path) -> Result<Hash, HashError> {
        if self.is_shutdown_requested() {
            return Err(HashError::Interrupted(path.to_path_buf()));
        }

        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let len = file
            .metadata()
            .map_err(|e| HashError::from_io(path, e))?
            .len();

        let mut hasher = blake3::Hasher::new();

        if len >= self.mmap_threshold {
            log::trace!("Hashing {} via mmap ({} bytes)", path.display(), len);
            hasher
                .update_mmap_rayon(path)
                .map_err(|e| HashError::from_io(path, e))?;
        } else {
            let mut buffer = vec![0u8; BUFFER_SIZE];
            loop {
                if self.is_shutdown_requested() {
                    return Err(HashError::Interrupted(path.to_path_buf()));
                }
                let n = match file.read(&mut buffer) {
                    Ok(0) => break,
                    Ok(n) => n,
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(HashError::from_io(path, e)),
                };
                hasher.update(&buffer[..n]);
            }
        }

        Ok(*hasher.finalize().as_bytes())
    }
}

impl Fingerprinter for Hasher {
    fn fingerprint(&self, path: &Path) -> Result<Hash, HashError> {
        self.full_hash(path)
    }
}

/// Convert a digest to lowercase hexadecimal.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}
