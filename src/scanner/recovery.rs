//! On-disk backup protocol for link swaps.
//!
//! While a destination is being replaced by a hard link, its original
//! directory entry lives at `<destination>` + [`BACKUP_SUFFIX`]. A path with
//! that suffix seen during traversal means a previous run was interrupted in
//! the middle of a swap. It is renamed back over its original path before
//! anything else looks at it, so the original content always wins.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};

use super::ScanError;

/// Suffix appended to a destination while its swap is in flight.
pub const BACKUP_SUFFIX: &str = ".linkdupe-bak";

/// Backup path used while swapping `destination`.
#[must_use]
pub fn backup_path_for(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_owned();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Whether `path` names a swap backup.
#[must_use]
pub fn is_backup_path(path: &Path) -> bool {
    original_path_for(path).is_some()
}

/// Original path a backup belongs to, or `None` if `path` is not a backup.
///
/// A file named exactly like the suffix has no original and is not a backup.
#[must_use]
pub fn original_path_for(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?;
    let stripped = strip_suffix(name)?;
    Some(path.with_file_name(stripped))
}

#[cfg(unix)]
fn strip_suffix(name: &OsStr) -> Option<OsString> {
    use std::os::unix::ffi::{OsStrExt, OsStringExt};

    name.as_bytes()
        .strip_suffix(BACKUP_SUFFIX.as_bytes())
        .filter(|stem| !stem.is_empty())
        .map(|stem| OsString::from_vec(stem.to_vec()))
}

#[cfg(not(unix))]
fn strip_suffix(name: &OsStr) -> Option<OsString> {
    name.to_str()?
        .strip_suffix(BACKUP_SUFFIX)
        .filter(|stem| !stem.is_empty())
        .map(OsString::from)
}

/// Rename a leftover backup back to its original path.
///
/// If the original path exists it is the half-finished link from the
/// interrupted swap and is replaced. Returns the restored path.
///
/// # Errors
///
/// Returns [`ScanError::Recovery`] if the rename fails, and
/// [`ScanError::NotFound`] if `backup` is not a backup path.
pub fn restore_backup(backup: &Path) -> Result<PathBuf, ScanError> {
    let original =
        original_path_for(backup).ok_or_else(|| ScanError::NotFound(backup.to_path_buf()))?;

    fs::rename(backup, &original).map_err(|source| ScanError::Recovery {
        backup: backup.to_path_buf(),
        original: original.clone(),
        source,
    })?;

    log::info!(
        "Restored interrupted swap: {} -> {}",
        backup.display(),
        original.display()
    );
    Ok(original)
}

/// Outcome of a recovery-only pass over a tree.
#[derive(Debug, Default)]
pub struct RecoverySummary {
    /// Paths that were restored
    pub restored: Vec<PathBuf>,
    /// Backups that could not be restored, and traversal errors
    pub errors: Vec<ScanError>,
}

/// Walk `root` and restore every leftover backup without deduplicating.
#[must_use]
pub fn recover_tree(root: &Path) -> RecoverySummary {
    let mut summary = RecoverySummary::default();

    let walk_dir = jwalk::WalkDir::new(root)
        .follow_links(false)
        .skip_hidden(false)
        .sort(true);

    for entry in walk_dir {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf);
                summary.errors.push(ScanError::Io {
                    path,
                    source: std::io::Error::other(e.to_string()),
                });
                continue;
            }
        };

        let path = entry.path();
        if !entry.file_type().is_file() || !is_backup_path(&path) {
            continue;
        }

        match restore_backup(&path) {
            Ok(original) => summary.restored.push(original),
            Err(e) => summary.errors.push(e),
        }
    }

    summary
}
