//! Atomic replacement of duplicate files by hard links.
//!
//! # Overview
//!
//! A swap turns destination `D` into a hard link to source `S` without ever
//! leaving `D`'s original content unrecoverable:
//!
//! ```text
//! NoBackup --rename D to D.bak--> BackedUp --link S at D--> Linked --remove D.bak--> Done
//!                                    |                          |
//!                                    +-- link failed -----------+-- removal failed
//!                                    v                          v
//!                                RolledBack (D.bak renamed back to D) -> Failed
//! ```
//!
//! If the process dies between the first rename and the end of the swap,
//! the backup stays on disk under the suffix from
//! [`crate::scanner::recovery`] and is put back by the next traversal.
//!
//! # Safety
//!
//! Before touching anything, [`link_verified`] re-queries both files and
//! refuses to swap if either is no longer the storage object recorded when
//! the groups were built.
//!
//! # Example
//!
//! ```no_run
//! use linkdupe::actions::link::link_swap;
//! use linkdupe::platform::NativePlatform;
//! use std::path::Path;
//!
//! let platform = NativePlatform::detect().unwrap();
//! match link_swap(&platform, Path::new("keep.bin"), Path::new("dupe.bin")) {
//!     Ok(()) => println!("linked"),
//!     Err(e) => eprintln!("Failed: {}", e),
//! }
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

use crate::duplicates::LinkPlan;
use crate::platform::{Platform, PlatformError};
use crate::scanner::backup_path_for;

/// Error type for link swaps.
#[derive(Debug, Error)]
pub enum LinkError {
    /// A file is no longer the storage object seen during grouping.
    #[error("file changed since scan: {0}")]
    Modified(PathBuf),

    /// A backup from an earlier, unrecovered swap is in the way.
    #[error("backup already exists: {0}")]
    BackupExists(PathBuf),

    /// The destination could not be moved to its backup path.
    #[error("cannot back up {path}: {source}")]
    Backup {
        /// Destination being backed up
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Creating the hard link failed; the destination was rolled back.
    #[error("cannot create hard link: {0}")]
    LinkCreate(#[source] PlatformError),

    /// Removing the backup failed; the destination was rolled back.
    #[error("cannot remove backup {backup}: {source}")]
    BackupRemove {
        /// Backup that could not be removed
        backup: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Rolling back failed. The original content is still at `backup` and
    /// will be restored by the next run.
    #[error("rollback of {path} failed, original kept at {backup}: {source}")]
    Rollback {
        /// Destination of the failed swap
        path: PathBuf,
        /// Where the original content remains
        backup: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl LinkError {
    /// Get the path associated with this error (if any).
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Modified(p)
            | Self::BackupExists(p)
            | Self::Backup { path: p, .. }
            | Self::BackupRemove { backup: p, .. }
            | Self::Rollback { path: p, .. } => Some(p),
            Self::LinkCreate(PlatformError::Link { destination, .. })
            | Self::LinkCreate(PlatformError::SameFile { destination, .. }) => Some(destination),
            Self::LinkCreate(_) => None,
        }
    }
}

/// Stage a swap has reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapState {
    /// Nothing has been changed yet.
    NoBackup,
    /// The destination has been moved to its backup path.
    BackedUp,
    /// The link exists at the destination; the backup still exists.
    Linked,
    /// The swap completed.
    Done,
    /// The destination was restored from its backup.
    RolledBack,
}

/// Put the backup back at `destination`, replacing whatever is there.
fn roll_back(
    platform: &dyn Platform,
    destination: &Path,
    backup: &Path,
) -> Result<(), LinkError> {
    if destination.symlink_metadata().is_ok() {
        if let Err(e) = platform.remove_file(destination) {
            log::debug!(
                "Could not remove {} before rollback: {}",
                destination.display(),
                e
            );
        }
    }

    platform.rename(backup, destination).map_err(|source| LinkError::Rollback {
        path: destination.to_path_buf(),
        backup: backup.to_path_buf(),
        source,
    })?;

    log::trace!("{}: {:?}", destination.display(), SwapState::RolledBack);
    Ok(())
}

/// Replace `destination` by a hard link to `source`.
///
/// On failure the destination is restored to what it was before the call,
/// unless the rollback itself fails, in which case the original content is
/// left at the backup path for recovery.
///
/// # Errors
///
/// - `BackupExists` if a leftover backup occupies the backup path
/// - `Backup` if the destination cannot be renamed
/// - `LinkCreate` / `BackupRemove` after a successful rollback
/// - `Rollback` if restoring the destination failed
pub fn link_swap(
    platform: &dyn Platform,
    source: &Path,
    destination: &Path,
) -> Result<(), LinkError> {
    let backup = backup_path_for(destination);
    if backup.symlink_metadata().is_ok() {
        return Err(LinkError::BackupExists(backup));
    }

    let mut state = SwapState::NoBackup;
    if destination.symlink_metadata().is_ok() {
        platform.rename(destination, &backup).map_err(|source| LinkError::Backup {
            path: destination.to_path_buf(),
            source,
        })?;
        state = SwapState::BackedUp;
        log::trace!("{}: {:?}", destination.display(), state);
    }

    if let Err(e) = platform.create_hard_link(source, destination) {
        if state == SwapState::BackedUp {
            roll_back(platform, destination, &backup)?;
        }
        return Err(LinkError::LinkCreate(e));
    }
    let had_backup = state == SwapState::BackedUp;
    state = SwapState::Linked;
    log::trace!("{}: {:?}", destination.display(), state);

    if had_backup {
        if let Err(e) = platform.remove_file(&backup) {
            roll_back(platform, destination, &backup)?;
            return Err(LinkError::BackupRemove { backup, source: e });
        }
    }

    log::trace!("{}: {:?}", destination.display(), SwapState::Done);
    Ok(())
}

/// Carry out one planned swap after checking nothing moved underneath it.
///
/// # Errors
///
/// Returns `Modified` if source or destination no longer has the identity
/// recorded in the plan, plus any error from [`link_swap`].
pub fn link_verified(platform: &dyn Platform, plan: &LinkPlan) -> Result<(), LinkError> {
    for file in [&plan.source, &plan.destination] {
        let current = platform.identity_of(&file.path).ok();
        if current.is_none() || current != file.identity {
            return Err(LinkError::Modified(file.path.clone()));
        }
    }

    link_swap(platform, &plan.source.path, &plan.destination.path)
}

/// What happened to one planned swap.
#[derive(Debug)]
pub enum LinkOutcome {
    /// The destination is now a link to the source.
    Linked,
    /// The swap failed and was rolled back.
    Failed(LinkError),
    /// The swap was not attempted because shutdown was requested.
    Skipped,
}

/// Results of a batch of swaps, aligned with the plans passed in.
#[derive(Debug, Default)]
pub struct BatchLinkResult {
    /// One outcome per plan, in plan order
    pub outcomes: Vec<LinkOutcome>,
    /// Bytes no longer held by an independent copy
    pub bytes_reclaimed: u64,
    /// Whether the batch stopped early on a shutdown request
    pub interrupted: bool,
}

impl BatchLinkResult {
    /// Number of successful swaps.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, LinkOutcome::Linked))
            .count()
    }

    /// Number of failed swaps.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, LinkOutcome::Failed(_)))
            .count()
    }

    /// Check if every planned swap succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| matches!(o, LinkOutcome::Linked))
    }
}

/// Progress callback for batch linking.
pub trait LinkProgressCallback {
    /// Called before each swap.
    fn on_before_link(&self, plan: &LinkPlan, index: usize, total: usize);

    /// Called after a swap finished, successfully or not.
    fn on_link_done(&self, plan: &LinkPlan, outcome: &LinkOutcome);
}

/// Perform planned swaps one after another, continuing past failures.
///
/// The shutdown flag is checked between swaps only; a swap in progress is
/// always finished or rolled back.
pub fn link_batch(
    platform: &dyn Platform,
    plans: &[LinkPlan],
    shutdown_flag: Option<&AtomicBool>,
    callback: Option<&dyn LinkProgressCallback>,
) -> BatchLinkResult {
    let mut result = BatchLinkResult::default();

    for (index, plan) in plans.iter().enumerate() {
        if result.interrupted || shutdown_flag.is_some_and(|f| f.load(Ordering::SeqCst)) {
            result.interrupted = true;
            result.outcomes.push(LinkOutcome::Skipped);
            continue;
        }

        if let Some(cb) = callback {
            cb.on_before_link(plan, index, plans.len());
        }

        let outcome = match link_verified(platform, plan) {
            Ok(()) => {
                log::trace!(
                    "Linked {} -> {}",
                    plan.destination.path.display(),
                    plan.source.path.display()
                );
                result.bytes_reclaimed += plan.destination.size;
                LinkOutcome::Linked
            }
            Err(e) => LinkOutcome::Failed(e),
        };

        if let Some(cb) = callback {
            cb.on_link_done(plan, &outcome);
        }
        result.outcomes.push(outcome);
    }

    result
}
