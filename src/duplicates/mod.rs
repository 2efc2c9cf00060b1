//! Duplicate detection and link planning.
//!
//! This module provides functionality for:
//! - Size-based grouping (Phase 1)
//! - Storage-object identity grouping per volume (Phase 2)
//! - Content fingerprint grouping (Phase 3)
//! - Keep-policy decisions and link plans
//! - The [`Deduplicator`] that runs the whole pipeline

pub mod finder;
pub mod fingerprint;
pub mod groups;
pub mod identity;
pub mod policy;

pub use finder::{
    DedupConfig, Deduplicator, FinderError, GroupReport, LinkRecord, LinkStatus, RunReport,
    RunSummary,
};
pub use fingerprint::{group_by_fingerprint, FingerprintGroup};
pub use groups::{group_by_size, FileRef, GroupingStats, SizeGroup};
pub use identity::{group_by_identity, IdentityClass, VolumeClasses};
pub use policy::{KeepPolicy, LinkPlan};

use crate::actions::LinkError;
use crate::platform::PlatformError;
use crate::scanner::{HashError, ScanError};

/// A non-fatal problem recorded during a run.
///
/// None of these stop the run; the affected file or swap is left alone and
/// the error is kept in the [`RunReport`].
#[derive(thiserror::Error, Debug)]
pub enum DedupError {
    /// A directory entry could not be read or a backup not restored.
    #[error(transparent)]
    Traversal(#[from] ScanError),

    /// The storage-object identity of a file could not be determined.
    #[error(transparent)]
    IdentityQuery(#[from] PlatformError),

    /// A representative could not be hashed.
    #[error(transparent)]
    Fingerprint(#[from] HashError),

    /// A link swap failed and was rolled back.
    #[error(transparent)]
    Link(#[from] LinkError),
}

impl DedupError {
    /// Short machine-readable name of the error kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Traversal(ScanError::Recovery { .. }) => "recovery",
            Self::Traversal(_) => "traversal",
            Self::IdentityQuery(_) => "identity_query",
            Self::Fingerprint(_) => "fingerprint",
            Self::Link(LinkError::LinkCreate(_)) => "link_create",
            Self::Link(LinkError::BackupRemove { .. }) => "backup_remove",
            Self::Link(LinkError::Modified(_)) => "modified",
            Self::Link(LinkError::BackupExists(_)) => "backup_exists",
            Self::Link(_) => "link",
        }
    }
}
