//! Deduplicator: runs the whole pipeline from directory walk to link swaps.
//!
//! # Overview
//!
//! 1. **Walk** - Collect candidate files, restoring leftover backups
//! 2. **Phase 1** - Group by size ([`group_by_size`])
//! 3. **Phase 2** - Group by storage-object identity per volume
//!    ([`group_by_identity`])
//! 4. **Phase 3** - Hash one representative per identity class and group by
//!    digest ([`group_by_fingerprint`])
//! 5. **Plan** - Apply the [`KeepPolicy`] to every fingerprint group
//! 6. **Link** - Only when deduplication is enabled, swap each planned
//!    destination for a hard link
//!
//! Every phase records its non-fatal errors in the [`RunReport`] and carries
//! on. A shutdown request stops the run at the next phase boundary, or
//! between two swaps while linking.
//!
//! # Example
//!
//! ```no_run
//! use linkdupe::duplicates::{DedupConfig, Deduplicator, KeepPolicy};
//! use std::path::Path;
//!
//! let config = DedupConfig::default()
//!     .with_policy(KeepPolicy::KeepMinimum)
//!     .with_min_size(4096);
//! let deduplicator = Deduplicator::with_native(config).unwrap();
//!
//! let report = deduplicator.run(Path::new("/srv/data")).unwrap();
//! println!("{} groups could be linked", report.summary.duplicate_groups);
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::actions::{link_batch, LinkOutcome, LinkProgressCallback};
use crate::platform::{NativePlatform, Platform, PlatformError};
use crate::progress::{ProgressCallback, PHASE_HASHING, PHASE_LINKING, PHASE_WALKING};
use crate::scanner::{FileEntry, Fingerprinter, Hash, Hasher, ScanError, Walker, WalkerConfig};

use super::fingerprint::group_by_fingerprint;
use super::groups::{group_by_size, FileRef};
use super::identity::{group_by_identity, VolumeClasses};
use super::policy::{KeepPolicy, LinkPlan};
use super::DedupError;

/// Configuration for a deduplication run.
#[derive(Clone, Default)]
pub struct DedupConfig {
    /// How many independent copies to retain.
    pub policy: KeepPolicy,
    /// Perform link swaps; when false the run only reports.
    pub deduplicate: bool,
    /// Traversal settings.
    pub walker_config: WalkerConfig,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for DedupConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DedupConfig")
            .field("policy", &self.policy)
            .field("deduplicate", &self.deduplicate)
            .field("walker_config", &self.walker_config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl DedupConfig {
    /// Set the keep policy.
    #[must_use]
    pub fn with_policy(mut self, policy: KeepPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Enable or disable link swaps.
    #[must_use]
    pub fn with_deduplicate(mut self, deduplicate: bool) -> Self {
        self.deduplicate = deduplicate;
        self
    }

    /// Set the minimum candidate size in bytes.
    #[must_use]
    pub fn with_min_size(mut self, min_size: u64) -> Self {
        self.walker_config.min_size = min_size;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// State of one planned swap after the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    /// Planned but not attempted (report-only run).
    Planned,
    /// The destination is now a link to the source.
    Linked,
    /// The swap failed and was rolled back.
    Failed,
    /// Not attempted because the run was interrupted.
    Skipped,
}

/// One planned swap and what became of it.
#[derive(Debug, Clone, Serialize)]
pub struct LinkRecord {
    /// The planned swap
    #[serde(flatten)]
    pub plan: LinkPlan,
    /// Outcome
    pub status: LinkStatus,
    /// Error message when the swap failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// An actionable fingerprint group and its planned links.
#[derive(Debug, Clone)]
pub struct GroupReport {
    /// Shared content digest
    pub hash: Hash,
    /// File size in bytes
    pub size: u64,
    /// Volume the group lives on
    pub volume: u64,
    /// One representative per independent copy, primary first
    pub mains: Vec<FileRef>,
    /// Planned swaps in execution order
    pub links: Vec<LinkRecord>,
}

impl GroupReport {
    /// Hex form of the digest.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        crate::scanner::hash_to_hex(&self.hash)
    }

    /// Bytes freed if every planned swap succeeds.
    #[must_use]
    pub fn reclaimable(&self) -> u64 {
        self.size * self.links.len() as u64
    }
}

/// Counters describing a run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Candidate files produced by the walk
    pub total_files: usize,
    /// Total bytes of all candidates
    pub total_size: u64,
    /// Size classes with two or more members
    pub size_groups: usize,
    /// Identity classes found across all volumes
    pub identity_classes: usize,
    /// Representatives hashed successfully
    pub hashed_classes: usize,
    /// Actionable fingerprint groups
    pub duplicate_groups: usize,
    /// Swaps planned
    pub planned_links: usize,
    /// Swaps completed
    pub links_created: usize,
    /// Swaps that failed and were rolled back
    pub links_failed: usize,
    /// Bytes freed if every planned swap succeeds
    pub reclaimable_space: u64,
    /// Bytes actually freed
    pub reclaimed_space: u64,
    /// Wall-clock duration of the run
    pub duration: Duration,
    /// Whether the run stopped early on a shutdown request
    pub interrupted: bool,
}

impl RunSummary {
    /// Format reclaimable space as human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        bytesize::ByteSize::b(self.reclaimable_space).to_string()
    }

    /// Format reclaimed space as human-readable string.
    #[must_use]
    pub fn reclaimed_display(&self) -> String {
        bytesize::ByteSize::b(self.reclaimed_space).to_string()
    }
}

/// Everything a run found and did.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Actionable groups in deterministic order
    pub groups: Vec<GroupReport>,
    /// Non-fatal errors in the order they occurred
    pub errors: Vec<DedupError>,
    /// Counters
    pub summary: RunSummary,
}

/// Errors that stop a run before it starts.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The platform cannot support hard-link deduplication.
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Forwards per-swap progress to the run's progress callback.
struct LinkProgress<'a> {
    callback: &'a dyn ProgressCallback,
    offset: usize,
}

impl LinkProgressCallback for LinkProgress<'_> {
    fn on_before_link(&self, plan: &LinkPlan, index: usize, _total: usize) {
        self.callback.on_progress(
            self.offset + index + 1,
            plan.destination.path.to_string_lossy().as_ref(),
        );
    }

    fn on_link_done(&self, _plan: &LinkPlan, _outcome: &LinkOutcome) {}
}

/// Runs the deduplication pipeline against a [`Platform`] and a
/// [`Fingerprinter`].
pub struct Deduplicator {
    config: DedupConfig,
    platform: Arc<dyn Platform>,
    fingerprinter: Arc<dyn Fingerprinter>,
}

impl Deduplicator {
    /// Create a deduplicator from explicit collaborators.
    #[must_use]
    pub fn new(
        config: DedupConfig,
        platform: Arc<dyn Platform>,
        fingerprinter: Arc<dyn Fingerprinter>,
    ) -> Self {
        Self {
            config,
            platform,
            fingerprinter,
        }
    }

    /// Create a deduplicator using the operating system and BLAKE3.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Unsupported`] on targets without a native
    /// implementation.
    pub fn with_native(config: DedupConfig) -> Result<Self, PlatformError> {
        let platform = NativePlatform::detect()?;
        let mut hasher = Hasher::new();
        if let Some(ref flag) = config.shutdown_flag {
            hasher = hasher.with_shutdown_flag(flag.clone());
        }
        Ok(Self::new(config, Arc::new(platform), Arc::new(hasher)))
    }

    /// Walk `root` and run the pipeline on everything found.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if `root` does not exist or is not a
    /// directory. Everything that goes wrong later is recorded in the
    /// report instead.
    pub fn run(&self, root: &Path) -> Result<RunReport, FinderError> {
        if !root.exists() {
            return Err(FinderError::PathNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(FinderError::NotADirectory(root.to_path_buf()));
        }

        log::info!("Scanning {}", root.display());

        let mut walker = Walker::new(root, self.config.walker_config.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(flag.clone());
        }

        let callback = self.config.progress_callback.as_deref();
        if let Some(cb) = callback {
            cb.on_phase_start(PHASE_WALKING, 0);
        }
        let mut seen = 0usize;
        let entries: Vec<Result<FileEntry, ScanError>> = walker
            .walk()
            .inspect(|entry| {
                if let (Some(cb), Ok(file)) = (callback, entry) {
                    seen += 1;
                    cb.on_progress(seen, file.path.to_string_lossy().as_ref());
                }
            })
            .collect();
        if let Some(cb) = callback {
            cb.on_phase_end(PHASE_WALKING);
        }

        Ok(self.run_entries(entries))
    }

    /// Run the pipeline on an already collected candidate list.
    ///
    /// Entries are processed in the order given.
    pub fn run_entries<I>(&self, entries: I) -> RunReport
    where
        I: IntoIterator<Item = Result<FileEntry, ScanError>>,
    {
        let start = Instant::now();
        let mut report = RunReport::default();

        let files: Vec<FileRef> = entries
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(file) => Some(FileRef::from(file)),
                Err(e) => {
                    report.errors.push(e.into());
                    None
                }
            })
            .collect();

        if self.stop_requested(&mut report, start) {
            return report;
        }

        // Phase 1
        let (size_groups, stats) = group_by_size(files);
        report.summary.total_files = stats.total_files;
        report.summary.total_size = stats.total_size;
        report.summary.size_groups = stats.size_groups;

        // Phase 2
        let mut volumes: Vec<VolumeClasses> = Vec::new();
        for group in size_groups {
            let (found, errors) = group_by_identity(group, self.platform.as_ref());
            report.errors.extend(errors.into_iter().map(DedupError::from));
            volumes.extend(found);
        }
        report.summary.identity_classes = volumes.iter().map(|v| v.classes.len()).sum();
        log::debug!(
            "Identity grouping: {} classes in {} size/volume buckets",
            report.summary.identity_classes,
            volumes.len()
        );

        if self.stop_requested(&mut report, start) {
            return report;
        }

        // Phase 3 and planning
        self.fingerprint_and_plan(volumes, &mut report);

        if self.stop_requested(&mut report, start) {
            return report;
        }

        if self.config.deduplicate {
            self.link_all(&mut report);
        }

        report.summary.duration = start.elapsed();
        log::debug!(
            "Run finished in {:?}: {} groups, {} links created, {} failed",
            report.summary.duration,
            report.summary.duplicate_groups,
            report.summary.links_created,
            report.summary.links_failed
        );
        report
    }

    fn fingerprint_and_plan(&self, volumes: Vec<VolumeClasses>, report: &mut RunReport) {
        let callback = self.config.progress_callback.as_deref();
        if let Some(cb) = callback {
            cb.on_phase_start(PHASE_HASHING, report.summary.identity_classes);
        }
        let hashed = AtomicUsize::new(0);
        let policy = self.config.policy;

        for volume in volumes {
            if self.config.is_shutdown_requested() {
                break;
            }
            let volume_id = volume.volume;
            let (groups, errors) =
                group_by_fingerprint(volume, self.fingerprinter.as_ref(), policy, |path| {
                    let n = hashed.fetch_add(1, Ordering::Relaxed) + 1;
                    if let Some(cb) = callback {
                        cb.on_progress(n, path.to_string_lossy().as_ref());
                    }
                });
            report.errors.extend(errors.into_iter().map(DedupError::from));

            for group in groups {
                report.summary.hashed_classes += group.mains.len();
                if !policy.is_actionable(&group) {
                    continue;
                }
                let links: Vec<LinkRecord> = policy
                    .plan_links(&group)
                    .into_iter()
                    .map(|plan| LinkRecord {
                        plan,
                        status: LinkStatus::Planned,
                        error: None,
                    })
                    .collect();

                let group_report = GroupReport {
                    hash: group.hash,
                    size: group.size,
                    volume: volume_id,
                    mains: group.mains,
                    links,
                };
                report.summary.duplicate_groups += 1;
                report.summary.planned_links += group_report.links.len();
                report.summary.reclaimable_space += group_report.reclaimable();
                report.groups.push(group_report);
            }
        }

        if let Some(cb) = callback {
            cb.on_phase_end(PHASE_HASHING);
        }
    }

    fn link_all(&self, report: &mut RunReport) {
        let callback = self.config.progress_callback.as_deref();
        if let Some(cb) = callback {
            cb.on_phase_start(PHASE_LINKING, report.summary.planned_links);
        }
        let shutdown = self.config.shutdown_flag.as_deref();
        let mut offset = 0;

        for group in &mut report.groups {
            let plans: Vec<LinkPlan> = group.links.iter().map(|r| r.plan.clone()).collect();
            let progress = callback.map(|cb| LinkProgress { callback: cb, offset });
            let result = link_batch(
                self.platform.as_ref(),
                &plans,
                shutdown,
                progress.as_ref().map(|p| p as &dyn LinkProgressCallback),
            );
            offset += plans.len();

            report.summary.links_created += result.success_count();
            report.summary.links_failed += result.failure_count();
            report.summary.reclaimed_space += result.bytes_reclaimed;
            report.summary.interrupted |= result.interrupted;

            for (record, outcome) in group.links.iter_mut().zip(result.outcomes) {
                match outcome {
                    LinkOutcome::Linked => record.status = LinkStatus::Linked,
                    LinkOutcome::Skipped => record.status = LinkStatus::Skipped,
                    LinkOutcome::Failed(e) => {
                        record.status = LinkStatus::Failed;
                        record.error = Some(e.to_string());
                        report.errors.push(DedupError::from(e));
                    }
                }
            }
        }

        if let Some(cb) = callback {
            cb.on_phase_end(PHASE_LINKING);
        }
    }

    fn stop_requested(&self, report: &mut RunReport, start: Instant) -> bool {
        if self.config.is_shutdown_requested() {
            log::info!("Interrupted by shutdown signal");
            report.summary.interrupted = true;
            report.summary.duration = start.elapsed();
            true
        } else {
            false
        }
    }
}
