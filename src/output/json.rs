//! JSON output formatter for run reports.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "groups": [
//!     {
//!       "hash": "abc123...",
//!       "size": 1024,
//!       "volume": 2049,
//!       "mains": ["/data/a.bin", "/data/b.bin", "/data/c.bin"],
//!       "links": [
//!         {"source": "/data/a.bin", "destination": "/data/c.bin", "status": "linked"}
//!       ]
//!     }
//!   ],
//!   "errors": [{"kind": "traversal", "message": "Permission denied: /data/private"}],
//!   "summary": {
//!     "total_files": 100,
//!     "duplicate_groups": 1,
//!     "planned_links": 1,
//!     "links_created": 1,
//!     "reclaimable_space": 1024,
//!     "duration_ms": 12,
//!     "interrupted": false,
//!     "exit_code": 0
//!   }
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use crate::duplicates::{GroupReport, LinkRecord, LinkStatus, RunReport, RunSummary};
use crate::error::ExitCode;

/// A planned or performed swap in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonLink {
    /// Retained copy the link points at
    pub source: String,
    /// Path replaced by the link
    pub destination: String,
    /// Outcome of the swap
    pub status: LinkStatus,
    /// Error message for failed swaps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&LinkRecord> for JsonLink {
    fn from(record: &LinkRecord) -> Self {
        Self {
            source: record.plan.source.path.to_string_lossy().into_owned(),
            destination: record.plan.destination.path.to_string_lossy().into_owned(),
            status: record.status,
            error: record.error.clone(),
        }
    }
}

/// An actionable group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonGroup {
    /// BLAKE3 hash as hexadecimal string (64 characters)
    pub hash: String,
    /// File size in bytes
    pub size: u64,
    /// Volume identifier
    pub volume: u64,
    /// Independent copies, primary first
    pub mains: Vec<String>,
    /// Swaps for this group
    pub links: Vec<JsonLink>,
}

impl From<&GroupReport> for JsonGroup {
    fn from(group: &GroupReport) -> Self {
        Self {
            hash: group.hash_hex(),
            size: group.size,
            volume: group.volume,
            mains: group
                .mains
                .iter()
                .map(|f| f.path.to_string_lossy().into_owned())
                .collect(),
            links: group.links.iter().map(JsonLink::from).collect(),
        }
    }
}

/// A non-fatal error in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonError {
    /// Error kind, e.g. "identity_query"
    pub kind: &'static str,
    /// Human-readable message
    pub message: String,
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Candidate files found
    pub total_files: usize,
    /// Total size of all candidates in bytes
    pub total_size: u64,
    /// Size classes with two or more files
    pub size_groups: usize,
    /// Identity classes
    pub identity_classes: usize,
    /// Actionable groups
    pub duplicate_groups: usize,
    /// Swaps planned
    pub planned_links: usize,
    /// Swaps completed
    pub links_created: usize,
    /// Swaps failed
    pub links_failed: usize,
    /// Bytes freed if every planned swap succeeds
    pub reclaimable_space: u64,
    /// Bytes freed
    pub reclaimed_space: u64,
    /// Duration of the run in milliseconds
    pub duration_ms: u64,
    /// Whether the run was interrupted
    pub interrupted: bool,
    /// The process exit code
    pub exit_code: i32,
}

impl JsonSummary {
    /// Create a JSON summary from a run summary and an exit code.
    #[must_use]
    pub fn from_run_summary(summary: &RunSummary, exit_code: ExitCode) -> Self {
        Self {
            total_files: summary.total_files,
            total_size: summary.total_size,
            size_groups: summary.size_groups,
            identity_classes: summary.identity_classes,
            duplicate_groups: summary.duplicate_groups,
            planned_links: summary.planned_links,
            links_created: summary.links_created,
            links_failed: summary.links_failed,
            reclaimable_space: summary.reclaimable_space,
            reclaimed_space: summary.reclaimed_space,
            duration_ms: summary.duration.as_millis() as u64,
            interrupted: summary.interrupted,
            exit_code: exit_code.as_i32(),
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Actionable groups
    pub groups: Vec<JsonGroup>,
    /// Non-fatal errors
    pub errors: Vec<JsonError>,
    /// Run statistics
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Build the JSON view of a report.
    ///
    /// ```
    /// use linkdupe::duplicates::RunReport;
    /// use linkdupe::error::ExitCode;
    /// use linkdupe::output::JsonOutput;
    ///
    /// let output = JsonOutput::new(&RunReport::default(), ExitCode::Success);
    /// assert!(output.groups.is_empty());
    /// ```
    #[must_use]
    pub fn new(report: &RunReport, exit_code: ExitCode) -> Self {
        Self {
            groups: report.groups.iter().map(JsonGroup::from).collect(),
            errors: report
                .errors
                .iter()
                .map(|e| JsonError {
                    kind: e.kind(),
                    message: e.to_string(),
                })
                .collect(),
            summary: JsonSummary::from_run_summary(&report.summary, exit_code),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
