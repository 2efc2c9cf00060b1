//! Plain-text report.
//!
//! Each actionable group is printed as a block, in report-only runs or when
//! verbose:
//!
//! ```text
//! Duplicates found:
//! /data/a.iso (734003200 bytes)
//! /data/b.iso (734003200 bytes)
//! /data/c.iso (734003200 bytes)
//!
//! ```
//!
//! When verbose, every attempted swap adds a line after its group, and the
//! errors recorded during the run go to the error stream.

use std::io::{self, Write};

use crate::duplicates::{DedupError, LinkStatus, RunReport};

/// Renders a [`RunReport`] as text.
#[derive(Debug, Clone, Copy)]
pub struct TextOutput<'a> {
    report: &'a RunReport,
    deduplicate: bool,
    verbose: bool,
}

impl<'a> TextOutput<'a> {
    /// Create a renderer.
    ///
    /// * `deduplicate` - whether the run performed swaps
    /// * `verbose` - print swaps, errors and groups of deduplicating runs
    #[must_use]
    pub fn new(report: &'a RunReport, deduplicate: bool, verbose: bool) -> Self {
        Self {
            report,
            deduplicate,
            verbose,
        }
    }

    /// Write the report to `out`, errors to `err`.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from the writers.
    pub fn write_to<W: Write, E: Write>(&self, out: &mut W, err: &mut E) -> io::Result<()> {
        let list_groups = !self.deduplicate || self.verbose;

        for group in &self.report.groups {
            if list_groups {
                writeln!(out, "Duplicates found:")?;
                for main in &group.mains {
                    writeln!(out, "{} ({} bytes)", main.path.display(), main.size)?;
                }
                writeln!(out)?;
            }

            if !self.verbose {
                continue;
            }
            for record in &group.links {
                if matches!(record.status, LinkStatus::Planned | LinkStatus::Skipped) {
                    continue;
                }
                writeln!(
                    out,
                    "Creating hard link for \"{}\" to \"{}\"",
                    record.plan.source.path.display(),
                    record.plan.destination.path.display()
                )?;
                if let Some(ref message) = record.error {
                    writeln!(err, "{message}")?;
                }
            }
        }

        if self.verbose {
            for error in &self.report.errors {
                // Link failures were printed next to their swap
                if !matches!(error, DedupError::Link(_)) {
                    writeln!(err, "{error}")?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::LinkError;
    use crate::duplicates::{FileRef, GroupReport, LinkPlan, LinkRecord};
    use crate::platform::FileIdentity;
    use crate::scanner::ScanError;
    use std::path::PathBuf;

    fn file(path: &str, object: u64) -> FileRef {
        FileRef {
            identity: Some(FileIdentity::new(1, object)),
            path: PathBuf::from(path),
            size: 100,
        }
    }

    fn report(status: LinkStatus, error: Option<&str>) -> RunReport {
        let mut report = RunReport::default();
        report.groups.push(GroupReport {
            hash: [0; 32],
            size: 100,
            volume: 1,
            mains: vec![file("/d/A", 1), file("/d/B", 2), file("/d/C", 3)],
            links: vec![LinkRecord {
                plan: LinkPlan {
                    source: file("/d/A", 1),
                    destination: file("/d/C", 3),
                },
                status,
                error: error.map(str::to_string),
            }],
        });
        report
            .errors
            .push(ScanError::PermissionDenied(PathBuf::from("/d/locked")).into());
        report
    }

    fn render(report: &RunReport, deduplicate: bool, verbose: bool) -> (String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        TextOutput::new(report, deduplicate, verbose)
            .write_to(&mut out, &mut err)
            .unwrap();
        (String::from_utf8(out).unwrap(), String::from_utf8(err).unwrap())
    }

    #[test]
    fn test_report_only_lists_groups() {
        let (out, err) = render(&report(LinkStatus::Planned, None), false, false);
        assert_eq!(
            out,
            "Duplicates found:\n/d/A (100 bytes)\n/d/B (100 bytes)\n/d/C (100 bytes)\n\n"
        );
        assert!(err.is_empty());
    }

    #[test]
    fn test_quiet_dedupe_prints_nothing() {
        let (out, err) = render(&report(LinkStatus::Linked, None), true, false);
        assert!(out.is_empty());
        assert!(err.is_empty());
    }

    #[test]
    fn test_verbose_dedupe_prints_swaps_and_errors() {
        let (out, err) = render(&report(LinkStatus::Failed, Some("boom")), true, true);
        assert!(out.starts_with("Duplicates found:\n"));
        assert!(out.ends_with("Creating hard link for \"/d/A\" to \"/d/C\"\n"));
        assert_eq!(err, "boom\nPermission denied: /d/locked\n");
    }

    #[test]
    fn test_verbose_prints_each_error_once() {
        let failure = LinkError::Modified(PathBuf::from("/d/C"));
        let message = failure.to_string();
        let mut report = report(LinkStatus::Failed, Some(&message));
        report.errors.push(failure.into());

        let (_, err) = render(&report, true, true);

        assert_eq!(err.matches(&message).count(), 1);
        assert_eq!(err.matches("/d/locked").count(), 1);
    }
}
