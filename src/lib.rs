//! linkdupe - reclaim space by replacing identical files with hard links.
//!
//! Files on one volume with equal size and equal BLAKE3 digest are
//! duplicates. By default a set is only touched once it has three or more
//! independent copies; two are retained and the rest become hard links to
//! them. With `--all` everything is linked down to a single copy. Each
//! replacement is an atomic swap through a backup file, rolled back on
//! failure and restored by the next run if the process dies mid-swap.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod platform;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{self, IsTerminal};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cli::{Cli, Commands, OutputFormat};
use crate::config::Config;
use crate::duplicates::{DedupConfig, Deduplicator, KeepPolicy, RunReport};
use crate::error::ExitCode;
use crate::output::{JsonOutput, TextOutput};
use crate::progress::Progress;

/// Run the command described by `cli`.
///
/// # Errors
///
/// Returns an error for fatal conditions only: unreadable configuration,
/// a missing or non-directory root, an unsupported platform, or a failure
/// to write the report.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    let Cli {
        verbose,
        quiet,
        config,
        command,
    } = cli;

    logging::init_logging(verbose, quiet);

    match command {
        Commands::Scan(args) => {
            let settings = Config::load(config.as_deref())
                .context("Failed to load configuration")?
                .merge_cli(&args);
            run_dedup(&args.path, &settings, false, verbose, quiet)
        }
        Commands::Dedupe(args) => {
            let settings = Config::load(config.as_deref())
                .context("Failed to load configuration")?
                .merge_cli(&args);
            run_dedup(&args.path, &settings, true, verbose, quiet)
        }
        Commands::Recover(args) => run_recover(&args.path),
    }
}

fn run_dedup(
    root: &Path,
    settings: &Config,
    deduplicate: bool,
    verbose: u8,
    quiet: bool,
) -> Result<ExitCode> {
    let handler = signal::install_handler()?;
    let json = settings.output == OutputFormat::Json;

    let mut dedup_config = DedupConfig::default()
        .with_policy(KeepPolicy::from_keep_minimum(settings.keep_minimum))
        .with_deduplicate(deduplicate)
        .with_min_size(settings.min_size)
        .with_shutdown_flag(handler.get_flag());
    if !quiet && !json && verbose == 0 && io::stderr().is_terminal() {
        dedup_config = dedup_config.with_progress_callback(Arc::new(Progress::new(false)));
    }

    log::debug!("Run configuration: {:?}", dedup_config);

    let deduplicator = Deduplicator::with_native(dedup_config)?;
    let report = deduplicator
        .run(root)
        .with_context(|| format!("Cannot process {}", root.display()))?;

    let exit_code = if report.summary.interrupted || handler.is_shutdown_requested() {
        ExitCode::Interrupted
    } else {
        ExitCode::Success
    };

    if json {
        JsonOutput::new(&report, exit_code).write_to(&mut io::stdout().lock(), true)?;
    } else {
        TextOutput::new(&report, deduplicate, verbose > 0)
            .write_to(&mut io::stdout().lock(), &mut io::stderr().lock())
            .context("Failed to write report")?;
    }

    log_summary(&report, deduplicate, verbose > 0);
    Ok(exit_code)
}

fn log_summary(report: &RunReport, deduplicate: bool, verbose: bool) {
    let s = &report.summary;
    if deduplicate {
        log::info!(
            "{} files scanned, {} duplicate groups, {} hard links created, {} failed, {} reclaimed",
            s.total_files,
            s.duplicate_groups,
            s.links_created,
            s.links_failed,
            s.reclaimed_display()
        );
    } else {
        log::info!(
            "{} files scanned, {} duplicate groups, {} files could be linked ({} reclaimable)",
            s.total_files,
            s.duplicate_groups,
            s.planned_links,
            s.reclaimable_display()
        );
    }
    if !report.errors.is_empty() && !verbose {
        log::info!("{} errors occurred (use -v to show)", report.errors.len());
    }
    if s.interrupted {
        log::info!("Run was interrupted; results are partial");
    }
}

fn run_recover(root: &Path) -> Result<ExitCode> {
    if !root.is_dir() {
        anyhow::bail!("Not a directory: {}", root.display());
    }

    let summary = scanner::recovery::recover_tree(root);
    for path in &summary.restored {
        println!("Restored {}", path.display());
    }
    for error in &summary.errors {
        log::error!("{}", error);
    }
    log::info!(
        "{} backups restored, {} errors",
        summary.restored.len(),
        summary.errors.len()
    );
    Ok(ExitCode::Success)
}
