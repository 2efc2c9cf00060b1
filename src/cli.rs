//! Command-line interface definitions for linkdupe.
//!
//! Global options control verbosity and the configuration file; the
//! subcommands choose between reporting, deduplicating and recovering.
//!
//! # Example
//!
//! ```bash
//! # Report duplicates that have three or more independent copies
//! linkdupe scan ~/media
//!
//! # Link every duplicate down to one copy, printing each swap
//! linkdupe -v dedupe ~/media --all
//!
//! # Restore backups left by an interrupted run
//! linkdupe recover ~/media
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Replace identical files with hard links to reclaim space.
#[derive(Debug, Parser)]
#[command(name = "linkdupe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace). Also prints
    /// every swap and every error.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors and the final report.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file to use instead of the default location.
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Report duplicate groups without changing anything.
    Scan(ScanArgs),

    /// Replace duplicates with hard links.
    Dedupe(ScanArgs),

    /// Restore backups left behind by an interrupted run.
    Recover(RecoverArgs),
}

/// Arguments shared by `scan` and `dedupe`.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory to process.
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Keep a single copy of each file instead of one extra.
    #[arg(short = 'a', long = "all")]
    pub keep_minimum: bool,

    /// Minimum file size to consider (e.g., 1024, 4KiB, 1MB).
    #[arg(short = 's', long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Report format.
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,
}

/// Arguments for `recover`.
#[derive(Debug, Args)]
pub struct RecoverArgs {
    /// Directory to search for leftover backups.
    #[arg(value_name = "PATH")]
    pub path: PathBuf,
}

/// Report format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable report
    #[default]
    Text,
    /// Machine-readable JSON report
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Accepts plain numbers and decimal (KB, MB, GB, TB) or binary (KiB, MiB,
/// GiB, TiB) suffixes, case-insensitive.
///
/// # Errors
///
/// Returns an error message for empty input, invalid numbers or unknown
/// suffixes.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size_bytes() {
        assert_eq!(parse_size("1024").unwrap(), 1024);
        assert_eq!(parse_size("1024B").unwrap(), 1024);
        assert_eq!(parse_size("0").unwrap(), 0);
    }

    #[test]
    fn test_parse_size_suffixes() {
        assert_eq!(parse_size("1K").unwrap(), 1_000);
        assert_eq!(parse_size("1kib").unwrap(), 1_024);
        assert_eq!(parse_size("1MiB").unwrap(), 1_048_576);
        assert_eq!(parse_size("1GB").unwrap(), 1_000_000_000);
        assert_eq!(parse_size("1TiB").unwrap(), 1_099_511_627_776);
    }

    #[test]
    fn test_parse_size_fractional_and_whitespace() {
        assert_eq!(parse_size("1.5MB").unwrap(), 1_500_000);
        assert_eq!(parse_size("  1024  ").unwrap(), 1024);
        assert_eq!(parse_size("1 MB").unwrap(), 1_000_000);
    }

    #[test]
    fn test_parse_size_errors() {
        assert!(parse_size("").is_err());
        assert!(parse_size("abc").is_err());
        assert!(parse_size("1XB").is_err());
        assert!(parse_size("-1MB").is_err());
    }

    #[test]
    fn test_cli_parse_help() {
        let result = Cli::try_parse_from(["linkdupe", "--help"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_scan_basic() {
        let cli = Cli::try_parse_from(["linkdupe", "scan", "/some/path"]).unwrap();
        assert_eq!(cli.verbose, 0);
        match cli.command {
            Commands::Scan(args) => {
                assert_eq!(args.path, PathBuf::from("/some/path"));
                assert!(!args.keep_minimum);
                assert_eq!(args.min_size, None);
                assert_eq!(args.output, None);
            }
            _ => panic!("Expected Scan command"),
        }
    }

    #[test]
    fn test_cli_parse_dedupe_short_flags() {
        let cli =
            Cli::try_parse_from(["linkdupe", "-vv", "dedupe", "/p", "-a", "-s", "4KiB"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Dedupe(args) => {
                assert!(args.keep_minimum);
                assert_eq!(args.min_size, Some(4096));
            }
            _ => panic!("Expected Dedupe command"),
        }
    }

    #[test]
    fn test_cli_parse_output_json() {
        let cli = Cli::try_parse_from(["linkdupe", "scan", "/p", "--output", "json"]).unwrap();
        match cli.command {
            Commands::Scan(args) => assert_eq!(args.output, Some(OutputFormat::Json)),
            _ => panic!("Expected Scan command"),
        }
    }

    #[test]
    fn test_cli_parse_recover_with_config() {
        let cli =
            Cli::try_parse_from(["linkdupe", "recover", "/p", "--config", "/etc/l.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/l.toml")));
        assert!(matches!(cli.command, Commands::Recover(_)));
    }

    #[test]
    fn test_cli_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["linkdupe", "-v", "-q", "scan", "/path"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_requires_path() {
        assert!(Cli::try_parse_from(["linkdupe", "scan"]).is_err());
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Text.to_string(), "text");
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }
}
