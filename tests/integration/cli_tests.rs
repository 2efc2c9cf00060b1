use clap::Parser;
use linkdupe::cli::Cli;
use linkdupe::error::ExitCode;
use linkdupe::run_app;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

use crate::{identity, write_file, ENV_MUTEX};

fn run_cli(args: &[&str], config: &Path) -> anyhow::Result<ExitCode> {
    let mut argv = vec!["linkdupe", "-q", "--config", config.to_str().unwrap()];
    argv.extend_from_slice(args);
    run_app(Cli::try_parse_from(argv).unwrap())
}

fn empty_config(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    fs::write(&path, "").unwrap();
    path
}

#[test]
fn test_scan_changes_nothing() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let cfg = tempdir().unwrap();
    let dir = tempdir().unwrap();
    let a = write_file(dir.path(), "a", b"scan only");
    let b = write_file(dir.path(), "b", b"scan only");

    let code = run_cli(
        &["scan", dir.path().to_str().unwrap(), "-a", "-s", "1"],
        &empty_config(cfg.path()),
    )
    .unwrap();

    assert_eq!(code, ExitCode::Success);
    assert_ne!(identity(&a), identity(&b));
}

#[test]
fn test_dedupe_all_links() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let cfg = tempdir().unwrap();
    let dir = tempdir().unwrap();
    let a = write_file(dir.path(), "a", b"link me");
    let b = write_file(dir.path(), "b", b"link me");

    let code = run_cli(
        &["dedupe", dir.path().to_str().unwrap(), "--all", "--min-size", "1"],
        &empty_config(cfg.path()),
    )
    .unwrap();

    assert_eq!(code, ExitCode::Success);
    assert_eq!(identity(&a), identity(&b));
}

#[test]
fn test_config_file_supplies_keep_minimum() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let cfg = tempdir().unwrap();
    let config = cfg.path().join("config.toml");
    fs::write(&config, "keep_minimum = true\nmin_size = 1\noutput = \"json\"\n").unwrap();
    let dir = tempdir().unwrap();
    let a = write_file(dir.path(), "a", b"configured");
    let b = write_file(dir.path(), "b", b"configured");

    run_cli(&["dedupe", dir.path().to_str().unwrap()], &config).unwrap();

    assert_eq!(identity(&a), identity(&b));
}

#[test]
fn test_default_min_size_skips_small_files() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let cfg = tempdir().unwrap();
    let dir = tempdir().unwrap();
    let a = write_file(dir.path(), "a", b"under a kilobyte");
    let b = write_file(dir.path(), "b", b"under a kilobyte");

    run_cli(
        &["dedupe", dir.path().to_str().unwrap(), "-a"],
        &empty_config(cfg.path()),
    )
    .unwrap();

    assert_ne!(identity(&a), identity(&b));
}

#[test]
fn test_missing_root_is_fatal() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let cfg = tempdir().unwrap();
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope");

    let result = run_cli(&["scan", missing.to_str().unwrap()], &empty_config(cfg.path()));
    assert!(result.is_err());
}

#[test]
fn test_recover_command() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let cfg = tempdir().unwrap();
    let dir = tempdir().unwrap();
    let f = write_file(dir.path(), "f", b"restore me");
    fs::rename(&f, linkdupe::scanner::backup_path_for(&f)).unwrap();

    let code = run_cli(
        &["recover", dir.path().to_str().unwrap()],
        &empty_config(cfg.path()),
    )
    .unwrap();

    assert_eq!(code, ExitCode::Success);
    assert_eq!(fs::read(&f).unwrap(), b"restore me");
}
