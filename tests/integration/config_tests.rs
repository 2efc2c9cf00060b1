use linkdupe::cli::OutputFormat;
use linkdupe::config::{Config, ConfigError};
use std::fs;
use tempfile::tempdir;

use crate::ENV_MUTEX;

#[test]
fn test_load_explicit_file() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempdir().unwrap();
    let path = dir.path().join("linkdupe.toml");
    fs::write(&path, "min_size = 4096\nkeep_minimum = true\n").unwrap();

    let config = Config::load(Some(&path)).unwrap();

    assert_eq!(config.min_size, 4096);
    assert!(config.keep_minimum);
    assert_eq!(config.output, OutputFormat::Text);
}

#[test]
fn test_env_overrides_file() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempdir().unwrap();
    let path = dir.path().join("linkdupe.toml");
    fs::write(&path, "min_size = 4096\n").unwrap();

    std::env::set_var("LINKDUPE_MIN_SIZE", "77");
    std::env::set_var("LINKDUPE_OUTPUT", "json");
    let config = Config::load(Some(&path));
    std::env::remove_var("LINKDUPE_MIN_SIZE");
    std::env::remove_var("LINKDUPE_OUTPUT");

    let config = config.unwrap();
    assert_eq!(config.min_size, 77);
    assert_eq!(config.output, OutputFormat::Json);
}

#[test]
fn test_invalid_file_is_error() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempdir().unwrap();
    let path = dir.path().join("linkdupe.toml");
    fs::write(&path, "output = \"xml\"\n").unwrap();

    let err = Config::load(Some(&path)).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_missing_file_is_error() {
    let dir = tempdir().unwrap();
    let err = Config::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert!(err.to_string().contains("absent.toml"));
}
