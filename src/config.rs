//! Layered application configuration.
//!
//! Settings are merged with figment, later layers winning:
//!
//! 1. Built-in defaults
//! 2. A TOML file: `--config FILE`, or `config.toml` in the platform
//!    configuration directory if it exists
//! 3. `LINKDUPE_*` environment variables (`LINKDUPE_MIN_SIZE=4096`)
//! 4. Command-line flags
//!
//! ```toml
//! min_size = 4096
//! keep_minimum = true
//! output = "json"
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::{OutputFormat, ScanArgs};

/// Default minimum candidate size in bytes.
pub const DEFAULT_MIN_SIZE: u64 = 1024;

/// Prefix of environment variables read into the configuration.
pub const ENV_PREFIX: &str = "LINKDUPE_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Files smaller than this are never considered.
    pub min_size: u64,
    /// Keep a single copy instead of one extra.
    pub keep_minimum: bool,
    /// Report format.
    pub output: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_size: DEFAULT_MIN_SIZE,
            keep_minimum: false,
            output: OutputFormat::Text,
        }
    }
}

/// Errors raised while loading configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// A layer could not be parsed or has a wrong type.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),
}

impl Config {
    /// Load defaults, the config file and the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if `explicit` names a missing file
    /// and [`ConfigError::Invalid`] if any layer fails to parse.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match explicit {
            Some(path) if !path.is_file() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|p| p.is_file()),
        };
        Self::figment(file.as_deref())
            .extract()
            .map_err(|e| ConfigError::Invalid(Box::new(e)))
    }

    /// The layered figment, without command-line overrides.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = file {
            log::debug!("Loading configuration from {}", path.display());
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// `config.toml` in the platform configuration directory.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "linkdupe", "linkdupe")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply command-line flags on top of the loaded layers.
    ///
    /// Flags only override when given: `--all` can switch keep-minimum on
    /// but its absence does not switch a configured `true` off.
    #[must_use]
    pub fn merge_cli(mut self, args: &ScanArgs) -> Self {
        if let Some(min_size) = args.min_size {
            self.min_size = min_size;
        }
        if args.keep_minimum {
            self.keep_minimum = true;
        }
        if let Some(output) = args.output {
            self.output = output;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn args(min_size: Option<u64>, keep_minimum: bool, output: Option<OutputFormat>) -> ScanArgs {
        ScanArgs {
            path: PathBuf::from("."),
            keep_minimum,
            min_size,
            output,
        }
    }

    #[test]
    fn test_defaults() {
        let config: Config = Figment::from(Serialized::defaults(Config::default()))
            .extract()
            .unwrap();
        assert_eq!(config.min_size, 1024);
        assert!(!config.keep_minimum);
        assert_eq!(config.output, OutputFormat::Text);
    }

    #[test]
    fn test_toml_layer() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "min_size = 10\noutput = \"json\"\n").unwrap();

        let config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(&path))
            .extract()
            .unwrap();

        assert_eq!(config.min_size, 10);
        assert_eq!(config.output, OutputFormat::Json);
        assert!(!config.keep_minimum);
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "min_size = \"lots\"\n").unwrap();

        let result: Result<Config, _> = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(&path))
            .extract();
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_merge_cli_overrides_given_flags_only() {
        let base = Config {
            min_size: 10,
            keep_minimum: true,
            output: OutputFormat::Json,
        };

        let merged = base.clone().merge_cli(&args(None, false, None));
        assert_eq!(merged, base);

        let merged = Config::default().merge_cli(&args(Some(1), true, Some(OutputFormat::Json)));
        assert_eq!(merged.min_size, 1);
        assert!(merged.keep_minimum);
        assert_eq!(merged.output, OutputFormat::Json);
    }
}
