//! Configuration management for the Vigil verification engine.
//!
//! Parses `vigil.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories. Every section and
//! field is optional; missing values fall back to the stock defaults, so a
//! project without a config file behaves identically to one with an empty
//! `vigil.toml`.
//!
//! ```toml
//! [polling]
//! initial_delay_ms = 0
//! interval_ms = 1000
//! attempts = 10
//! timeout_ms = 30000
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "vigil.toml";

/// Error raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("unable to read '{path}': {source}")]
    Io {
        /// Path of the config file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("unable to parse '{path}': {source}")]
    Parse {
        /// Path of the config file.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
}

/// Application configuration.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Polling defaults applied to every verification driver.
    pub polling: PollingConfig,
}

/// Polling defaults.
///
/// Drivers start from these values; per-driver overrides win over the
/// config file, which wins over the stock defaults.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PollingConfig {
    /// Delay before the first poll, in milliseconds.
    pub initial_delay_ms: u64,
    /// Sleep between polls, in milliseconds.
    pub interval_ms: u64,
    /// Maximum number of polls per verification.
    pub attempts: u32,
    /// Overall wall-clock deadline per verification, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 0,
            interval_ms: 1_000,
            attempts: 10,
            timeout_ms: 30_000,
        }
    }
}

impl Config {
    /// Load configuration from a specific file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Discover and load a `vigil.toml`, walking up from `start_dir`.
    ///
    /// Returns the defaults when no config file exists in `start_dir` or
    /// any of its ancestors.
    pub fn discover(start_dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut dir = Some(start_dir.as_ref());
        while let Some(current) = dir {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.is_file() {
                return Self::load(candidate);
            }
            dir = current.parent();
        }
        Ok(Self::default())
    }
}
