//! Configuration management for sqleval.
//!
//! Handles loading evaluation settings from a TOML file. Command-line flags
//! override file values, which override the built-in defaults.

use crate::error::{EvalError, Result};
use crate::eval::{DEFAULT_QUERY_TIMEOUT, DEFAULT_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for sqleval.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Scoring settings.
    #[serde(default)]
    pub evaluation: EvaluationConfig,

    /// Snapshot connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Scoring settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationConfig {
    /// Score needed for an item to count as successful.
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Wall-clock budget per query, in seconds.
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_query_timeout_secs() -> u64 {
    DEFAULT_QUERY_TIMEOUT.as_secs()
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            query_timeout_secs: default_query_timeout_secs(),
        }
    }
}

/// Snapshot connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseConfig {
    /// Open snapshots read-only so predicted queries cannot modify them.
    #[serde(default)]
    pub read_only: bool,

    /// How long SQLite waits on a locked snapshot, in seconds.
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,

    /// How long to wait for the connection to open, in seconds.
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

fn default_busy_timeout_secs() -> u64 {
    5
}

fn default_acquire_timeout_secs() -> u64 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            read_only: false,
            busy_timeout_secs: default_busy_timeout_secs(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }
}

/// Values given on the command line, each overriding the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub threshold: Option<f64>,
    pub query_timeout_secs: Option<u64>,
    pub read_only: bool,
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sqleval")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    ///
    /// A missing file yields the defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| EvalError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            EvalError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Applies command-line overrides and re-validates.
    pub fn apply_overrides(mut self, overrides: &Overrides) -> Result<Self> {
        if let Some(threshold) = overrides.threshold {
            self.evaluation.threshold = threshold;
        }
        if let Some(secs) = overrides.query_timeout_secs {
            self.evaluation.query_timeout_secs = secs;
        }
        if overrides.read_only {
            self.database.read_only = true;
        }
        self.validate()?;
        Ok(self)
    }

    /// Checks that every value is in range.
    pub fn validate(&self) -> Result<()> {
        let threshold = self.evaluation.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(EvalError::config(format!(
                "threshold must be between 0 and 1, got {threshold}"
            )));
        }
        if self.evaluation.query_timeout_secs == 0 {
            return Err(EvalError::config("query_timeout_secs must be positive"));
        }
        Ok(())
    }
}
