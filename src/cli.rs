//! Command-line argument parsing for sqleval.

use crate::config::{Config, Overrides};
use clap::Parser;
use std::path::PathBuf;

/// Execution-accuracy evaluation of generated SQL on a text-to-SQL benchmark.
#[derive(Parser, Debug)]
#[command(name = "sqleval")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Model predictions, one JSON object per line ({"index": .., "generated_sql": ..})
    #[arg(long, value_name = "PATH")]
    pub results: PathBuf,

    /// Benchmark dev set (JSON array of {db_id, query, question})
    #[arg(long, value_name = "PATH")]
    pub dev_file: PathBuf,

    /// Directory holding one <db_id>/<db_id>.sqlite snapshot per database
    #[arg(long, value_name = "DIR", env = "SQLEVAL_DB_DIR")]
    pub db_dir: PathBuf,

    /// Where to write the JSON report
    #[arg(long, value_name = "PATH")]
    pub output: PathBuf,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Score needed for an item to pass (0..=1)
    #[arg(long, value_name = "SCORE")]
    pub threshold: Option<f64>,

    /// Per-query timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Open snapshots read-only
    #[arg(long)]
    pub read_only: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Returns the configuration values set on the command line.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            threshold: self.threshold,
            query_timeout_secs: self.timeout_secs,
            read_only: self.read_only,
        }
    }
}
