//! Error types for sqleval.
//!
//! Defines the main error enum used by the snapshot layer, the benchmark
//! driver and the binary. The evaluator itself never surfaces these to its
//! caller; it folds them into a failing outcome.

use thiserror::Error;

/// Main error type for sqleval operations.
#[derive(Error, Debug)]
pub enum EvalError {
    /// Snapshot connection errors (missing file, locked database, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution errors (syntax errors, missing tables, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// A query exceeded its wall-clock budget.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Configuration errors (invalid config file, out-of-range values, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Benchmark input errors (unreadable dev set, malformed predictions, etc.)
    #[error("Benchmark error: {0}")]
    Benchmark(String),

    /// Filesystem errors while writing reports or logs.
    #[error("I/O error: {0}")]
    Io(String),

    /// Internal errors (runtime construction, unexpected states, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EvalError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a timeout error with the given message.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a benchmark input error with the given message.
    pub fn benchmark(msg: impl Into<String>) -> Self {
        Self::Benchmark(msg.into())
    }

    /// Creates an I/O error with the given message.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Timeout(_) => "Timeout",
            Self::Config(_) => "Configuration Error",
            Self::Benchmark(_) => "Benchmark Error",
            Self::Io(_) => "I/O Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns the bare message without the category prefix.
    ///
    /// Used when the message is embedded in an evaluation reason, where the
    /// engine's own wording is what a reader wants to see.
    pub fn detail(&self) -> &str {
        match self {
            Self::Connection(msg)
            | Self::Query(msg)
            | Self::Timeout(msg)
            | Self::Config(msg)
            | Self::Benchmark(msg)
            | Self::Io(msg)
            | Self::Internal(msg) => msg,
        }
    }
}

/// Result type alias using EvalError.
pub type Result<T> = std::result::Result<T, EvalError>;
