//! sqleval - execution-accuracy evaluation for text-to-SQL benchmarks.
//!
//! Predicted and reference queries are run against the same SQLite
//! snapshot and judged equivalent when they return the same set of rows.

pub mod benchmark;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod eval;
pub mod logging;
pub mod report;
