//! Benchmark inputs for sqleval.
//!
//! Loads a Spider-style dev set (a JSON array of items) and the model's
//! predictions (one JSON object per line), and drives the evaluator over
//! them.

mod runner;

pub use runner::BenchmarkRunner;

use crate::error::{EvalError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// One evaluation unit of the dev set.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BenchmarkItem {
    /// Name of the snapshot the queries run against.
    pub db_id: String,
    /// Reference query.
    pub query: String,
    /// Natural-language question.
    #[serde(default)]
    pub question: String,
}

/// Generated SQL keyed by dev-set index.
pub type Predictions = HashMap<usize, String>;

#[derive(Debug, Deserialize)]
struct PredictionLine {
    index: Option<usize>,
    #[serde(default)]
    generated_sql: String,
}

/// Loads the dev set from a JSON array.
pub fn load_dev_set(path: &Path) -> Result<Vec<BenchmarkItem>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        EvalError::benchmark(format!("Failed to read dev set {}: {e}", path.display()))
    })?;

    let items: Vec<BenchmarkItem> = serde_json::from_str(&content).map_err(|e| {
        EvalError::benchmark(format!("{} is not a valid dev set: {e}", path.display()))
    })?;

    info!("Loaded {} items from {}", items.len(), path.display());
    Ok(items)
}

/// Loads predictions from a JSON Lines file.
pub fn load_predictions(path: &Path) -> Result<Predictions> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        EvalError::benchmark(format!(
            "Failed to read predictions {}: {e}",
            path.display()
        ))
    })?;

    let predictions = parse_predictions(&content)?;
    info!(
        "Loaded {} predictions from {}",
        predictions.len(),
        path.display()
    );
    Ok(predictions)
}

/// Parses predictions, one object per line.
///
/// A line without `index` takes its 0-based line position. Blank lines are
/// skipped but still count as a position.
pub fn parse_predictions(content: &str) -> Result<Predictions> {
    let mut predictions = Predictions::new();

    for (position, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let parsed: PredictionLine = serde_json::from_str(line).map_err(|e| {
            EvalError::benchmark(format!("predictions line {}: {e}", position + 1))
        })?;

        predictions.insert(
            parsed.index.unwrap_or(position),
            parsed.generated_sql.trim().to_string(),
        );
    }

    Ok(predictions)
}
