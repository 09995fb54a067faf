//! Evaluation report.
//!
//! Collects per-item results and the aggregate summary, and writes them as
//! pretty-printed JSON.

use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::info;

/// Result of one evaluated benchmark item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResult {
    pub index: usize,
    pub db_id: String,
    pub question: String,
    pub expected_sql: String,
    pub generated_sql: String,
    pub success: bool,
    pub score: f64,
    pub reason: String,
    /// Normalized string equality with the reference (baseline metric).
    pub exact_match: bool,
}

/// Aggregate counts over a benchmark run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_from_dev_set: usize,
    pub total_from_model_results: usize,
    pub total_evaluated: usize,
    pub total_successful: usize,
    /// `total_successful / total_evaluated`, 0 when nothing was evaluated.
    pub accuracy: f64,
    pub total_exact_matches: usize,
    pub exact_match_accuracy: f64,
    /// Items without a usable prediction or snapshot.
    pub total_skipped: usize,
}

impl Summary {
    /// Recomputes both accuracies from the counts.
    pub fn finalize(&mut self) {
        self.accuracy = ratio(self.total_successful, self.total_evaluated);
        self.exact_match_accuracy = ratio(self.total_exact_matches, self.total_evaluated);
    }
}

fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Evaluation summary")?;
        writeln!(f, "  Queries evaluated:   {}", self.total_evaluated)?;
        writeln!(f, "  Queries correct:     {}", self.total_successful)?;
        writeln!(f, "  Execution accuracy:  {:.2}%", self.accuracy * 100.0)?;
        writeln!(
            f,
            "  Exact-match accuracy: {:.2}%",
            self.exact_match_accuracy * 100.0
        )?;
        write!(f, "  Skipped items:       {}", self.total_skipped)
    }
}

/// Full report of a benchmark run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub summary: Summary,
    pub detailed_results: Vec<ItemResult>,
}

impl Report {
    /// Serializes the report as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| EvalError::internal(format!("Failed to serialize report: {e}")))
    }

    /// Writes the report to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    EvalError::io(format!(
                        "Failed to create report directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        std::fs::write(path, self.to_json()?).map_err(|e| {
            EvalError::io(format!("Failed to write report {}: {e}", path.display()))
        })?;

        info!("Report written to {}", path.display());
        Ok(())
    }
}
