//! Sequential benchmark driver.
//!
//! Evaluates every dev-set item that has a usable prediction and snapshot,
//! one at a time, and aggregates the results into a [`Report`].

use super::{BenchmarkItem, Predictions};
use crate::db::SnapshotHandle;
use crate::eval::baseline::is_exact_match;
use crate::eval::{Evaluator, QueryPair};
use crate::report::{ItemResult, Report, Summary};
use std::path::PathBuf;
use tracing::{debug, info};

/// Runs an [`Evaluator`] over a whole dev set.
pub struct BenchmarkRunner {
    evaluator: Evaluator,
    db_dir: PathBuf,
}

impl BenchmarkRunner {
    /// Creates a runner resolving snapshots under `db_dir`.
    pub fn new(evaluator: Evaluator, db_dir: impl Into<PathBuf>) -> Self {
        Self {
            evaluator,
            db_dir: db_dir.into(),
        }
    }

    /// Evaluates `items` against `predictions` in dev-set order.
    ///
    /// Items with a missing or blank prediction, or whose snapshot file does
    /// not exist, are skipped and counted in `total_skipped`.
    pub async fn run(&self, items: &[BenchmarkItem], predictions: &Predictions) -> Report {
        let mut summary = Summary {
            total_from_dev_set: items.len(),
            total_from_model_results: predictions.len(),
            ..Default::default()
        };
        let mut detailed_results = Vec::new();

        for (index, item) in items.iter().enumerate() {
            let Some(generated_sql) = predictions.get(&index).filter(|sql| !sql.trim().is_empty())
            else {
                debug!("Skipping item {}: no prediction", index);
                summary.total_skipped += 1;
                continue;
            };

            let handle = SnapshotHandle::for_item(&self.db_dir, &item.db_id);
            if !handle.exists() {
                debug!("Skipping item {}: snapshot {} not found", index, handle);
                summary.total_skipped += 1;
                continue;
            }

            let pair = QueryPair::new(generated_sql.as_str(), item.query.as_str());
            let outcome = self.evaluator.evaluate(&pair, &handle).await;
            let exact_match = is_exact_match(generated_sql, &item.query);

            summary.total_evaluated += 1;
            if outcome.succeeded() {
                summary.total_successful += 1;
            }
            if exact_match {
                summary.total_exact_matches += 1;
            }

            detailed_results.push(ItemResult {
                index,
                db_id: item.db_id.clone(),
                question: item.question.clone(),
                expected_sql: item.query.clone(),
                generated_sql: generated_sql.clone(),
                success: outcome.succeeded(),
                score: outcome.score(),
                reason: outcome.reason().to_string(),
                exact_match,
            });

            debug!("Items evaluated: {}", summary.total_evaluated);
        }

        summary.finalize();
        info!(
            "Evaluated {} of {} items, {} correct",
            summary.total_evaluated, summary.total_from_dev_set, summary.total_successful
        );

        Report {
            summary,
            detailed_results,
        }
    }
}
