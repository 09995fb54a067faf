//! Execution-based equivalence evaluation.
//!
//! Runs a predicted query and a reference query against the same snapshot
//! and decides whether they are equivalent by comparing the rows they
//! return. Every failure mode ends up as a failing [`EvaluationOutcome`];
//! nothing is returned as an error to the caller.

pub mod baseline;
mod compare;

pub use compare::{results_equivalent, RowSet};

use crate::config::EvaluationConfig;
use crate::db::{QueryResult, SnapshotClient, SnapshotConnector, SnapshotHandle};
use crate::error::{EvalError, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Score needed to pass when no threshold is configured.
pub const DEFAULT_THRESHOLD: f64 = 1.0;

/// Wall-clock budget for a single query when none is configured.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Reason given when both queries return the same row set.
pub const REASON_IDENTICAL: &str = "execution results are identical";

/// Reason given when the row sets differ.
pub const REASON_DIVERGE: &str = "execution results diverge";

/// The two queries of one benchmark item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPair {
    /// Query produced by the model under test.
    pub predicted: String,
    /// Gold query from the benchmark.
    pub reference: String,
}

impl QueryPair {
    /// Creates a query pair.
    pub fn new(predicted: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            predicted: predicted.into(),
            reference: reference.into(),
        }
    }
}

/// Which side of the pair a query came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Predicted,
    Reference,
}

impl Side {
    fn label(self) -> &'static str {
        match self {
            Self::Predicted => "predicted",
            Self::Reference => "reference",
        }
    }
}

/// Result of evaluating one query pair.
///
/// `succeeded` is always `score >= threshold` for the threshold the outcome
/// was built with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationOutcome {
    score: f64,
    succeeded: bool,
    reason: String,
}

impl EvaluationOutcome {
    fn scored(score: f64, reason: impl Into<String>, threshold: f64) -> Self {
        Self {
            score,
            succeeded: score >= threshold,
            reason: reason.into(),
        }
    }

    /// Creates a full-score outcome.
    pub fn pass(reason: impl Into<String>, threshold: f64) -> Self {
        Self::scored(1.0, reason, threshold)
    }

    /// Creates a zero-score outcome.
    pub fn fail(reason: impl Into<String>, threshold: f64) -> Self {
        Self::scored(0.0, reason, threshold)
    }

    /// Score in `[0, 1]`.
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Whether the score reached the pass bar.
    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    /// Human-readable explanation of the score.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Decides equivalence of query pairs by execution.
///
/// The connector and pass bar are injected; an evaluator holds no state
/// between calls and can be reused for any number of pairs.
#[derive(Clone)]
pub struct Evaluator {
    connector: Arc<dyn SnapshotConnector>,
    threshold: f64,
    query_timeout: Duration,
}

impl Evaluator {
    /// Creates an evaluator with the default threshold and query timeout.
    pub fn new(connector: Arc<dyn SnapshotConnector>) -> Self {
        Self {
            connector,
            threshold: DEFAULT_THRESHOLD,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    /// Creates an evaluator from the `[evaluation]` configuration section.
    pub fn from_config(connector: Arc<dyn SnapshotConnector>, config: &EvaluationConfig) -> Self {
        Self::new(connector)
            .with_threshold(config.threshold)
            .with_query_timeout(Duration::from_secs(config.query_timeout_secs))
    }

    /// Sets the score needed to pass.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sets the wall-clock budget for each query.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Evaluates one query pair against the snapshot behind `handle`.
    ///
    /// The connection is closed on every path, including query failures and
    /// timeouts.
    pub async fn evaluate(&self, pair: &QueryPair, handle: &SnapshotHandle) -> EvaluationOutcome {
        let client = match self.connector.open(handle).await {
            Ok(client) => client,
            Err(e) => {
                warn!("Could not open {}: {}", handle, e);
                return self.unexpected(&e);
            }
        };

        let outcome = self.compare_on(client.as_ref(), pair).await;

        if let Err(e) = client.close().await {
            warn!("Failed to close {}: {}", handle, e);
        }

        debug!(
            "Evaluated pair on {}: score={} reason={}",
            handle, outcome.score, outcome.reason
        );
        outcome
    }

    /// Blocking variant of [`Evaluator::evaluate`].
    ///
    /// Drives the same code path on a private current-thread runtime. Must
    /// not be called from inside an async runtime; doing so yields a failing
    /// outcome instead of a panic.
    pub fn evaluate_blocking(
        &self,
        pair: &QueryPair,
        handle: &SnapshotHandle,
    ) -> EvaluationOutcome {
        if tokio::runtime::Handle::try_current().is_ok() {
            return self.unexpected(&EvalError::internal(
                "blocking evaluation called from within an async runtime",
            ));
        }

        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                return self.unexpected(&EvalError::internal(format!(
                    "failed to start runtime: {e}"
                )))
            }
        };

        runtime.block_on(self.evaluate(pair, handle))
    }

    async fn compare_on(&self, client: &dyn SnapshotClient, pair: &QueryPair) -> EvaluationOutcome {
        let predicted = match self.run_query(client, &pair.predicted).await {
            Ok(result) => result,
            Err(e) => return self.execution_failed(Side::Predicted, &e),
        };

        let reference = match self.run_query(client, &pair.reference).await {
            Ok(result) => result,
            Err(e) => return self.execution_failed(Side::Reference, &e),
        };

        if results_equivalent(&predicted, &reference) {
            EvaluationOutcome::pass(REASON_IDENTICAL, self.threshold)
        } else {
            debug!(
                "Row sets differ: predicted {} rows, reference {} rows",
                predicted.row_count, reference.row_count
            );
            EvaluationOutcome::fail(REASON_DIVERGE, self.threshold)
        }
    }

    async fn run_query(&self, client: &dyn SnapshotClient, sql: &str) -> Result<QueryResult> {
        match tokio::time::timeout(self.query_timeout, client.execute_query(sql)).await {
            Ok(result) => result,
            Err(_) => {
                client.interrupt();
                Err(EvalError::timeout(format!(
                    "query timed out after {:?}",
                    self.query_timeout
                )))
            }
        }
    }

    fn execution_failed(&self, side: Side, error: &EvalError) -> EvaluationOutcome {
        EvaluationOutcome::fail(
            format!("{} query execution failed: {}", side.label(), error.detail()),
            self.threshold,
        )
    }

    fn unexpected(&self, error: &EvalError) -> EvaluationOutcome {
        EvaluationOutcome::fail(
            format!("unexpected error during evaluation: {error}"),
            self.threshold,
        )
    }
}
