//! Evaluator integration tests.
//!
//! Runs query pairs against real SQLite snapshots.

use super::fixtures::{create_snapshot, department_management};
use sql_exec_eval::config::DatabaseConfig;
use sql_exec_eval::db::{SnapshotHandle, SqliteConnector};
use sql_exec_eval::eval::{
    EvaluationOutcome, Evaluator, QueryPair, REASON_DIVERGE, REASON_IDENTICAL,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

fn evaluator() -> Evaluator {
    Evaluator::new(Arc::new(SqliteConnector::default()))
}

async fn evaluate(handle: &SnapshotHandle, predicted: &str, reference: &str) -> EvaluationOutcome {
    evaluator()
        .evaluate(&QueryPair::new(predicted, reference), handle)
        .await
}

#[tokio::test]
async fn test_identical_queries_pass() {
    let dir = tempdir().unwrap();
    let handle = department_management(dir.path()).await;

    let sql = "SELECT count(*) FROM head WHERE age > 55";
    let outcome = evaluate(&handle, sql, sql).await;

    assert!(outcome.succeeded());
    assert_eq!(outcome.score(), 1.0);
    assert_eq!(outcome.reason(), REASON_IDENTICAL);
}

#[tokio::test]
async fn test_row_order_does_not_matter() {
    let dir = tempdir().unwrap();
    let handle = department_management(dir.path()).await;

    let outcome = evaluate(
        &handle,
        "SELECT Dname FROM department ORDER BY Dname DESC",
        "SELECT Dname FROM department ORDER BY Dname ASC",
    )
    .await;

    assert!(outcome.succeeded());
}

#[tokio::test]
async fn test_predicted_failure_is_reported() {
    let dir = tempdir().unwrap();
    let handle = department_management(dir.path()).await;

    let outcome = evaluate(&handle, "SELECT * FROM nonexistent_table", "SELECT 1").await;

    assert!(!outcome.succeeded());
    assert_eq!(outcome.score(), 0.0);
    assert!(outcome
        .reason()
        .starts_with("predicted query execution failed: "));
    assert!(outcome.reason().contains("nonexistent_table"));
}

#[tokio::test]
async fn test_column_name_case_is_irrelevant() {
    let dir = tempdir().unwrap();
    let handle = department_management(dir.path()).await;

    let outcome = evaluate(
        &handle,
        "SELECT dname FROM department",
        "SELECT Dname FROM department",
    )
    .await;

    assert!(outcome.succeeded());
}

#[tokio::test]
async fn test_reference_failure_is_reported() {
    let dir = tempdir().unwrap();
    let handle = department_management(dir.path()).await;

    let outcome = evaluate(&handle, "SELECT 1", "SELEC 1").await;

    assert!(!outcome.succeeded());
    assert!(outcome
        .reason()
        .starts_with("reference query execution failed: "));
}

#[tokio::test]
async fn test_column_order_is_significant() {
    let dir = tempdir().unwrap();
    let handle = department_management(dir.path()).await;

    let outcome = evaluate(
        &handle,
        "SELECT Budget_in_Billions, Dname FROM department",
        "SELECT Dname, Budget_in_Billions FROM department",
    )
    .await;

    assert!(!outcome.succeeded());
    assert_eq!(outcome.reason(), REASON_DIVERGE);
}

#[tokio::test]
async fn test_duplicate_rows_are_ignored() {
    let dir = tempdir().unwrap();
    let handle = department_management(dir.path()).await;

    // Department B has two heads, so the join yields B twice.
    let outcome = evaluate(
        &handle,
        "SELECT d.Dname FROM management AS m JOIN department AS d ON m.department_ID = d.Department_ID",
        "SELECT Dname FROM department",
    )
    .await;

    assert!(outcome.succeeded());
}

#[tokio::test]
async fn test_different_rows_diverge() {
    let dir = tempdir().unwrap();
    let handle = department_management(dir.path()).await;

    let outcome = evaluate(
        &handle,
        "SELECT name FROM head WHERE age > 60",
        "SELECT name FROM head",
    )
    .await;

    assert!(!outcome.succeeded());
    assert_eq!(outcome.reason(), REASON_DIVERGE);
}

#[tokio::test]
async fn test_integer_matches_integral_real() {
    let dir = tempdir().unwrap();
    let handle = department_management(dir.path()).await;

    let outcome = evaluate(&handle, "SELECT count(*) FROM head", "SELECT 3.0").await;

    assert!(outcome.succeeded());
}

#[tokio::test]
async fn test_evaluation_is_idempotent() {
    let dir = tempdir().unwrap();
    let handle = department_management(dir.path()).await;
    let evaluator = evaluator();
    let pair = QueryPair::new(
        "SELECT name FROM head WHERE age > 55",
        "SELECT name FROM head WHERE age >= 56",
    );

    let first = evaluator.evaluate(&pair, &handle).await;
    let second = evaluator.evaluate(&pair, &handle).await;

    assert!(first.succeeded());
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_missing_snapshot_is_unexpected_error() {
    let dir = tempdir().unwrap();
    let handle = SnapshotHandle::for_item(dir.path(), "no_such_db");

    let outcome = evaluate(&handle, "SELECT 1", "SELECT 1").await;

    assert!(!outcome.succeeded());
    assert!(outcome
        .reason()
        .starts_with("unexpected error during evaluation: "));
    assert!(!handle.exists());
}

#[tokio::test]
async fn test_runaway_query_times_out() {
    let dir = tempdir().unwrap();
    let handle = department_management(dir.path()).await;
    let evaluator = evaluator().with_query_timeout(Duration::from_millis(200));

    let pair = QueryPair::new(
        "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c) SELECT count(*) FROM c",
        "SELECT 1",
    );
    let outcome = tokio::time::timeout(Duration::from_secs(20), evaluator.evaluate(&pair, &handle))
        .await
        .expect("evaluation must return once the query is interrupted");

    assert!(!outcome.succeeded());
    assert!(outcome
        .reason()
        .starts_with("predicted query execution failed: query timed out"));
}

#[tokio::test]
async fn test_read_only_snapshot_survives_destructive_query() {
    let dir = tempdir().unwrap();
    let handle = department_management(dir.path()).await;
    let connector = SqliteConnector::new(&DatabaseConfig {
        read_only: true,
        ..Default::default()
    });
    let evaluator = Evaluator::new(Arc::new(connector));

    let outcome = evaluator
        .evaluate(&QueryPair::new("DELETE FROM head", "SELECT 1"), &handle)
        .await;
    assert!(!outcome.succeeded());
    assert!(outcome
        .reason()
        .starts_with("predicted query execution failed: "));

    let count = evaluate(&handle, "SELECT count(*) FROM head", "SELECT 3").await;
    assert!(count.succeeded(), "snapshot must be unchanged");
}

#[tokio::test]
async fn test_null_cells_match() {
    let dir = tempdir().unwrap();
    let handle = create_snapshot(
        dir.path(),
        "singer",
        &[
            "CREATE TABLE singer (Name TEXT, Country TEXT)",
            "INSERT INTO singer VALUES ('Joe Sharp', NULL), ('Rose White', 'France')",
        ],
    )
    .await;

    let outcome = evaluate(
        &handle,
        "SELECT Country FROM singer",
        "SELECT Country FROM singer ORDER BY Name DESC",
    )
    .await;

    assert!(outcome.succeeded());
}

#[tokio::test]
async fn test_compound_predicted_query_fails() {
    let dir = tempdir().unwrap();
    let handle = department_management(dir.path()).await;

    let outcome = evaluate(
        &handle,
        "SELECT name FROM head; SELECT name FROM head",
        "SELECT name FROM head",
    )
    .await;

    assert!(!outcome.succeeded());
    assert_eq!(
        outcome.reason(),
        "predicted query execution failed: You can only execute one statement at a time."
    );
}

#[tokio::test]
async fn test_compound_query_never_modifies_snapshot() {
    let dir = tempdir().unwrap();
    let handle = department_management(dir.path()).await;

    let outcome = evaluate(
        &handle,
        "SELECT name FROM head; DELETE FROM head",
        "SELECT name FROM head",
    )
    .await;
    assert!(!outcome.succeeded());
    assert!(outcome
        .reason()
        .ends_with("You can only execute one statement at a time."));

    let count = evaluate(&handle, "SELECT count(*) FROM head", "SELECT 3").await;
    assert!(count.succeeded(), "snapshot must be unchanged");
}

#[tokio::test]
async fn test_compound_reference_query_fails() {
    let dir = tempdir().unwrap();
    let handle = department_management(dir.path()).await;

    let outcome = evaluate(&handle, "SELECT 1", "SELECT 1; SELECT 2").await;

    assert!(!outcome.succeeded());
    assert!(outcome
        .reason()
        .starts_with("reference query execution failed: You can only execute"));
}

#[tokio::test]
async fn test_trailing_semicolons_and_comments_pass() {
    let dir = tempdir().unwrap();
    let handle = department_management(dir.path()).await;

    for predicted in [
        "SELECT count(*) FROM head;",
        "SELECT count(*) FROM head ;;  \n",
        "SELECT count(*) FROM head; -- all heads",
        "SELECT count(*) FROM head /* all */; /* heads */",
        "SELECT count(*) FROM head WHERE name <> ';'",
    ] {
        let outcome = evaluate(&handle, predicted, "SELECT count(*) FROM head").await;
        assert!(outcome.succeeded(), "{predicted:?}: {}", outcome.reason());
    }
}

#[tokio::test]
async fn test_undecodable_text_fails_the_query() {
    let dir = tempdir().unwrap();
    let handle = create_snapshot(
        dir.path(),
        "broken_text",
        &["CREATE TABLE t (a TEXT)", "INSERT INTO t VALUES (CAST(x'ff' AS TEXT))"],
    )
    .await;

    let outcome = evaluate(&handle, "SELECT a FROM t", "SELECT NULL").await;

    assert!(!outcome.succeeded());
    assert_eq!(outcome.score(), 0.0);
    assert!(outcome
        .reason()
        .starts_with("predicted query execution failed: Could not decode column"));
}
