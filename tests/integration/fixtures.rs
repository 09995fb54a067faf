//! Snapshot fixtures shared by the integration tests.

use sql_exec_eval::db::SnapshotHandle;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::Path;

/// Schema and rows modelled on the department_management benchmark database.
const DEPARTMENT_MANAGEMENT: &[&str] = &[
    "CREATE TABLE department (Department_ID INTEGER PRIMARY KEY, Dname TEXT, Budget_in_Billions REAL)",
    "CREATE TABLE head (head_ID INTEGER PRIMARY KEY, name TEXT, age REAL)",
    "CREATE TABLE management (department_ID INTEGER, head_ID INTEGER)",
    "INSERT INTO department VALUES (1, 'A', 9.96), (2, 'B', 11.1)",
    "INSERT INTO head VALUES (1, 'Tiger Woods', 67.0), (2, 'Sergio Garcia', 68.0), (3, 'K. J. Choi', 43.0)",
    "INSERT INTO management VALUES (1, 1), (2, 2), (2, 3)",
];

/// Creates `<db_dir>/<db_id>/<db_id>.sqlite` populated with `statements`.
pub async fn create_snapshot(db_dir: &Path, db_id: &str, statements: &[&str]) -> SnapshotHandle {
    let handle = SnapshotHandle::for_item(db_dir, db_id);
    std::fs::create_dir_all(handle.path().parent().unwrap()).unwrap();

    let options = SqliteConnectOptions::new()
        .filename(handle.path())
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();

    for statement in statements {
        sqlx::query(statement).execute(&pool).await.unwrap();
    }
    pool.close().await;

    handle
}

/// Creates the department_management snapshot under `db_dir`.
pub async fn department_management(db_dir: &Path) -> SnapshotHandle {
    create_snapshot(db_dir, "department_management", DEPARTMENT_MANAGEMENT).await
}
