//! SQLite snapshot client implementation.
//!
//! Provides the `SqliteConnector` and `SqliteClient` types that implement the
//! snapshot traits for SQLite benchmark databases using sqlx.

use super::statement::ensure_single_statement;
use crate::config::DatabaseConfig;
use crate::db::{
    ColumnInfo, QueryResult, Row, SnapshotClient, SnapshotConnector, SnapshotHandle, Value,
};
use crate::error::{EvalError, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column as SqlxColumn, Row as SqlxRow, TypeInfo, ValueRef};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Maximum number of connection attempts when the snapshot is locked.
const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Base delay between retry attempts (doubles each retry).
const RETRY_BASE_DELAY_MS: u64 = 100;

/// Virtual machine steps between checks of the interrupt flag.
const PROGRESS_HANDLER_OPS: i32 = 1000;

/// Opens SQLite snapshots with a fixed set of connection options.
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    read_only: bool,
    busy_timeout: Duration,
    acquire_timeout: Duration,
}

impl SqliteConnector {
    /// Creates a connector from the `[database]` configuration section.
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            read_only: config.read_only,
            busy_timeout: Duration::from_secs(config.busy_timeout_secs),
            acquire_timeout: Duration::from_secs(config.acquire_timeout_secs),
        }
    }

    fn connect_options(&self, handle: &SnapshotHandle) -> SqliteConnectOptions {
        // Never create a database: a missing snapshot must fail loudly instead
        // of being evaluated as an empty schema.
        SqliteConnectOptions::new()
            .filename(handle.path())
            .create_if_missing(false)
            .read_only(self.read_only)
            .busy_timeout(self.busy_timeout)
    }
}

impl Default for SqliteConnector {
    fn default() -> Self {
        Self::new(&DatabaseConfig::default())
    }
}

#[async_trait]
impl SnapshotConnector for SqliteConnector {
    async fn open(&self, handle: &SnapshotHandle) -> Result<Box<dyn SnapshotClient>> {
        let client = SqliteClient::connect(self, handle).await?;
        Ok(Box::new(client))
    }
}

/// A single-connection client bound to one snapshot.
#[derive(Debug)]
pub struct SqliteClient {
    pool: SqlitePool,
    interrupted: Arc<AtomicBool>,
}

impl SqliteClient {
    /// Connects to the snapshot, retrying while the file is locked.
    pub async fn connect(connector: &SqliteConnector, handle: &SnapshotHandle) -> Result<Self> {
        let mut last_error = None;
        let mut delay = Duration::from_millis(RETRY_BASE_DELAY_MS);

        for attempt in 1..=MAX_RETRY_ATTEMPTS {
            debug!("Opening {} (attempt {} of {})", handle, attempt, MAX_RETRY_ATTEMPTS);

            // The single connection must live as long as the client, since it
            // carries the interrupt handler.
            let result = SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .acquire_timeout(connector.acquire_timeout)
                .connect_with(connector.connect_options(handle))
                .await;

            match result {
                Ok(pool) => {
                    let interrupted = Arc::new(AtomicBool::new(false));
                    let installed =
                        install_interrupt_handler(&pool, Arc::clone(&interrupted)).await;
                    if let Err(e) = installed {
                        pool.close().await;
                        return Err(map_connection_error(e, handle));
                    }
                    return Ok(Self { pool, interrupted });
                }
                Err(e) => {
                    let is_transient = is_transient_error(&e);
                    last_error = Some(e);

                    if attempt < MAX_RETRY_ATTEMPTS && is_transient {
                        warn!(
                            "Opening {} failed (snapshot busy), retrying in {:?}",
                            handle, delay
                        );
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                    } else {
                        break;
                    }
                }
            }
        }

        Err(match last_error {
            Some(e) => map_connection_error(e, handle),
            None => EvalError::connection(format!("Cannot open snapshot {handle}")),
        })
    }
}

#[async_trait]
impl SnapshotClient for SqliteClient {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        ensure_single_statement(sql)?;
        self.interrupted.store(false, Ordering::SeqCst);
        let start = Instant::now();

        let result = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| EvalError::query(format_query_error(e)))?;

        let execution_time = start.elapsed();

        let columns: Vec<ColumnInfo> = result
            .first()
            .map(|first_row| {
                first_row
                    .columns()
                    .iter()
                    .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                    .collect()
            })
            .unwrap_or_default();

        let rows = result.iter().map(convert_row).collect::<Result<Vec<Row>>>()?;

        debug!("Query returned {} rows in {:?}", rows.len(), execution_time);

        Ok(QueryResult::with_data(columns, rows).with_execution_time(execution_time))
    }

    fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// Makes the pooled connection abort its running statement once
/// `interrupted` is set.
async fn install_interrupt_handler(
    pool: &SqlitePool,
    interrupted: Arc<AtomicBool>,
) -> std::result::Result<(), sqlx::Error> {
    let mut conn = pool.acquire().await?;
    let mut locked = conn.lock_handle().await?;
    locked.set_progress_handler(PROGRESS_HANDLER_OPS, move || {
        !interrupted.load(Ordering::SeqCst)
    });
    Ok(())
}

/// Converts a sqlx SqliteRow to our Row type.
fn convert_row(row: &SqliteRow) -> Result<Row> {
    (0..row.columns().len())
        .map(|i| convert_value(row, i))
        .collect()
}

/// Converts a single cell to our Value type.
///
/// SQLite is dynamically typed, so the storage class of the value itself is
/// used rather than the column's declared type. A cell that cannot be decoded
/// fails the query.
fn convert_value(row: &SqliteRow, index: usize) -> Result<Value> {
    let raw = row.try_get_raw(index).map_err(decode_error)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let storage_class = raw.type_info().name().to_uppercase();

    let value = match storage_class.as_str() {
        "INTEGER" | "BOOLEAN" => row.try_get::<i64, _>(index).map(Value::Int),
        "REAL" | "NUMERIC" => row.try_get::<f64, _>(index).map(Value::Float),
        "BLOB" => row.try_get::<Vec<u8>, _>(index).map(Value::Bytes),
        _ => row.try_get::<String, _>(index).map(Value::String),
    };
    value.map_err(decode_error)
}

fn decode_error(error: sqlx::Error) -> EvalError {
    match error {
        sqlx::Error::ColumnDecode { index, source } => {
            EvalError::query(format!("Could not decode column {index}: {source}"))
        }
        other => EvalError::query(other.to_string()),
    }
}

/// Determines if an open error is lock contention worth retrying.
fn is_transient_error(error: &sqlx::Error) -> bool {
    let error_str = error.to_string().to_lowercase();

    error_str.contains("database is locked")
        || error_str.contains("database table is locked")
        || error_str.contains("busy")
}

/// Maps sqlx open errors to messages that name the snapshot.
fn map_connection_error(error: sqlx::Error, handle: &SnapshotHandle) -> EvalError {
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("unable to open database file") {
        EvalError::connection(format!(
            "Cannot open snapshot {handle}: file is missing or unreadable"
        ))
    } else if error_str.contains("file is not a database") {
        EvalError::connection(format!("Snapshot {handle} is not a SQLite database"))
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        EvalError::connection(format!("Timed out opening snapshot {handle}"))
    } else {
        EvalError::connection(format!("Cannot open snapshot {handle}: {error}"))
    }
}

/// Extracts the engine's message from a query error.
fn format_query_error(error: sqlx::Error) -> String {
    match error.as_database_error() {
        Some(db_error) => db_error.message().to_string(),
        None => error.to_string(),
    }
}
