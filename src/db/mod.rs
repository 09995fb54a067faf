//! Snapshot access layer for sqleval.
//!
//! Provides a trait-based interface for opening benchmark snapshots and
//! running queries against them, so the evaluator can be handed any
//! connector instead of reaching for a concrete database itself.

mod mock;
mod sqlite;
mod statement;
mod types;

pub use mock::{FailingConnector, MockConnector};
pub use sqlite::{SqliteClient, SqliteConnector};
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::error::Result;
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};

/// File extension used for benchmark snapshots.
pub const SNAPSHOT_EXTENSION: &str = "sqlite";

/// Identifies one read-only database snapshot on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapshotHandle {
    path: PathBuf,
}

impl SnapshotHandle {
    /// Creates a handle for the snapshot at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolves the snapshot of a benchmark item: `<db_dir>/<db_id>/<db_id>.sqlite`.
    pub fn for_item(db_dir: &Path, db_id: &str) -> Self {
        let file_name = format!("{db_id}.{SNAPSHOT_EXTENSION}");
        Self::new(db_dir.join(db_id).join(file_name))
    }

    /// Returns the filesystem path of the snapshot.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if the snapshot file exists.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

impl fmt::Display for SnapshotHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Opens connections to snapshots.
///
/// One connection is opened per evaluation; implementations must not share
/// connections between calls.
#[async_trait]
pub trait SnapshotConnector: Send + Sync {
    /// Opens a fresh connection to the snapshot identified by `handle`.
    async fn open(&self, handle: &SnapshotHandle) -> Result<Box<dyn SnapshotClient>>;
}

/// A live connection to one snapshot.
#[async_trait]
pub trait SnapshotClient: Send + Sync {
    /// Executes a SQL query and returns every row it produced.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;

    /// Aborts the statement currently running on this connection, if any.
    ///
    /// Called after a query overran its budget, before the connection is
    /// closed.
    fn interrupt(&self) {}

    /// Closes the connection.
    async fn close(&self) -> Result<()>;
}
