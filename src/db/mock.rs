//! Mock snapshot connectors for testing.
//!
//! Provides scripted, in-memory snapshots so evaluator behavior can be
//! tested without SQLite files.

use super::{QueryResult, Row, SnapshotClient, SnapshotConnector, SnapshotHandle};
use crate::error::{EvalError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Scripted {
    Rows(Vec<Row>),
    Error(String),
}

/// A connector whose clients answer from a fixed script of query responses.
///
/// Queries without a scripted response fail with a "no such table" style
/// error. Opened and closed connections are counted so tests can check the
/// connection is always released.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    responses: HashMap<String, Scripted>,
    delay: Option<Duration>,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl MockConnector {
    /// Creates a connector with no scripted queries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts `sql` to return `rows`.
    pub fn with_rows(mut self, sql: impl Into<String>, rows: Vec<Row>) -> Self {
        self.responses.insert(sql.into(), Scripted::Rows(rows));
        self
    }

    /// Scripts `sql` to fail with `message`.
    pub fn with_error(mut self, sql: impl Into<String>, message: impl Into<String>) -> Self {
        self.responses
            .insert(sql.into(), Scripted::Error(message.into()));
        self
    }

    /// Makes every query sleep for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of connections opened so far.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Number of connections closed so far.
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotConnector for MockConnector {
    async fn open(&self, _handle: &SnapshotHandle) -> Result<Box<dyn SnapshotClient>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockClient {
            responses: self.responses.clone(),
            delay: self.delay,
            closed: Arc::clone(&self.closed),
        }))
    }
}

struct MockClient {
    responses: HashMap<String, Scripted>,
    delay: Option<Duration>,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl SnapshotClient for MockClient {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.responses.get(sql) {
            Some(Scripted::Rows(rows)) => Ok(QueryResult::from_rows(rows.clone())),
            Some(Scripted::Error(message)) => Err(EvalError::query(message.clone())),
            None => Err(EvalError::query(format!("no scripted response for: {sql}"))),
        }
    }

    async fn close(&self) -> Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A connector that can never open a snapshot.
#[derive(Debug, Clone, Default)]
pub struct FailingConnector;

#[async_trait]
impl SnapshotConnector for FailingConnector {
    async fn open(&self, handle: &SnapshotHandle) -> Result<Box<dyn SnapshotClient>> {
        Err(EvalError::connection(format!(
            "Cannot open snapshot {handle}: file is missing or unreadable"
        )))
    }
}
