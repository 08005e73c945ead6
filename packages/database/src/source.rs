//! Read seam between the dashboard and call storage.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use police_calls_call_models::{CallQuery, CallRecord, CallSnapshot};

use crate::{DbError, calls_db};

/// Anything that can produce the calls selected by a [`CallQuery`].
#[async_trait]
pub trait CallSource: Send + Sync {
    /// Short description for logs and health checks.
    fn describe(&self) -> String;

    /// Fetches the snapshot of calls for `query`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the underlying store cannot be read.
    async fn fetch_calls(&self, query: &CallQuery) -> Result<CallSnapshot, DbError>;
}

/// [`CallSource`] backed by a `DuckDB` connection.
///
/// `duckdb::Connection` is `Send` but not `Sync`, so the connection is
/// wrapped in a `Mutex` and queried on the blocking thread pool.
#[derive(Clone)]
pub struct DuckDbCallSource {
    conn: Arc<Mutex<duckdb::Connection>>,
    label: String,
}

impl DuckDbCallSource {
    /// Wraps an open connection.
    #[must_use]
    pub fn new(conn: duckdb::Connection, label: impl Into<String>) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            label: label.into(),
        }
    }

    /// Opens the calls database at `path` read-only.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the file cannot be opened.
    pub fn open_read_only(path: &Path) -> Result<Self, DbError> {
        let conn = calls_db::open_read_only(path)?;
        Ok(Self::new(conn, path.display().to_string()))
    }

    /// Runs `f` against the connection on the blocking thread pool.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the task fails, the lock is poisoned, or `f`
    /// fails.
    pub async fn with_connection<T, F>(&self, f: F) -> Result<T, DbError>
    where
        T: Send + 'static,
        F: FnOnce(&duckdb::Connection) -> Result<T, DbError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| DbError::Poisoned)?;
            f(&conn)
        })
        .await?
    }
}

#[async_trait]
impl CallSource for DuckDbCallSource {
    fn describe(&self) -> String {
        format!("duckdb:{}", self.label)
    }

    async fn fetch_calls(&self, query: &CallQuery) -> Result<CallSnapshot, DbError> {
        let query = query.clone();
        let snapshot = self
            .with_connection(move |conn| calls_db::query_calls(conn, &query))
            .await?;
        log::debug!("Fetched {} calls from {}", snapshot.records.len(), self.label);
        Ok(snapshot)
    }
}

/// [`CallSource`] over records held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCallSource {
    records: Vec<CallRecord>,
}

impl MemoryCallSource {
    /// Creates a source over `records`.
    #[must_use]
    pub fn new(mut records: Vec<CallRecord>) -> Self {
        records.sort_by(|a, b| {
            a.call_datetime
                .cmp(&b.call_datetime)
                .then_with(|| a.call_id.cmp(&b.call_id))
        });
        Self { records }
    }
}

#[async_trait]
impl CallSource for MemoryCallSource {
    fn describe(&self) -> String {
        format!("memory:{} calls", self.records.len())
    }

    async fn fetch_calls(&self, query: &CallQuery) -> Result<CallSnapshot, DbError> {
        Ok(CallSnapshot {
            records: self
                .records
                .iter()
                .filter(|r| query.matches(r))
                .cloned()
                .collect(),
            rejected: police_calls_call_models::RejectedRecords::default(),
        })
    }
}
