#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `DuckDB` storage for police call records.
//!
//! The dashboard reads a single `calls` table through the [`CallSource`]
//! seam. [`calls_db`] owns the schema, batched upserts used for loading,
//! and the window query that produces a [`CallSnapshot`]. Rows whose
//! priority is missing or out of range are counted, not returned.

pub mod calls_db;
pub mod paths;
pub mod source;

pub use police_calls_call_models::{CallSnapshot, RejectedRecords};
pub use source::{CallSource, DuckDbCallSource, MemoryCallSource};

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// `DuckDB` error.
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// I/O error (creating the data directory).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking query task panicked or was cancelled.
    #[error("Query task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// A connection lock was poisoned by a panicking query.
    #[error("DuckDB connection lock poisoned")]
    Poisoned,

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}
