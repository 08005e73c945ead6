#![allow(clippy::module_name_repetitions)]
//! Canonical file paths for the `DuckDB` data directory.

use std::path::{Path, PathBuf};

/// Environment variable overriding the calls database location.
pub const CALLS_DB_PATH_ENV: &str = "CALLS_DB_PATH";

/// Returns the `data/` directory path, relative to the working directory.
#[must_use]
pub fn data_dir() -> PathBuf {
    PathBuf::from("data")
}

/// Returns the default path of the calls `DuckDB` file.
#[must_use]
pub fn default_calls_db_path() -> PathBuf {
    data_dir().join("calls.duckdb")
}

/// Returns the calls database path from `CALLS_DB_PATH`, falling back to
/// [`default_calls_db_path`].
#[must_use]
pub fn calls_db_path() -> PathBuf {
    std::env::var(CALLS_DB_PATH_ENV)
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map_or_else(default_calls_db_path, PathBuf::from)
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.as_os_str().is_empty() && !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
