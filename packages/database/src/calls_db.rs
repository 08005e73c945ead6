//! The `calls` table.
//!
//! One row per reported call. Timestamps are stored as naive local
//! `TIMESTAMP`s; `priority` is left nullable so bad source rows survive
//! loading and can be counted when a window is read.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use duckdb::Connection;
use police_calls_call_models::{CallQuery, CallRecord, CallSnapshot, Priority, RejectedRecords};

use crate::DbError;

/// Number of rows per INSERT chunk (`DuckDB` handles large batches well).
const CHUNK_SIZE: usize = 5_000;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Opens (or creates) the calls database and ensures the schema exists.
///
/// # Errors
///
/// Returns [`DbError`] if the connection or schema creation fails.
pub fn open(path: &Path) -> Result<Connection, DbError> {
    if let Some(parent) = path.parent() {
        crate::paths::ensure_dir(parent)?;
    }

    let conn = Connection::open(path)?;
    create_schema(&conn)?;
    Ok(conn)
}

/// Opens an existing calls database without write access.
///
/// The schema is not created; querying a file without a `calls` table
/// fails at query time.
///
/// # Errors
///
/// Returns [`DbError`] if the file cannot be opened.
pub fn open_read_only(path: &Path) -> Result<Connection, DbError> {
    let config = duckdb::Config::default().access_mode(duckdb::AccessMode::ReadOnly)?;
    Ok(Connection::open_with_flags(path, config)?)
}

/// Opens a fresh in-memory calls database with the schema in place.
///
/// # Errors
///
/// Returns [`DbError`] if the connection or schema creation fails.
pub fn open_in_memory() -> Result<Connection, DbError> {
    let conn = Connection::open_in_memory()?;
    create_schema(&conn)?;
    Ok(conn)
}

fn create_schema(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS calls (
            call_id TEXT NOT NULL PRIMARY KEY,
            call_datetime TIMESTAMP NOT NULL,
            dispatch_datetime TIMESTAMP,
            call_type TEXT,
            address TEXT,
            priority INTEGER
        );",
    )?;

    Ok(())
}

/// Upserts a batch of call records.
///
/// Later occurrences of a `call_id` within the batch win. Returns the
/// number of rows affected.
///
/// # Errors
///
/// Returns [`DbError`] if any database operation fails.
pub fn insert_calls(conn: &Connection, calls: &[CallRecord]) -> Result<u64, DbError> {
    if calls.is_empty() {
        return Ok(0);
    }

    let mut last_seen: BTreeMap<&str, usize> = BTreeMap::new();
    for (i, call) in calls.iter().enumerate() {
        last_seen.insert(&call.call_id, i);
    }
    let deduped: Vec<&CallRecord> = calls
        .iter()
        .enumerate()
        .filter(|(i, call)| last_seen.get(call.call_id.as_str()) == Some(i))
        .map(|(_, call)| call)
        .collect();

    if deduped.len() < calls.len() {
        log::info!(
            "Deduplicated INSERT batch: {} -> {} rows ({} duplicates removed)",
            calls.len(),
            deduped.len(),
            calls.len() - deduped.len(),
        );
    }

    let mut total_inserted = 0u64;

    for chunk in deduped.chunks(CHUNK_SIZE) {
        let mut sql = String::from(
            "INSERT INTO calls (
                call_id, call_datetime, dispatch_datetime, call_type, address, priority
            ) VALUES ",
        );

        for (i, _) in chunk.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str("(?, ?, ?, ?, ?, ?)");
        }

        sql.push_str(
            " ON CONFLICT (call_id) DO UPDATE SET
                call_datetime = EXCLUDED.call_datetime,
                dispatch_datetime = EXCLUDED.dispatch_datetime,
                call_type = EXCLUDED.call_type,
                address = EXCLUDED.address,
                priority = EXCLUDED.priority",
        );

        let mut stmt = conn.prepare(&sql)?;
        let mut param_idx = 1usize;

        for call in chunk {
            stmt.raw_bind_parameter(param_idx, &call.call_id)?;
            stmt.raw_bind_parameter(
                param_idx + 1,
                call.call_datetime.format(TIMESTAMP_FORMAT).to_string(),
            )?;
            stmt.raw_bind_parameter(
                param_idx + 2,
                call.dispatch_datetime
                    .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string()),
            )?;
            stmt.raw_bind_parameter(param_idx + 3, call.call_type.as_deref())?;
            stmt.raw_bind_parameter(param_idx + 4, call.address.as_deref())?;
            stmt.raw_bind_parameter(param_idx + 5, i32::from(call.priority.value()))?;

            param_idx += 6;
        }

        let rows = stmt.raw_execute()?;
        total_inserted += u64::try_from(rows).unwrap_or(0);
    }

    Ok(total_inserted)
}

/// Raw row as read from the `calls` table.
type CallRow = (
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<i64>,
);

/// Reads every call in the query's window.
///
/// Rows with a missing or out-of-range priority are counted in
/// [`CallSnapshot::rejected`] and skipped; the priority filter is applied
/// to the remaining rows. Records are ordered by `call_datetime`, then
/// `call_id`.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a stored timestamp cannot be
/// parsed.
pub fn query_calls(conn: &Connection, query: &CallQuery) -> Result<CallSnapshot, DbError> {
    let start = query.range.start_datetime().format(TIMESTAMP_FORMAT).to_string();
    let end = query.range.end_exclusive().format(TIMESTAMP_FORMAT).to_string();

    let mut stmt = conn.prepare(
        "SELECT
            call_id,
            strftime(call_datetime, '%Y-%m-%d %H:%M:%S'),
            strftime(dispatch_datetime, '%Y-%m-%d %H:%M:%S'),
            call_type,
            address,
            CAST(priority AS BIGINT)
         FROM calls
         WHERE call_datetime >= CAST(? AS TIMESTAMP)
           AND call_datetime < CAST(? AS TIMESTAMP)
         ORDER BY call_datetime, call_id",
    )?;

    let rows = stmt.query_map(duckdb::params![start, end], |row| -> duckdb::Result<CallRow> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
        ))
    })?;

    let mut snapshot = CallSnapshot::default();

    for row in rows {
        let (call_id, call_datetime, dispatch_datetime, call_type, address, priority) = row?;

        let priority = match priority.map(Priority::from_value) {
            None => {
                snapshot.rejected.missing_priority += 1;
                continue;
            }
            Some(Err(e)) => {
                log::debug!("Rejecting call {call_id}: {e}");
                snapshot.rejected.invalid_priority += 1;
                continue;
            }
            Some(Ok(priority)) => priority,
        };

        let record = CallRecord {
            call_datetime: parse_required(&call_id, &call_datetime)?,
            dispatch_datetime: dispatch_datetime
                .as_deref()
                .map(|s| parse_required(&call_id, s))
                .transpose()?,
            call_id,
            call_type,
            address,
            priority,
        };

        if query.priorities.allows(record.priority) {
            snapshot.records.push(record);
        }
    }

    if snapshot.rejected.total() > 0 {
        log::warn!(
            "Rejected {} calls in {} ({} missing priority, {} invalid priority)",
            snapshot.rejected.total(),
            query.range,
            snapshot.rejected.missing_priority,
            snapshot.rejected.invalid_priority,
        );
    }

    Ok(snapshot)
}

fn parse_required(call_id: &str, s: &str) -> Result<NaiveDateTime, DbError> {
    parse_timestamp(s).ok_or_else(|| DbError::Conversion {
        message: format!("call {call_id} has unparseable timestamp {s:?}"),
    })
}

/// Parses a `DuckDB` timestamp text representation.
///
/// Accepts values with or without fractional seconds.
fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT) {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt);
    }

    log::warn!("Failed to parse timestamp: {s:?}");
    None
}

/// Returns the number of stored calls.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn get_record_count(conn: &Connection) -> Result<u64, DbError> {
    let mut stmt = conn.prepare("SELECT COUNT(*) FROM calls")?;
    let count: i64 = stmt.query_row([], |row| row.get(0))?;
    #[allow(clippy::cast_sign_loss)]
    Ok(count as u64)
}

/// Returns the first and last call dates, or `None` for an empty table.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn get_date_bounds(conn: &Connection) -> Result<Option<(NaiveDate, NaiveDate)>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT
            strftime(MIN(call_datetime), '%Y-%m-%d'),
            strftime(MAX(call_datetime), '%Y-%m-%d')
         FROM calls",
    )?;
    let (min, max): (Option<String>, Option<String>) =
        stmt.query_row([], |row| Ok((row.get(0)?, row.get(1)?)))?;

    let parse = |s: String| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok();
    Ok(min.and_then(parse).zip(max.and_then(parse)))
}
