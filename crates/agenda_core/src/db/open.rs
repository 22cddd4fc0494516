//! Connection bootstrap for the agenda store.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections know the `UNICODE_CI` collation.
//! - Returned connections carry the current schema version.

use super::schema::ensure_schema;
use super::DbResult;
use crate::config::StoreLocation;
use log::{error, info};
use rusqlite::Connection;
use std::cmp::Ordering;
use std::path::Path;
use std::time::{Duration, Instant};

/// Name of the case-insensitive collation attached to text columns.
pub const UNICODE_CI_COLLATION: &str = "UNICODE_CI";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens the store described by `location`.
pub fn open_store(location: &StoreLocation) -> DbResult<Connection> {
    match location {
        StoreLocation::InMemory => open_db_in_memory(),
        StoreLocation::File(path) => open_db(path),
    }
}

/// Opens a SQLite database file and ensures the agenda schema.
///
/// # Side effects
/// - Creates the file when it does not exist yet.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_with("file", || Connection::open(path))
}

/// Opens an in-memory SQLite database and ensures the agenda schema.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with("memory", Connection::open_in_memory)
}

fn open_with(
    mode: &'static str,
    opener: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = opener().map_err(|err| {
        error!(
            "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={err}",
            started_at.elapsed().as_millis()
        );
        err
    })?;

    if let Err(err) = bootstrap_connection(&mut conn) {
        error!(
            "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={err}",
            started_at.elapsed().as_millis()
        );
        return Err(err);
    }

    info!(
        "event=db_open module=db status=ok mode={mode} duration_ms={}",
        started_at.elapsed().as_millis()
    );
    Ok(conn)
}

fn bootstrap_connection(conn: &mut Connection) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.create_collation(UNICODE_CI_COLLATION, unicode_ci_compare)?;
    ensure_schema(conn)?;
    Ok(())
}

fn unicode_ci_compare(left: &str, right: &str) -> Ordering {
    left.chars()
        .flat_map(char::to_lowercase)
        .cmp(right.chars().flat_map(char::to_lowercase))
}
