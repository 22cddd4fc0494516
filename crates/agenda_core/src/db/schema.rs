//! Agenda store schema bootstrap.
//!
//! # Invariants
//! - The schema version is mirrored to `PRAGMA user_version`.
//! - A fresh store receives the whole schema in one transaction or not at all.
//! - A store stamped by a newer build is refused, never rewritten.

use crate::db::{DbError, DbResult};
use log::debug;
use rusqlite::Connection;

/// Schema version written by this build.
pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Creates the schema on an empty store and checks the version of an
/// existing one.
pub fn ensure_schema(conn: &mut Connection) -> DbResult<()> {
    let found: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    match found {
        SCHEMA_VERSION => Ok(()),
        0 => {
            let tx = conn.transaction()?;
            tx.execute_batch(SCHEMA_SQL)?;
            tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
            tx.commit()?;
            debug!("event=schema_init module=db status=ok version={SCHEMA_VERSION}");
            Ok(())
        }
        db_version => Err(DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported: SCHEMA_VERSION,
        }),
    }
}
