//! Per-table repositories and their shared error type.
//!
//! # Responsibility
//! - Keep SQL for `calendars`, `meetings` and `reminders` inside core.
//! - Translate SQLite failures into distinguishable error kinds.
//!
//! # Invariants
//! - Constraint failures are reported as `RepoError::Constraint`, never as
//!   a raw SQLite error.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Repositories work on any `&Connection`, including an open transaction.

use crate::db::DbError;
use chrono::{DateTime, Utc};
use rusqlite::{ffi, ErrorCode};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod calendar_repo;
pub mod meeting_repo;
pub mod reminder_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Which schema rule rejected a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    ForeignKey,
    /// Length and range checks.
    Check,
    NotNull,
    Unique,
    PrimaryKey,
    Other,
}

/// A write rejected by the store schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintViolation {
    pub kind: ConstraintKind,
    /// Store-provided detail, e.g. `CHECK constraint failed: length(title) <= 200`.
    pub message: String,
}

impl Display for ConstraintViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "constraint violation ({:?}): {}", self.kind, self.message)
    }
}

impl Error for ConstraintViolation {}

/// Repository error for calendar, meeting and reminder persistence.
#[derive(Debug)]
pub enum RepoError {
    Constraint(ConstraintViolation),
    StoreUnavailable(DbError),
    NotFound { entity: &'static str, id: i64 },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Constraint(violation) => write!(f, "{violation}"),
            Self::StoreUnavailable(err) => write!(f, "store unavailable: {err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Constraint(violation) => Some(violation),
            Self::StoreUnavailable(err) => Some(err),
            Self::NotFound { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => Self::from(err),
            other => Self::StoreUnavailable(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if let Some(violation) = constraint_violation(&value) {
            return Self::Constraint(violation);
        }
        match value {
            rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::IntegralValueOutOfRange(..)
            | rusqlite::Error::InvalidColumnType(..) => Self::InvalidData(value.to_string()),
            other => Self::StoreUnavailable(DbError::Sqlite(other)),
        }
    }
}

fn constraint_violation(err: &rusqlite::Error) -> Option<ConstraintViolation> {
    let rusqlite::Error::SqliteFailure(failure, message) = err else {
        return None;
    };
    if failure.code != ErrorCode::ConstraintViolation {
        return None;
    }

    let kind = match failure.extended_code {
        ffi::SQLITE_CONSTRAINT_FOREIGNKEY => ConstraintKind::ForeignKey,
        ffi::SQLITE_CONSTRAINT_CHECK => ConstraintKind::Check,
        ffi::SQLITE_CONSTRAINT_NOTNULL => ConstraintKind::NotNull,
        ffi::SQLITE_CONSTRAINT_UNIQUE => ConstraintKind::Unique,
        ffi::SQLITE_CONSTRAINT_PRIMARYKEY => ConstraintKind::PrimaryKey,
        _ => ConstraintKind::Other,
    };

    Some(ConstraintViolation {
        kind,
        message: message.clone().unwrap_or_else(|| failure.to_string()),
    })
}

pub(crate) fn to_epoch_ms(value: DateTime<Utc>) -> i64 {
    value.timestamp_millis()
}

pub(crate) fn from_epoch_ms(value: i64, column: &'static str) -> RepoResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(value).ok_or_else(|| {
        RepoError::InvalidData(format!("timestamp `{value}` out of range in {column}"))
    })
}

#[cfg(test)]
mod tests {
    use super::{ConstraintKind, RepoError};
    use rusqlite::{ffi, Connection};

    fn sqlite_failure(extended_code: i32, message: &str) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(
            ffi::Error::new(extended_code),
            Some(message.to_string()),
        )
    }

    #[test]
    fn foreign_key_failures_are_constraint_violations() {
        let err = RepoError::from(sqlite_failure(
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
            "FOREIGN KEY constraint failed",
        ));
        match err {
            RepoError::Constraint(violation) => {
                assert_eq!(violation.kind, ConstraintKind::ForeignKey);
                assert_eq!(violation.message, "FOREIGN KEY constraint failed");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unreadable_column_values_are_invalid_data() {
        let conn = Connection::open_in_memory().unwrap();
        let read_error = conn
            .query_row("SELECT -1;", [], |row| row.get::<_, u32>(0))
            .unwrap_err();

        let err = RepoError::from(read_error);
        assert!(matches!(err, RepoError::InvalidData(_)), "{err}");

        let err = RepoError::from(rusqlite::Error::IntegralValueOutOfRange(0, -1));
        assert!(matches!(err, RepoError::InvalidData(_)));
    }

    #[test]
    fn busy_failures_mean_store_unavailable() {
        let err = RepoError::from(sqlite_failure(ffi::SQLITE_BUSY, "database is locked"));
        assert!(matches!(err, RepoError::StoreUnavailable(_)));
    }
}
