//! Calendar, meeting and reminder storage on SQLite.
//! Entities are staged and committed through a `DataContext`.

pub mod config;
pub mod context;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;

pub use config::{AgendaConfig, ConfigError, StoreLocation};
pub use context::{
    CommitObserver, ContextError, ContextResult, DataContext, LogCommitObserver, PendingChanges,
    Tracked,
};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::calendar::{Calendar, CalendarId};
pub use model::meeting::{Meeting, MeetingId};
pub use model::reminder::{Reminder, ReminderId};
pub use model::{Entity, RowId};
pub use repo::{ConstraintKind, ConstraintViolation, RepoError, RepoResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
