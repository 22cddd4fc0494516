//! Persistence context: stages calendars, meetings and reminders and commits
//! them to the store.
//!
//! # Responsibility
//! - Track new and loaded entities and detect edits by snapshot comparison.
//! - Flush all pending changes in one immediate transaction.
//! - Write store-generated values (ids, meeting timestamps) back onto the
//!   tracked instances after a successful commit.
//!
//! # Invariants
//! - Nothing staged is visible in the store before `save_changes` succeeds.
//! - A failed commit rolls back completely and leaves tracked state as it was.
//! - Every commit attempt reaches the `CommitObserver` before any SQL runs.
//! - Dropping the context closes its connection; uncommitted changes are lost.

mod observer;
mod tracking;

pub use observer::{CommitObserver, LogCommitObserver, PendingChanges};
pub use tracking::Tracked;

use crate::config::StoreLocation;
use crate::db::{open_db_in_memory, open_store, DbError};
use crate::model::calendar::{Calendar, CalendarId};
use crate::model::meeting::{Meeting, MeetingId};
use crate::model::reminder::{Reminder, ReminderId};
use crate::model::Entity;
use crate::repo::calendar_repo::{CalendarRepository, SqliteCalendarRepository};
use crate::repo::meeting_repo::{MeetingRepository, SqliteMeetingRepository};
use crate::repo::reminder_repo::{ReminderRepository, SqliteReminderRepository};
use crate::repo::{ConstraintKind, ConstraintViolation, RepoError};
use log::{debug, warn};
use rusqlite::{Connection, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use tracking::ChangeSet;

pub type ContextResult<T> = Result<T, ContextError>;

/// Error surfaced by `DataContext` operations.
#[derive(Debug)]
pub enum ContextError {
    /// The store schema rejected a write (foreign key, length check, ...).
    Constraint(ConstraintViolation),
    /// The store could not be reached or the transaction was aborted.
    StoreUnavailable(DbError),
    /// An update targeted a row that no longer exists.
    NotFound { entity: &'static str, id: i64 },
    /// A stored value could not be read back into its entity field.
    InvalidData(String),
    /// The handle is detached or belongs to another context.
    UnknownEntry { entity: &'static str },
}

impl ContextError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Constraint(_) => "constraint_violation",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::NotFound { .. } => "not_found",
            Self::InvalidData(_) => "invalid_data",
            Self::UnknownEntry { .. } => "unknown_entry",
        }
    }

    /// Returns the violated rule when this is a constraint violation.
    pub fn constraint_kind(&self) -> Option<ConstraintKind> {
        match self {
            Self::Constraint(violation) => Some(violation.kind),
            _ => None,
        }
    }
}

impl Display for ContextError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Constraint(violation) => write!(f, "{violation}"),
            Self::StoreUnavailable(err) => write!(f, "store unavailable: {err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UnknownEntry { entity } => {
                write!(f, "{entity} handle is not tracked by this context")
            }
        }
    }
}

impl Error for ContextError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Constraint(violation) => Some(violation),
            Self::StoreUnavailable(err) => Some(err),
            Self::NotFound { .. } | Self::InvalidData(_) | Self::UnknownEntry { .. } => None,
        }
    }
}

impl From<RepoError> for ContextError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Constraint(violation) => Self::Constraint(violation),
            RepoError::StoreUnavailable(err) => Self::StoreUnavailable(err),
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::InvalidData(message) => Self::InvalidData(message),
        }
    }
}

impl From<DbError> for ContextError {
    fn from(value: DbError) -> Self {
        RepoError::from(value).into()
    }
}

impl From<rusqlite::Error> for ContextError {
    fn from(value: rusqlite::Error) -> Self {
        RepoError::from(value).into()
    }
}

/// Unit of work over one store connection.
pub struct DataContext {
    conn: Connection,
    observer: Box<dyn CommitObserver>,
    calendars: ChangeSet<Calendar>,
    meetings: ChangeSet<Meeting>,
    reminders: ChangeSet<Reminder>,
}

impl DataContext {
    /// Opens the store at `location` and ensures its schema.
    pub fn open(location: &StoreLocation) -> ContextResult<Self> {
        Ok(Self::from_connection(open_store(location)?))
    }

    /// Opens a fresh private in-memory store.
    pub fn open_in_memory() -> ContextResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps a connection returned by `db::open_db` or `db::open_db_in_memory`.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            observer: Box::new(LogCommitObserver),
            calendars: ChangeSet::default(),
            meetings: ChangeSet::default(),
            reminders: ChangeSet::default(),
        }
    }

    /// Replaces the commit observer.
    pub fn with_observer(mut self, observer: impl CommitObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Read-only access to the underlying connection for diagnostics.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn add_calendar(&mut self, calendar: Calendar) -> Tracked<Calendar> {
        self.calendars.add(calendar)
    }

    pub fn add_calendars(
        &mut self,
        calendars: impl IntoIterator<Item = Calendar>,
    ) -> Vec<Tracked<Calendar>> {
        calendars
            .into_iter()
            .map(|calendar| self.calendars.add(calendar))
            .collect()
    }

    pub fn add_meeting(&mut self, meeting: Meeting) -> Tracked<Meeting> {
        self.meetings.add(meeting)
    }

    pub fn add_meetings(
        &mut self,
        meetings: impl IntoIterator<Item = Meeting>,
    ) -> Vec<Tracked<Meeting>> {
        meetings
            .into_iter()
            .map(|meeting| self.meetings.add(meeting))
            .collect()
    }

    pub fn add_reminder(&mut self, reminder: Reminder) -> Tracked<Reminder> {
        self.reminders.add(reminder)
    }

    pub fn add_reminders(
        &mut self,
        reminders: impl IntoIterator<Item = Reminder>,
    ) -> Vec<Tracked<Reminder>> {
        reminders
            .into_iter()
            .map(|reminder| self.reminders.add(reminder))
            .collect()
    }

    pub fn calendar(&self, handle: &Tracked<Calendar>) -> ContextResult<&Calendar> {
        self.calendars.get(handle).ok_or_else(unknown_entry::<Calendar>)
    }

    pub fn calendar_mut(&mut self, handle: &Tracked<Calendar>) -> ContextResult<&mut Calendar> {
        self.calendars
            .get_mut(handle)
            .ok_or_else(unknown_entry::<Calendar>)
    }

    pub fn meeting(&self, handle: &Tracked<Meeting>) -> ContextResult<&Meeting> {
        self.meetings.get(handle).ok_or_else(unknown_entry::<Meeting>)
    }

    pub fn meeting_mut(&mut self, handle: &Tracked<Meeting>) -> ContextResult<&mut Meeting> {
        self.meetings
            .get_mut(handle)
            .ok_or_else(unknown_entry::<Meeting>)
    }

    pub fn reminder(&self, handle: &Tracked<Reminder>) -> ContextResult<&Reminder> {
        self.reminders.get(handle).ok_or_else(unknown_entry::<Reminder>)
    }

    pub fn reminder_mut(&mut self, handle: &Tracked<Reminder>) -> ContextResult<&mut Reminder> {
        self.reminders
            .get_mut(handle)
            .ok_or_else(unknown_entry::<Reminder>)
    }

    /// Loads a calendar by id and tracks it. Absence is `Ok(None)`.
    pub fn find_calendar(&mut self, id: CalendarId) -> ContextResult<Option<Tracked<Calendar>>> {
        let loaded = SqliteCalendarRepository::new(&self.conn).get_calendar(id)?;
        Ok(loaded.map(|calendar| self.calendars.attach(calendar)))
    }

    /// Loads a meeting by id and tracks it. Absence is `Ok(None)`.
    pub fn find_meeting(&mut self, id: MeetingId) -> ContextResult<Option<Tracked<Meeting>>> {
        let loaded = SqliteMeetingRepository::new(&self.conn).get_meeting(id)?;
        Ok(loaded.map(|meeting| self.meetings.attach(meeting)))
    }

    /// Loads a reminder by id and tracks it. Absence is `Ok(None)`.
    pub fn find_reminder(&mut self, id: ReminderId) -> ContextResult<Option<Tracked<Reminder>>> {
        let loaded = SqliteReminderRepository::new(&self.conn).get_reminder(id)?;
        Ok(loaded.map(|reminder| self.reminders.attach(reminder)))
    }

    /// Lists committed calendars. Results are detached copies.
    pub fn list_calendars(&self) -> ContextResult<Vec<Calendar>> {
        Ok(SqliteCalendarRepository::new(&self.conn).list_calendars()?)
    }

    /// Lists committed calendars whose owner matches case-insensitively.
    pub fn calendars_owned_by(&self, owner: &str) -> ContextResult<Vec<Calendar>> {
        Ok(SqliteCalendarRepository::new(&self.conn).list_calendars_by_owner(owner)?)
    }

    /// Lists committed meetings of a calendar. Results are detached copies.
    pub fn meetings_of_calendar(&self, calendar_id: CalendarId) -> ContextResult<Vec<Meeting>> {
        Ok(SqliteMeetingRepository::new(&self.conn).list_meetings_for_calendar(calendar_id)?)
    }

    /// Lists committed reminders of a meeting. Results are detached copies.
    pub fn reminders_of_meeting(&self, meeting_id: MeetingId) -> ContextResult<Vec<Reminder>> {
        Ok(SqliteReminderRepository::new(&self.conn).list_reminders_for_meeting(meeting_id)?)
    }

    /// Stops tracking a calendar; returns `false` if it was not tracked.
    pub fn detach_calendar(&mut self, handle: &Tracked<Calendar>) -> bool {
        self.calendars.detach(handle)
    }

    pub fn detach_meeting(&mut self, handle: &Tracked<Meeting>) -> bool {
        self.meetings.detach(handle)
    }

    pub fn detach_reminder(&mut self, handle: &Tracked<Reminder>) -> bool {
        self.reminders.detach(handle)
    }

    /// Counts what the next `save_changes` would write.
    pub fn pending_changes(&self) -> PendingChanges {
        PendingChanges {
            inserts: self.calendars.pending_inserts()
                + self.meetings.pending_inserts()
                + self.reminders.pending_inserts(),
            updates: self.calendars.pending_updates()
                + self.meetings.pending_updates()
                + self.reminders.pending_updates(),
        }
    }

    pub fn has_changes(&self) -> bool {
        !self.pending_changes().is_empty()
    }

    /// Forgets staged inserts and reverts edits to the last committed state.
    pub fn discard_changes(&mut self) {
        self.calendars.discard();
        self.meetings.discard();
        self.reminders.discard();
    }

    /// Writes every pending insert and update in one transaction.
    ///
    /// Returns the number of affected rows.
    ///
    /// # Errors
    /// - `Constraint` when the schema rejects a row; nothing is written.
    /// - `NotFound` when an updated row vanished from the store.
    /// - `StoreUnavailable` for connection or transaction failures.
    pub fn save_changes(&mut self) -> ContextResult<usize> {
        let pending = self.pending_changes();
        self.observer.on_commit_start(&pending);
        let outcome = self.commit(&pending);
        self.observer
            .on_commit_finish(&pending, outcome.as_ref().copied());
        outcome
    }

    fn commit(&mut self, pending: &PendingChanges) -> ContextResult<usize> {
        if pending.is_empty() {
            return Ok(0);
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let calendar_repo = SqliteCalendarRepository::new(&tx);
        let meeting_repo = SqliteMeetingRepository::new(&tx);
        let reminder_repo = SqliteReminderRepository::new(&tx);

        let mut committed_calendars = Vec::new();
        let mut committed_meetings = Vec::new();
        let mut committed_reminders = Vec::new();

        for (index, calendar) in self.calendars.added() {
            let id = calendar_repo.insert_calendar(calendar)?;
            committed_calendars.push((index, Calendar {
                id: Some(id),
                ..calendar.clone()
            }));
        }
        for (index, meeting) in self.meetings.added() {
            let stamps = meeting_repo.insert_meeting(meeting)?;
            committed_meetings.push((index, Meeting {
                id: Some(stamps.id),
                created_at: Some(stamps.created_at),
                changed_at: Some(stamps.changed_at),
                ..meeting.clone()
            }));
        }
        for (index, reminder) in self.reminders.added() {
            let id = reminder_repo.insert_reminder(reminder)?;
            committed_reminders.push((index, Reminder {
                id: Some(id),
                ..reminder.clone()
            }));
        }

        for (index, id, calendar) in self.calendars.modified() {
            calendar_repo.update_calendar(id, calendar)?;
            committed_calendars.push((index, Calendar {
                id: Some(id),
                ..calendar.clone()
            }));
        }
        for (index, id, meeting) in self.meetings.modified() {
            let stamps = meeting_repo.update_meeting(id, meeting)?;
            committed_meetings.push((index, Meeting {
                id: Some(stamps.id),
                created_at: Some(stamps.created_at),
                changed_at: Some(stamps.changed_at),
                ..meeting.clone()
            }));
        }
        for (index, id, reminder) in self.reminders.modified() {
            reminder_repo.update_reminder(id, reminder)?;
            committed_reminders.push((index, Reminder {
                id: Some(id),
                ..reminder.clone()
            }));
        }

        tx.commit()?;

        let rows = committed_calendars.len() + committed_meetings.len() + committed_reminders.len();
        for (index, calendar) in committed_calendars {
            self.calendars.accept(index, calendar);
        }
        for (index, meeting) in committed_meetings {
            self.meetings.accept(index, meeting);
        }
        for (index, reminder) in committed_reminders {
            self.reminders.accept(index, reminder);
        }

        debug!("event=commit_applied module=context status=ok rows={rows}");
        Ok(rows)
    }
}

impl Drop for DataContext {
    fn drop(&mut self) {
        let pending = self.pending_changes();
        if !pending.is_empty() {
            warn!(
                "event=context_close module=context status=discarded inserts={} updates={}",
                pending.inserts, pending.updates
            );
        }
    }
}

fn unknown_entry<T: Entity>() -> ContextError {
    ContextError::UnknownEntry { entity: T::NAME }
}
