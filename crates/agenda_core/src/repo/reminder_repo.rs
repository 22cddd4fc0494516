//! Reminder repository contract and SQLite implementation.

use super::{RepoError, RepoResult};
use crate::model::meeting::MeetingId;
use crate::model::reminder::{Reminder, ReminderId};
use rusqlite::{params, Connection, Row};

const REMINDER_SELECT_SQL: &str = "SELECT id, remind_before, meeting_id FROM reminders";

/// Repository interface for the `reminders` table.
pub trait ReminderRepository {
    fn insert_reminder(&self, reminder: &Reminder) -> RepoResult<ReminderId>;
    fn update_reminder(&self, id: ReminderId, reminder: &Reminder) -> RepoResult<()>;
    fn get_reminder(&self, id: ReminderId) -> RepoResult<Option<Reminder>>;
    /// Lists reminders of one meeting, largest offset first.
    fn list_reminders_for_meeting(&self, meeting_id: MeetingId) -> RepoResult<Vec<Reminder>>;
}

/// SQLite-backed reminder repository.
pub struct SqliteReminderRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReminderRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ReminderRepository for SqliteReminderRepository<'_> {
    fn insert_reminder(&self, reminder: &Reminder) -> RepoResult<ReminderId> {
        self.conn.execute(
            "INSERT INTO reminders (remind_before, meeting_id) VALUES (?1, ?2);",
            params![reminder.remind_before, reminder.meeting_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_reminder(&self, id: ReminderId, reminder: &Reminder) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE reminders SET remind_before = ?1, meeting_id = ?2 WHERE id = ?3;",
            params![reminder.remind_before, reminder.meeting_id, id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "reminder",
                id,
            });
        }
        Ok(())
    }

    fn get_reminder(&self, id: ReminderId) -> RepoResult<Option<Reminder>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{REMINDER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_reminder_row(row)?));
        }
        Ok(None)
    }

    fn list_reminders_for_meeting(&self, meeting_id: MeetingId) -> RepoResult<Vec<Reminder>> {
        let mut stmt = self.conn.prepare(&format!(
            "{REMINDER_SELECT_SQL}
             WHERE meeting_id = ?1
             ORDER BY remind_before DESC, id ASC;"
        ))?;
        let mut rows = stmt.query([meeting_id])?;
        let mut reminders = Vec::new();
        while let Some(row) = rows.next()? {
            reminders.push(parse_reminder_row(row)?);
        }
        Ok(reminders)
    }
}

fn parse_reminder_row(row: &Row<'_>) -> RepoResult<Reminder> {
    Ok(Reminder {
        id: Some(row.get("id")?),
        remind_before: row.get("remind_before")?,
        meeting_id: row.get("meeting_id")?,
    })
}
