//! Calendar repository contract and SQLite implementation.

use super::{RepoError, RepoResult};
use crate::model::calendar::{Calendar, CalendarId};
use rusqlite::{params, Connection, Row};

const CALENDAR_SELECT_SQL: &str = "SELECT id, owner FROM calendars";

/// Repository interface for the `calendars` table.
pub trait CalendarRepository {
    /// Inserts a new row and returns the generated id.
    fn insert_calendar(&self, calendar: &Calendar) -> RepoResult<CalendarId>;
    /// Overwrites the mutable columns of row `id`.
    fn update_calendar(&self, id: CalendarId, calendar: &Calendar) -> RepoResult<()>;
    fn get_calendar(&self, id: CalendarId) -> RepoResult<Option<Calendar>>;
    /// Lists every calendar ordered by id.
    fn list_calendars(&self) -> RepoResult<Vec<Calendar>>;
    /// Lists calendars whose owner matches under the case-insensitive collation.
    fn list_calendars_by_owner(&self, owner: &str) -> RepoResult<Vec<Calendar>>;
}

/// SQLite-backed calendar repository.
pub struct SqliteCalendarRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCalendarRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_calendars(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> RepoResult<Vec<Calendar>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut calendars = Vec::new();
        while let Some(row) = rows.next()? {
            calendars.push(parse_calendar_row(row)?);
        }
        Ok(calendars)
    }
}

impl CalendarRepository for SqliteCalendarRepository<'_> {
    fn insert_calendar(&self, calendar: &Calendar) -> RepoResult<CalendarId> {
        self.conn.execute(
            "INSERT INTO calendars (owner) VALUES (?1);",
            params![calendar.owner.as_str()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_calendar(&self, id: CalendarId, calendar: &Calendar) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE calendars SET owner = ?1 WHERE id = ?2;",
            params![calendar.owner.as_str(), id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "calendar",
                id,
            });
        }
        Ok(())
    }

    fn get_calendar(&self, id: CalendarId) -> RepoResult<Option<Calendar>> {
        let mut calendars =
            self.query_calendars(&format!("{CALENDAR_SELECT_SQL} WHERE id = ?1;"), [id])?;
        Ok(calendars.pop())
    }

    fn list_calendars(&self) -> RepoResult<Vec<Calendar>> {
        self.query_calendars(&format!("{CALENDAR_SELECT_SQL} ORDER BY id ASC;"), [])
    }

    fn list_calendars_by_owner(&self, owner: &str) -> RepoResult<Vec<Calendar>> {
        self.query_calendars(
            &format!("{CALENDAR_SELECT_SQL} WHERE owner = ?1 ORDER BY id ASC;"),
            [owner],
        )
    }
}

fn parse_calendar_row(row: &Row<'_>) -> RepoResult<Calendar> {
    Ok(Calendar {
        id: Some(row.get("id")?),
        owner: row.get("owner")?,
    })
}
