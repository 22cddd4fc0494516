//! Meeting repository contract and SQLite implementation.
//!
//! # Invariants
//! - `created_at` is written only by the column default on insert.
//! - Every insert and update refreshes `changed_at` from the store clock,
//!   never moving it before `created_at`.

use super::{from_epoch_ms, to_epoch_ms, RepoError, RepoResult};
use crate::model::calendar::CalendarId;
use crate::model::meeting::{Meeting, MeetingId};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

const MEETING_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    created_at,
    changed_at,
    start_at,
    duration,
    calendar_id
FROM meetings";

/// Current store time in epoch milliseconds.
const STORE_NOW_MS_SQL: &str = "CAST((julianday('now') - 2440587.5) * 86400000.0 AS INTEGER)";

/// Store-generated values returned after a meeting write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeetingStamps {
    pub id: MeetingId,
    pub created_at: DateTime<Utc>,
    pub changed_at: DateTime<Utc>,
}

/// Repository interface for the `meetings` table.
pub trait MeetingRepository {
    fn insert_meeting(&self, meeting: &Meeting) -> RepoResult<MeetingStamps>;
    /// Overwrites the mutable columns of row `id` and refreshes `changed_at`.
    fn update_meeting(&self, id: MeetingId, meeting: &Meeting) -> RepoResult<MeetingStamps>;
    fn get_meeting(&self, id: MeetingId) -> RepoResult<Option<Meeting>>;
    /// Lists meetings of one calendar ordered by start time.
    fn list_meetings_for_calendar(&self, calendar_id: CalendarId) -> RepoResult<Vec<Meeting>>;
}

/// SQLite-backed meeting repository.
pub struct SqliteMeetingRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMeetingRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl MeetingRepository for SqliteMeetingRepository<'_> {
    fn insert_meeting(&self, meeting: &Meeting) -> RepoResult<MeetingStamps> {
        let (id, created_at, changed_at) = self.conn.query_row(
            "INSERT INTO meetings (
                title,
                description,
                start_at,
                duration,
                calendar_id
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id, created_at, changed_at;",
            params![
                meeting.title.as_str(),
                meeting.description.as_deref(),
                to_epoch_ms(meeting.start_at),
                meeting.duration,
                meeting.calendar_id,
            ],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, i64>(2)?)),
        )?;

        Ok(MeetingStamps {
            id,
            created_at: from_epoch_ms(created_at, "meetings.created_at")?,
            changed_at: from_epoch_ms(changed_at, "meetings.changed_at")?,
        })
    }

    fn update_meeting(&self, id: MeetingId, meeting: &Meeting) -> RepoResult<MeetingStamps> {
        let stamps = self
            .conn
            .query_row(
                &format!(
                    "UPDATE meetings
                     SET
                        title = ?1,
                        description = ?2,
                        start_at = ?3,
                        duration = ?4,
                        calendar_id = ?5,
                        changed_at = MAX(created_at, {STORE_NOW_MS_SQL})
                     WHERE id = ?6
                     RETURNING created_at, changed_at;"
                ),
                params![
                    meeting.title.as_str(),
                    meeting.description.as_deref(),
                    to_epoch_ms(meeting.start_at),
                    meeting.duration,
                    meeting.calendar_id,
                    id,
                ],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;

        let Some((created_at, changed_at)) = stamps else {
            return Err(RepoError::NotFound {
                entity: "meeting",
                id,
            });
        };

        Ok(MeetingStamps {
            id,
            created_at: from_epoch_ms(created_at, "meetings.created_at")?,
            changed_at: from_epoch_ms(changed_at, "meetings.changed_at")?,
        })
    }

    fn get_meeting(&self, id: MeetingId) -> RepoResult<Option<Meeting>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MEETING_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_meeting_row(row)?));
        }
        Ok(None)
    }

    fn list_meetings_for_calendar(&self, calendar_id: CalendarId) -> RepoResult<Vec<Meeting>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MEETING_SELECT_SQL}
             WHERE calendar_id = ?1
             ORDER BY start_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([calendar_id])?;
        let mut meetings = Vec::new();
        while let Some(row) = rows.next()? {
            meetings.push(parse_meeting_row(row)?);
        }
        Ok(meetings)
    }
}

fn parse_meeting_row(row: &Row<'_>) -> RepoResult<Meeting> {
    let created_at = from_epoch_ms(row.get("created_at")?, "meetings.created_at")?;
    let changed_at = from_epoch_ms(row.get("changed_at")?, "meetings.changed_at")?;
    if changed_at < created_at {
        return Err(RepoError::InvalidData(format!(
            "meetings.changed_at `{changed_at}` precedes created_at `{created_at}`"
        )));
    }

    Ok(Meeting {
        id: Some(row.get("id")?),
        title: row.get("title")?,
        description: row.get("description")?,
        created_at: Some(created_at),
        changed_at: Some(changed_at),
        start_at: from_epoch_ms(row.get("start_at")?, "meetings.start_at")?,
        duration: row.get("duration")?,
        calendar_id: row.get("calendar_id")?,
    })
}
