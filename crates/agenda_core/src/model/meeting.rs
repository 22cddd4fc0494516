//! Meeting record.
//!
//! # Invariants
//! - `created_at` is written once by the store and never changes afterwards.
//! - `changed_at >= created_at` once both are set.

use super::calendar::CalendarId;
use super::{Entity, RowId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Meeting identifier.
pub type MeetingId = RowId;

/// A meeting on one calendar. Reminders reference it by `meeting_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    /// Generated by the store on insert.
    pub id: Option<MeetingId>,
    /// At most 200 characters in the store.
    pub title: String,
    /// At most 800 characters in the store.
    pub description: Option<String>,
    /// Set by the store on insert.
    pub created_at: Option<DateTime<Utc>>,
    /// Set by the store on every insert and update.
    pub changed_at: Option<DateTime<Utc>>,
    pub start_at: DateTime<Utc>,
    /// Length of the meeting in minutes.
    pub duration: u32,
    pub calendar_id: CalendarId,
}

impl Meeting {
    /// Creates an unpersisted meeting on `calendar_id`.
    pub fn create(
        title: impl Into<String>,
        description: Option<String>,
        duration: u32,
        start_at: DateTime<Utc>,
        calendar_id: CalendarId,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            description,
            created_at: None,
            changed_at: None,
            start_at,
            duration,
            calendar_id,
        }
    }

    /// Returns whether the meeting starts strictly after the current UTC time.
    pub fn is_start_in_future(&self) -> bool {
        self.is_start_in_future_at(Utc::now())
    }

    /// Returns whether the meeting starts strictly after `now`.
    pub fn is_start_in_future_at(&self, now: DateTime<Utc>) -> bool {
        self.start_at > now
    }
}

impl Entity for Meeting {
    const NAME: &'static str = "meeting";

    fn id(&self) -> Option<RowId> {
        self.id
    }
}
