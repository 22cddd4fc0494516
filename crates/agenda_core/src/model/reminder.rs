//! Reminder record.

use super::meeting::MeetingId;
use super::{Entity, RowId};
use serde::{Deserialize, Serialize};

/// Reminder identifier.
pub type ReminderId = RowId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    /// Generated by the store on insert.
    pub id: Option<ReminderId>,
    /// Offset before the meeting start, in minutes.
    pub remind_before: u32,
    pub meeting_id: MeetingId,
}

impl Reminder {
    /// Creates an unpersisted reminder for `meeting_id`.
    pub fn create(remind_before: u32, meeting_id: MeetingId) -> Self {
        Self {
            id: None,
            remind_before,
            meeting_id,
        }
    }
}

impl Entity for Reminder {
    const NAME: &'static str = "reminder";

    fn id(&self) -> Option<RowId> {
        self.id
    }
}
