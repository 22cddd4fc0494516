//! Calendar record.

use super::{Entity, RowId};
use serde::{Deserialize, Serialize};

/// Calendar identifier.
pub type CalendarId = RowId;

/// A calendar owned by one person. Meetings reference it by `calendar_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    /// Generated by the store on insert.
    pub id: Option<CalendarId>,
    /// Owner display name, at most 100 characters in the store.
    pub owner: String,
}

impl Calendar {
    /// Creates an unpersisted calendar for `owner`.
    pub fn create(owner: impl Into<String>) -> Self {
        Self {
            id: None,
            owner: owner.into(),
        }
    }

    /// Returns whether `candidate` is exactly the owner (case-sensitive, untrimmed).
    pub fn is_owner(&self, candidate: &str) -> bool {
        self.owner == candidate
    }
}

impl Entity for Calendar {
    const NAME: &'static str = "calendar";

    fn id(&self) -> Option<RowId> {
        self.id
    }
}
