//! Calendar, meeting and reminder records.
//!
//! # Responsibility
//! - Define the three persisted record shapes and their factory helpers.
//! - Expose derived, never-persisted predicates (`is_owner`, `is_start_in_future`).
//!
//! # Invariants
//! - Store-generated fields (`id`, meeting timestamps) are `None` until the
//!   record has been committed through a `DataContext`.
//! - Relationships are plain foreign-key ids; there are no back-pointers.
//! - No length or business-rule validation happens here; the store schema
//!   owns those constraints.

pub mod calendar;
pub mod meeting;
pub mod reminder;

/// Store-generated row identifier shared by every table.
pub type RowId = i64;

/// Common surface of records managed by the change tracker.
pub trait Entity: Clone + PartialEq {
    /// Singular entity name used in errors and log events.
    const NAME: &'static str;

    /// Generated id, `None` while the record only exists in memory.
    fn id(&self) -> Option<RowId>;
}
