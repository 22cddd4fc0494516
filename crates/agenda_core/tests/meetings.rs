use agenda_core::{Calendar, CalendarId, ConstraintKind, ContextError, DataContext, Meeting};
use chrono::{Duration, Utc};

fn context_with_calendar() -> (DataContext, CalendarId) {
    let mut context = DataContext::open_in_memory().unwrap();
    let handle = context.add_calendar(Calendar::create("Arthur Dent"));
    context.save_changes().unwrap();
    let calendar_id = context.calendar(&handle).unwrap().id.unwrap();
    (context, calendar_id)
}

fn lunch(calendar_id: CalendarId) -> Meeting {
    Meeting::create(
        "Have lunch with Zaphod Beeblebrox",
        Some("Ford's semi-half-cousin likes tea".to_string()),
        42,
        Utc::now() + Duration::days(10),
        calendar_id,
    )
}

#[test]
fn insert_populates_store_generated_fields() {
    let (mut context, calendar_id) = context_with_calendar();
    let handle = context.add_meeting(lunch(calendar_id));

    assert_eq!(context.save_changes().unwrap(), 1);

    let meeting = context.meeting(&handle).unwrap();
    assert!(meeting.id.unwrap() > 0);
    let created_at = meeting.created_at.unwrap();
    let changed_at = meeting.changed_at.unwrap();
    assert!(changed_at >= created_at);
    assert!((Utc::now() - created_at).num_minutes().abs() < 5);
}

#[test]
fn unknown_calendar_is_a_foreign_key_violation_and_inserts_nothing() {
    let (mut context, calendar_id) = context_with_calendar();
    let handle = context.add_meeting(lunch(calendar_id + 1000));

    let err = context.save_changes().unwrap_err();
    assert_eq!(err.constraint_kind(), Some(ConstraintKind::ForeignKey));

    assert_eq!(context.meeting(&handle).unwrap().id, None);
    assert!(context.meetings_of_calendar(calendar_id + 1000).unwrap().is_empty());
    let rows: i64 = context
        .connection()
        .query_row("SELECT COUNT(*) FROM meetings;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 0);
}

#[test]
fn failed_commit_rolls_back_every_staged_row() {
    let (mut context, calendar_id) = context_with_calendar();
    let calendar = context.add_calendar(Calendar::create("Ford Prefect"));
    let meeting = context.add_meeting(lunch(-1));

    assert!(context.save_changes().is_err());
    assert_eq!(context.list_calendars().unwrap().len(), 1);
    assert_eq!(context.pending_changes().inserts, 2);

    context.meeting_mut(&meeting).unwrap().calendar_id = calendar_id;
    assert_eq!(context.save_changes().unwrap(), 2);
    assert!(context.calendar(&calendar).unwrap().id.is_some());
    assert_eq!(context.meetings_of_calendar(calendar_id).unwrap().len(), 1);
}

#[test]
fn title_and_description_lengths_are_enforced_by_the_store() {
    let (mut context, calendar_id) = context_with_calendar();

    let mut long_title = lunch(calendar_id);
    long_title.title = "t".repeat(201);
    let handle = context.add_meeting(long_title);
    let err = context.save_changes().unwrap_err();
    assert_eq!(err.constraint_kind(), Some(ConstraintKind::Check));
    context.detach_meeting(&handle);

    let mut long_description = lunch(calendar_id);
    long_description.description = Some("d".repeat(801));
    let handle = context.add_meeting(long_description);
    let err = context.save_changes().unwrap_err();
    assert!(matches!(err, ContextError::Constraint(_)));
    context.detach_meeting(&handle);

    let mut at_limits = lunch(calendar_id);
    at_limits.title = "t".repeat(200);
    at_limits.description = Some("d".repeat(800));
    context.add_meeting(at_limits);
    assert_eq!(context.save_changes().unwrap(), 1);
}

#[test]
fn update_refreshes_changed_at_and_keeps_created_at() {
    let (mut context, calendar_id) = context_with_calendar();
    let handle = context.add_meeting(lunch(calendar_id));
    context.save_changes().unwrap();
    let inserted = context.meeting(&handle).unwrap().clone();

    let new_start = Utc::now() - Duration::days(667);
    context.meeting_mut(&handle).unwrap().start_at = new_start;
    assert_eq!(context.save_changes().unwrap(), 1);

    let updated = context.meeting(&handle).unwrap();
    assert_eq!(updated.created_at, inserted.created_at);
    assert!(updated.changed_at.unwrap() >= inserted.changed_at.unwrap());
    assert!(updated.changed_at.unwrap() >= updated.created_at.unwrap());

    let stored = &context.meetings_of_calendar(calendar_id).unwrap()[0];
    assert_eq!(stored.start_at.timestamp_millis(), new_start.timestamp_millis());
    assert_eq!(stored.created_at, inserted.created_at);
}

#[test]
fn created_at_cannot_be_overwritten() {
    let (mut context, calendar_id) = context_with_calendar();
    let handle = context.add_meeting(lunch(calendar_id));
    context.save_changes().unwrap();
    let created_at = context.meeting(&handle).unwrap().created_at;

    context.meeting_mut(&handle).unwrap().created_at = Some(Utc::now() + Duration::days(3650));
    context.save_changes().unwrap();

    assert_eq!(context.meeting(&handle).unwrap().created_at, created_at);
    let stored = &context.meetings_of_calendar(calendar_id).unwrap()[0];
    assert_eq!(stored.created_at, created_at);
}

#[test]
fn find_meeting_returns_tracked_instance_that_can_be_updated() {
    let (mut context, calendar_id) = context_with_calendar();
    let handle = context.add_meeting(lunch(calendar_id));
    context.save_changes().unwrap();
    let id = context.meeting(&handle).unwrap().id.unwrap();

    let found = context.find_meeting(id).unwrap().unwrap();
    assert_eq!(found, handle);

    let mut other = DataContext::from_connection(
        agenda_core::db::open_db_in_memory().unwrap(),
    );
    assert!(other.find_meeting(id).unwrap().is_none());
    assert!(matches!(
        other.meeting(&found),
        Err(ContextError::UnknownEntry { entity: "meeting" })
    ));
}

#[test]
fn meetings_of_calendar_are_ordered_by_start() {
    let (mut context, calendar_id) = context_with_calendar();
    let now = Utc::now();
    let mut late = lunch(calendar_id);
    late.title = "Late".to_string();
    late.start_at = now + Duration::days(2);
    let mut early = lunch(calendar_id);
    early.title = "Early".to_string();
    early.start_at = now + Duration::days(1);
    early.description = None;

    context.add_meetings([late, early]);
    context.save_changes().unwrap();

    let meetings = context.meetings_of_calendar(calendar_id).unwrap();
    let titles: Vec<&str> = meetings.iter().map(|meeting| meeting.title.as_str()).collect();
    assert_eq!(titles, vec!["Early", "Late"]);
    assert_eq!(meetings[0].description, None);
}

#[test]
fn updating_a_vanished_meeting_fails_the_whole_commit() {
    let (mut context, calendar_id) = context_with_calendar();
    let handle = context.add_meeting(lunch(calendar_id));
    context.save_changes().unwrap();
    let id = context.meeting(&handle).unwrap().id.unwrap();

    context
        .connection()
        .execute("DELETE FROM meetings WHERE id = ?1;", [id])
        .unwrap();
    context.meeting_mut(&handle).unwrap().start_at = Utc::now() - Duration::days(667);
    let mut second = lunch(calendar_id);
    second.title = "Second lunch".to_string();
    let staged = context.add_meeting(second);

    let err = context.save_changes().unwrap_err();
    assert_eq!(err.code(), "not_found");
    assert!(matches!(
        err,
        ContextError::NotFound { entity: "meeting", id: missing } if missing == id
    ));

    assert!(context.meetings_of_calendar(calendar_id).unwrap().is_empty());
    assert_eq!(context.meeting(&staged).unwrap().id, None);
    assert_eq!(context.meeting(&staged).unwrap().created_at, None);
}
