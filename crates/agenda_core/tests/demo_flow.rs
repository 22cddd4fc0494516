use agenda_core::{Calendar, DataContext, Meeting, Reminder};
use chrono::{Duration, Utc};

#[test]
fn lunch_with_zaphod_end_to_end() {
    let mut context = DataContext::open_in_memory().unwrap();

    let calendar = context.add_calendar(Calendar::create("Arthur Dent"));
    context.save_changes().unwrap();
    let calendar_id = context.calendar(&calendar).unwrap().id.unwrap();
    assert!(context.calendar(&calendar).unwrap().is_owner("Arthur Dent"));
    assert!(!context.calendar(&calendar).unwrap().is_owner("Ford Prefect"));

    let meeting = context.add_meeting(Meeting::create(
        "Have lunch with Zaphod Beeblebrox",
        Some("Ford's semi-half-cousin likes tea".to_string()),
        42,
        Utc::now() + Duration::days(10),
        calendar_id,
    ));
    context.save_changes().unwrap();
    let meeting_id = context.meeting(&meeting).unwrap().id.unwrap();
    assert!(context.meeting(&meeting).unwrap().is_start_in_future());

    context.add_reminders([
        Reminder::create(4, meeting_id),
        Reminder::create(2, meeting_id),
    ]);
    assert_eq!(context.save_changes().unwrap(), 2);

    let reminders = context.reminders_of_meeting(meeting_id).unwrap();
    assert_eq!(reminders.len(), 2);
    assert!(reminders
        .iter()
        .all(|reminder| reminder.meeting_id == meeting_id));
    let mut offsets: Vec<u32> = reminders.iter().map(|r| r.remind_before).collect();
    offsets.sort_unstable();
    assert_eq!(offsets, vec![2, 4]);

    let fetched = context.find_meeting(meeting_id).unwrap().unwrap();
    context.meeting_mut(&fetched).unwrap().start_at = Utc::now() - Duration::days(667);
    assert_eq!(context.save_changes().unwrap(), 1);

    let updated = context.meeting(&fetched).unwrap();
    assert!(!updated.is_start_in_future());
    assert!(updated.changed_at.unwrap() >= updated.created_at.unwrap());

    let stored = context.meetings_of_calendar(calendar_id).unwrap();
    assert_eq!(stored.len(), 1);
    assert!(!stored[0].is_start_in_future());
}
