//! Demo driver for `agenda_core`.
//!
//! # Responsibility
//! - Walk through create, commit, query and update against the configured store.
//! - Keep output deterministic apart from generated ids.
//!
//! Reads `AGENDA_DATABASE_URL` (required), `AGENDA_LOG_LEVEL` and `AGENDA_LOG_DIR`.

use agenda_core::{
    init_logging_from_config, AgendaConfig, Calendar, DataContext, Meeting, Reminder,
};
use chrono::{Duration, Utc};
use log::error;
use std::error::Error;
use std::process::ExitCode;

const ARTHUR: &str = "Arthur Dent";
const FORD: &str = "Ford Prefect";

fn main() -> ExitCode {
    let config = match AgendaConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("agenda: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = init_logging_from_config(&config) {
        eprintln!("agenda: {err}");
        return ExitCode::FAILURE;
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=demo module=cli status=error error={err}");
            eprintln!("agenda: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &AgendaConfig) -> Result<(), Box<dyn Error>> {
    println!("agenda_core version={}", agenda_core::core_version());

    println!("Open data context.");
    let mut context = DataContext::open(&config.store_location()?)?;

    println!("Add calendar.");
    let calendar = context.add_calendar(Calendar::create(ARTHUR));
    context.save_changes()?;
    let calendar_id = context.calendar(&calendar)?.id.ok_or("calendar id missing")?;

    for candidate in [ARTHUR, FORD] {
        println!(
            "Is '{candidate}' the calendar owner? {}.",
            context.calendar(&calendar)?.is_owner(candidate)
        );
    }

    println!("Add meeting to calendar.");
    let meeting = context.add_meeting(Meeting::create(
        "Have lunch with Zaphod Beeblebrox",
        Some("Ford's semi-half-cousin likes tea".to_string()),
        42,
        Utc::now() + Duration::days(299),
        calendar_id,
    ));
    context.save_changes()?;
    print_start_check(context.meeting(&meeting)?);
    let meeting_id = context.meeting(&meeting)?.id.ok_or("meeting id missing")?;

    println!("Update meeting.");
    let fetched = context
        .find_meeting(meeting_id)?
        .ok_or("meeting vanished after commit")?;
    context.meeting_mut(&fetched)?.start_at = Utc::now() - Duration::days(667);
    context.save_changes()?;
    print_start_check(context.meeting(&fetched)?);

    println!("Add reminders to meeting.");
    context.add_reminders([
        Reminder::create(271, meeting_id),
        Reminder::create(662, meeting_id),
    ]);
    context.save_changes()?;

    for reminder in context.reminders_of_meeting(meeting_id)? {
        println!(
            "Reminder {} fires {} minutes before meeting {}.",
            reminder.id.unwrap_or_default(),
            reminder.remind_before,
            reminder.meeting_id
        );
    }
    Ok(())
}

fn print_start_check(meeting: &Meeting) {
    println!(
        "Does meeting '{}' start in future? {}.",
        meeting.title,
        meeting.is_start_in_future()
    );
}
