use agenda_core::db::schema::SCHEMA_VERSION;
use agenda_core::db::{open_db, open_db_in_memory, open_store, DbError};
use agenda_core::StoreLocation;
use rusqlite::Connection;

#[test]
fn open_db_in_memory_creates_schema() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), SCHEMA_VERSION);
    assert_sqlite_object_exists(&conn, "table", "calendars");
    assert_sqlite_object_exists(&conn, "table", "meetings");
    assert_sqlite_object_exists(&conn, "table", "reminders");
    assert_sqlite_object_exists(&conn, "index", "ix_meetings_calendar_id");
    assert_sqlite_object_exists(&conn, "index", "ix_reminders_meeting_id");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agenda.db");

    let conn_first = open_db(&path).unwrap();
    conn_first
        .execute("INSERT INTO calendars (owner) VALUES ('Arthur Dent');", [])
        .unwrap();
    drop(conn_first);

    let conn_second = open_store(&StoreLocation::File(path)).unwrap();
    assert_eq!(schema_version(&conn_second), SCHEMA_VERSION);
    let owners: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM calendars;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(owners, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, SCHEMA_VERSION);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn opened_connections_enforce_foreign_keys() {
    let conn = open_db_in_memory().unwrap();

    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);

    let result = conn.execute(
        "INSERT INTO meetings (title, start_at, duration, calendar_id) VALUES ('orphan', 0, 5, 42);",
        [],
    );
    assert!(result.is_err());
}

#[test]
fn text_columns_compare_case_insensitively() {
    let conn = open_db_in_memory().unwrap();
    conn.execute("INSERT INTO calendars (owner) VALUES ('Zoë Ärger');", [])
        .unwrap();

    let matches: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM calendars WHERE owner = 'ZOË ärger';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(matches, 1);
}

#[test]
fn deleting_a_calendar_with_meetings_is_restricted() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO calendars (id, owner) VALUES (1, 'Arthur Dent');
         INSERT INTO meetings (title, start_at, duration, calendar_id) VALUES ('Lunch', 0, 42, 1);",
    )
    .unwrap();

    assert!(conn.execute("DELETE FROM calendars WHERE id = 1;", []).is_err());

    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM calendars;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 1);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_sqlite_object_exists(conn: &Connection, kind: &str, name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = ?1 AND name = ?2
            );",
            [kind, name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "{kind} {name} does not exist");
}
