//! Database migrations
//!
//! Manages database schema versioning. Each migration is an idempotent batch
//! applied in order; the highest applied version is kept in `schema_version`.
//!
//! ## Adding New Migrations
//!
//! 1. Increment `SCHEMA_VERSION`
//! 2. Add a new `migrate_vX` function
//! 3. Call it from `run_migrations`

use rusqlite::Connection;
use tracing::{debug, error, info};

use super::connection::DatabaseError;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    let current_version = get_schema_version(conn)?;

    if current_version < SCHEMA_VERSION {
        info!(
            from_version = current_version,
            to_version = SCHEMA_VERSION,
            "Running database migrations"
        );

        if current_version < 1 {
            if let Err(e) = migrate_v1(conn) {
                error!(version = 1, error = %e, "Migration V001 (calendar schema) failed");
                return Err(e);
            }
        }

        set_schema_version(conn, SCHEMA_VERSION)?;
        info!(version = SCHEMA_VERSION, "Database migrations complete");
    } else {
        debug!(version = current_version, "Database schema is up to date");
    }

    Ok(())
}

/// Get current schema version
fn get_schema_version(conn: &Connection) -> Result<i32, DatabaseError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        [],
    )?;

    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;

    Ok(version)
}

/// Set schema version
fn set_schema_version(conn: &Connection, version: i32) -> Result<(), DatabaseError> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Migration to version 1: projects, calendars, events, tasks and the UID registry
///
/// `resource_uids` holds one row per (user, UID) across events and tasks, so
/// a UID can never name both an event and a task of the same user. Triggers
/// keep it in step with both tables, including cascading deletes.
fn migrate_v1(conn: &Connection) -> Result<(), DatabaseError> {
    debug!("Applying migration V001: calendar schema");

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS projects (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            is_default INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS calendars (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            color TEXT,
            description TEXT,
            project_id TEXT REFERENCES projects(id) ON DELETE SET NULL,
            is_default INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS scheduled_events (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            calendar_id TEXT NOT NULL REFERENCES calendars(id) ON DELETE CASCADE,
            project_id TEXT REFERENCES projects(id) ON DELETE SET NULL,
            title TEXT NOT NULL,
            description TEXT,
            location TEXT,
            start_at TEXT NOT NULL,
            end_at TEXT NOT NULL,
            is_all_day INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'CONFIRMED',
            ical_uid TEXT NOT NULL,
            etag TEXT,
            recurrence_rule TEXT,
            sequence INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (user_id, ical_uid)
        );

        CREATE TABLE IF NOT EXISTS tasks (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            calendar_id TEXT REFERENCES calendars(id) ON DELETE SET NULL,
            title TEXT NOT NULL,
            note TEXT,
            due_at TEXT,
            status TEXT NOT NULL DEFAULT 'TODO' CHECK(status IN ('TODO', 'DOING', 'DONE')),
            completed_at TEXT,
            priority INTEGER NOT NULL DEFAULT 0,
            ical_uid TEXT NOT NULL,
            etag TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (user_id, ical_uid)
        );

        CREATE TABLE IF NOT EXISTS resource_uids (
            user_id TEXT NOT NULL,
            ical_uid TEXT NOT NULL,
            kind TEXT NOT NULL CHECK(kind IN ('event', 'task')),
            PRIMARY KEY (user_id, ical_uid)
        );

        CREATE TRIGGER IF NOT EXISTS register_event_uid AFTER INSERT ON scheduled_events
        BEGIN
            INSERT INTO resource_uids (user_id, ical_uid, kind) VALUES (NEW.user_id, NEW.ical_uid, 'event');
        END;

        CREATE TRIGGER IF NOT EXISTS release_event_uid AFTER DELETE ON scheduled_events
        BEGIN
            DELETE FROM resource_uids WHERE user_id = OLD.user_id AND ical_uid = OLD.ical_uid;
        END;

        CREATE TRIGGER IF NOT EXISTS register_task_uid AFTER INSERT ON tasks
        BEGIN
            INSERT INTO resource_uids (user_id, ical_uid, kind) VALUES (NEW.user_id, NEW.ical_uid, 'task');
        END;

        CREATE TRIGGER IF NOT EXISTS release_task_uid AFTER DELETE ON tasks
        BEGIN
            DELETE FROM resource_uids WHERE user_id = OLD.user_id AND ical_uid = OLD.ical_uid;
        END;

        CREATE INDEX IF NOT EXISTS idx_projects_user ON projects(user_id);
        CREATE INDEX IF NOT EXISTS idx_calendars_user ON calendars(user_id);
        CREATE INDEX IF NOT EXISTS idx_events_calendar ON scheduled_events(user_id, calendar_id);
        CREATE INDEX IF NOT EXISTS idx_events_start ON scheduled_events(start_at);
        CREATE INDEX IF NOT EXISTS idx_tasks_calendar ON tasks(user_id, calendar_id);
        CREATE INDEX IF NOT EXISTS idx_tasks_due ON tasks(due_at);
        ",
    )?;

    Ok(())
}
