//! Row mapping and statements shared by the stores and the import transaction
//!
//! Timestamps are stored as RFC 3339 text with nanosecond precision and a `Z`
//! suffix, which keeps them fixed-width and lexicographically ordered, so range
//! filters compare them directly in SQL.

use chrono::{DateTime, SecondsFormat, Utc};
use domain::{
    Calendar, CalendarId, EventId, IcalUid, Project, ProjectId, ScheduledEvent, Task, TaskId,
    TaskStatus, TimeRange, UserId,
};
use rusqlite::{Connection, OptionalExtension, Row, params, types::Type};
use uuid::Uuid;

pub(crate) const CALENDAR_COLUMNS: &str =
    "id, user_id, name, color, description, project_id, is_default, created_at, updated_at";

pub(crate) const PROJECT_COLUMNS: &str = "id, user_id, name, is_default, created_at";

pub(crate) const EVENT_COLUMNS: &str = "id, user_id, calendar_id, project_id, title, description, \
     location, start_at, end_at, is_all_day, status, ical_uid, etag, recurrence_rule, sequence, \
     created_at, updated_at";

pub(crate) const TASK_COLUMNS: &str = "id, user_id, project_id, calendar_id, title, note, due_at, \
     status, completed_at, priority, ical_uid, etag, created_at, updated_at";

/// Lower and upper bounds for range queries; open sides use the extremes
const MIN_TIMESTAMP: &str = "";
const MAX_TIMESTAMP: &str = "\u{10FFFF}";

pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn conversion_error<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into())
}

fn uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let value: String = row.get(idx)?;
    Uuid::parse_str(&value).map_err(|e| conversion_error(idx, e))
}

fn optional_uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Uuid>> {
    let value: Option<String> = row.get(idx)?;
    value
        .map(|v| Uuid::parse_str(&v).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn time_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let value: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn optional_time_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let value: Option<String> = row.get(idx)?;
    value
        .map(|v| {
            DateTime::parse_from_rfc3339(&v)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| conversion_error(idx, e))
        })
        .transpose()
}

fn uid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<IcalUid> {
    let value: String = row.get(idx)?;
    IcalUid::new(value).map_err(|e| conversion_error(idx, e))
}

pub(crate) fn row_to_calendar(row: &Row<'_>) -> rusqlite::Result<Calendar> {
    Ok(Calendar {
        id: CalendarId::from(uuid_at(row, 0)?),
        user_id: UserId::from(uuid_at(row, 1)?),
        name: row.get(2)?,
        color: row.get(3)?,
        description: row.get(4)?,
        project_id: optional_uuid_at(row, 5)?.map(ProjectId::from),
        is_default: row.get(6)?,
        created_at: time_at(row, 7)?,
        updated_at: time_at(row, 8)?,
    })
}

pub(crate) fn row_to_project(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: ProjectId::from(uuid_at(row, 0)?),
        user_id: UserId::from(uuid_at(row, 1)?),
        name: row.get(2)?,
        is_default: row.get(3)?,
        created_at: time_at(row, 4)?,
    })
}

pub(crate) fn row_to_event(row: &Row<'_>) -> rusqlite::Result<ScheduledEvent> {
    Ok(ScheduledEvent {
        id: EventId::from(uuid_at(row, 0)?),
        user_id: UserId::from(uuid_at(row, 1)?),
        calendar_id: CalendarId::from(uuid_at(row, 2)?),
        project_id: optional_uuid_at(row, 3)?.map(ProjectId::from),
        title: row.get(4)?,
        description: row.get(5)?,
        location: row.get(6)?,
        start_at: time_at(row, 7)?,
        end_at: time_at(row, 8)?,
        is_all_day: row.get(9)?,
        status: row.get(10)?,
        ical_uid: uid_at(row, 11)?,
        etag: row.get(12)?,
        recurrence_rule: row.get(13)?,
        sequence: row.get(14)?,
        created_at: time_at(row, 15)?,
        updated_at: time_at(row, 16)?,
    })
}

pub(crate) fn row_to_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    let status: String = row.get(7)?;
    Ok(Task {
        id: TaskId::from(uuid_at(row, 0)?),
        user_id: UserId::from(uuid_at(row, 1)?),
        project_id: ProjectId::from(uuid_at(row, 2)?),
        calendar_id: optional_uuid_at(row, 3)?.map(CalendarId::from),
        title: row.get(4)?,
        note: row.get(5)?,
        due_at: optional_time_at(row, 6)?,
        status: status
            .parse::<TaskStatus>()
            .map_err(|e| conversion_error(7, e))?,
        completed_at: optional_time_at(row, 8)?,
        priority: row.get(9)?,
        ical_uid: uid_at(row, 10)?,
        etag: row.get(11)?,
        created_at: time_at(row, 12)?,
        updated_at: time_at(row, 13)?,
    })
}

fn range_bounds(range: &TimeRange) -> (String, String) {
    (
        range
            .start
            .map_or_else(|| MIN_TIMESTAMP.to_string(), timestamp),
        range.end.map_or_else(|| MAX_TIMESTAMP.to_string(), timestamp),
    )
}

// ----------------------------------------------------------------------------
// Events
// ----------------------------------------------------------------------------

pub(crate) fn select_events(
    conn: &Connection,
    user_id: &UserId,
    calendar_id: &CalendarId,
) -> rusqlite::Result<Vec<ScheduledEvent>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {EVENT_COLUMNS} FROM scheduled_events
         WHERE user_id = ?1 AND calendar_id = ?2
         ORDER BY start_at ASC, ical_uid ASC"
    ))?;
    stmt.query_map(
        params![user_id.to_string(), calendar_id.to_string()],
        row_to_event,
    )?
    .collect()
}

/// Events whose span overlaps the half-open range `[from, to)`
///
/// A zero-length event matches when its start falls inside the range.
pub(crate) fn select_events_in_range(
    conn: &Connection,
    user_id: &UserId,
    calendar_id: &CalendarId,
    range: &TimeRange,
) -> rusqlite::Result<Vec<ScheduledEvent>> {
    let (from, to) = range_bounds(range);
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {EVENT_COLUMNS} FROM scheduled_events
         WHERE user_id = ?1 AND calendar_id = ?2 AND start_at < ?4
           AND (end_at > ?3 OR (end_at = start_at AND start_at >= ?3))
         ORDER BY start_at ASC, ical_uid ASC"
    ))?;
    stmt.query_map(
        params![user_id.to_string(), calendar_id.to_string(), from, to],
        row_to_event,
    )?
    .collect()
}

pub(crate) fn select_event_by_uid(
    conn: &Connection,
    user_id: &UserId,
    uid: &IcalUid,
) -> rusqlite::Result<Option<ScheduledEvent>> {
    conn.query_row(
        &format!("SELECT {EVENT_COLUMNS} FROM scheduled_events WHERE user_id = ?1 AND ical_uid = ?2"),
        params![user_id.to_string(), uid.as_str()],
        row_to_event,
    )
    .optional()
}

pub(crate) fn insert_event(conn: &Connection, event: &ScheduledEvent) -> rusqlite::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO scheduled_events ({EVENT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)"
        ),
        params![
            event.id.to_string(),
            event.user_id.to_string(),
            event.calendar_id.to_string(),
            event.project_id.map(|p| p.to_string()),
            event.title,
            event.description,
            event.location,
            timestamp(event.start_at),
            timestamp(event.end_at),
            event.is_all_day,
            event.status,
            event.ical_uid.as_str(),
            event.etag,
            event.recurrence_rule,
            event.sequence,
            timestamp(event.created_at),
            timestamp(event.updated_at),
        ],
    )?;
    Ok(())
}

/// Rewrite the mutable fields of an event; identity, owner and UID stay
pub(crate) fn update_event(conn: &Connection, event: &ScheduledEvent) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE scheduled_events SET
            calendar_id = ?1, project_id = ?2, title = ?3, description = ?4, location = ?5,
            start_at = ?6, end_at = ?7, is_all_day = ?8, status = ?9, etag = ?10,
            recurrence_rule = ?11, sequence = ?12, updated_at = ?13
         WHERE id = ?14 AND user_id = ?15",
        params![
            event.calendar_id.to_string(),
            event.project_id.map(|p| p.to_string()),
            event.title,
            event.description,
            event.location,
            timestamp(event.start_at),
            timestamp(event.end_at),
            event.is_all_day,
            event.status,
            event.etag,
            event.recurrence_rule,
            event.sequence,
            timestamp(event.updated_at),
            event.id.to_string(),
            event.user_id.to_string(),
        ],
    )
}

pub(crate) fn delete_event_by_uid(
    conn: &Connection,
    user_id: &UserId,
    uid: &IcalUid,
) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM scheduled_events WHERE user_id = ?1 AND ical_uid = ?2",
        params![user_id.to_string(), uid.as_str()],
    )
}

// ----------------------------------------------------------------------------
// Tasks
// ----------------------------------------------------------------------------

pub(crate) fn select_tasks(
    conn: &Connection,
    user_id: &UserId,
    calendar_id: &CalendarId,
) -> rusqlite::Result<Vec<Task>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks
         WHERE user_id = ?1 AND calendar_id = ?2
         ORDER BY due_at IS NULL, due_at ASC, ical_uid ASC"
    ))?;
    stmt.query_map(
        params![user_id.to_string(), calendar_id.to_string()],
        row_to_task,
    )?
    .collect()
}

/// Tasks due inside the range, bounds inclusive; undated tasks never match
pub(crate) fn select_tasks_in_range(
    conn: &Connection,
    user_id: &UserId,
    calendar_id: &CalendarId,
    range: &TimeRange,
) -> rusqlite::Result<Vec<Task>> {
    let (from, to) = range_bounds(range);
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks
         WHERE user_id = ?1 AND calendar_id = ?2
           AND due_at IS NOT NULL AND due_at >= ?3 AND due_at <= ?4
         ORDER BY due_at ASC, ical_uid ASC"
    ))?;
    stmt.query_map(
        params![user_id.to_string(), calendar_id.to_string(), from, to],
        row_to_task,
    )?
    .collect()
}

pub(crate) fn select_task_by_uid(
    conn: &Connection,
    user_id: &UserId,
    uid: &IcalUid,
) -> rusqlite::Result<Option<Task>> {
    conn.query_row(
        &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = ?1 AND ical_uid = ?2"),
        params![user_id.to_string(), uid.as_str()],
        row_to_task,
    )
    .optional()
}

pub(crate) fn insert_task(conn: &Connection, task: &Task) -> rusqlite::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO tasks ({TASK_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
        ),
        params![
            task.id.to_string(),
            task.user_id.to_string(),
            task.project_id.to_string(),
            task.calendar_id.map(|c| c.to_string()),
            task.title,
            task.note,
            task.due_at.map(timestamp),
            task.status.as_str(),
            task.completed_at.map(timestamp),
            task.priority,
            task.ical_uid.as_str(),
            task.etag,
            timestamp(task.created_at),
            timestamp(task.updated_at),
        ],
    )?;
    Ok(())
}

/// Rewrite the mutable fields of a task; identity, owner and UID stay
pub(crate) fn update_task(conn: &Connection, task: &Task) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE tasks SET
            project_id = ?1, calendar_id = ?2, title = ?3, note = ?4, due_at = ?5, status = ?6,
            completed_at = ?7, priority = ?8, etag = ?9, updated_at = ?10
         WHERE id = ?11 AND user_id = ?12",
        params![
            task.project_id.to_string(),
            task.calendar_id.map(|c| c.to_string()),
            task.title,
            task.note,
            task.due_at.map(timestamp),
            task.status.as_str(),
            task.completed_at.map(timestamp),
            task.priority,
            task.etag,
            timestamp(task.updated_at),
            task.id.to_string(),
            task.user_id.to_string(),
        ],
    )
}

pub(crate) fn delete_task_by_uid(
    conn: &Connection,
    user_id: &UserId,
    uid: &IcalUid,
) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM tasks WHERE user_id = ?1 AND ical_uid = ?2",
        params![user_id.to_string(), uid.as_str()],
    )
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn timestamps_sort_lexicographically() {
        let early = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let late = early + chrono::Duration::nanoseconds(1_500);
        assert!(timestamp(early) < timestamp(late));
        assert_eq!(timestamp(early).len(), timestamp(late).len());
        assert!(timestamp(early).ends_with('Z'));
    }

    #[test]
    fn open_bounds_cover_every_timestamp() {
        let (from, to) = range_bounds(&TimeRange::unbounded());
        let sample = timestamp(Utc::now());
        assert!(from.as_str() < sample.as_str());
        assert!(sample.as_str() < to.as_str());
    }
}
