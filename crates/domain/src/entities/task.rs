//! Task entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{CalendarId, IcalUid, ProjectId, TaskId, TaskStatus, UserId};

/// A task, exposed over CalDAV as a VTODO
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub user_id: UserId,
    pub project_id: ProjectId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_id: Option<CalendarId>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub priority: i32,
    pub ical_uid: IcalUid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a new open task in a project
    #[must_use]
    pub fn new(
        user_id: UserId,
        project_id: ProjectId,
        ical_uid: IcalUid,
        title: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::new(),
            user_id,
            project_id,
            calendar_id: None,
            title: title.into(),
            note: None,
            due_at: None,
            status: TaskStatus::Todo,
            completed_at: None,
            priority: 0,
            ical_uid,
            etag: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub const fn in_calendar(mut self, calendar_id: CalendarId) -> Self {
        self.calendar_id = Some(calendar_id);
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    #[must_use]
    pub const fn with_due(mut self, due_at: DateTime<Utc>) -> Self {
        self.due_at = Some(due_at);
        self
    }

    #[must_use]
    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }

    /// Move the task to `status`, keeping `completed_at` consistent with it
    ///
    /// Entering DONE stamps `completed_at` with `completed` (or `now` when the
    /// caller has no timestamp) unless one is already recorded. Leaving DONE
    /// clears it.
    pub fn set_status(
        &mut self,
        status: TaskStatus,
        completed: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) {
        self.status = status;
        if status.is_done() {
            if let Some(at) = completed {
                self.completed_at = Some(at);
            } else if self.completed_at.is_none() {
                self.completed_at = Some(now);
            }
        } else {
            self.completed_at = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn task() -> Task {
        Task::new(UserId::new(), ProjectId::new(), IcalUid::generate(), "Write report")
    }

    #[test]
    fn new_task_is_open() {
        let task = task();
        assert_eq!(task.status, TaskStatus::Todo);
        assert!(task.completed_at.is_none());
        assert_eq!(task.priority, 0);
    }

    #[test]
    fn completing_stamps_time() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let mut task = task();
        task.set_status(TaskStatus::Done, None, now);
        assert_eq!(task.completed_at, Some(now));
    }

    #[test]
    fn completing_prefers_supplied_timestamp() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let done = Utc.with_ymd_and_hms(2024, 2, 28, 9, 0, 0).unwrap();
        let mut task = task();
        task.set_status(TaskStatus::Done, Some(done), now);
        assert_eq!(task.completed_at, Some(done));
    }

    #[test]
    fn reopening_clears_completion() {
        let now = Utc::now();
        let mut task = task();
        task.set_status(TaskStatus::Done, None, now);
        task.set_status(TaskStatus::Doing, None, now);
        assert!(task.completed_at.is_none());
    }
}
