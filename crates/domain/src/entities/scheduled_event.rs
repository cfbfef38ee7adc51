//! Scheduled event entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{CalendarId, EventId, IcalUid, ProjectId, UserId};

/// Status given to events that arrive without one
pub const DEFAULT_EVENT_STATUS: &str = "CONFIRMED";

/// A time-boxed event on one of the user's calendars
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub id: EventId,
    pub user_id: UserId,
    pub calendar_id: CalendarId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub is_all_day: bool,
    /// Free-text iCalendar status
    pub status: String,
    /// Immutable once assigned
    pub ical_uid: IcalUid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// Stored verbatim, never expanded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence_rule: Option<String>,
    pub sequence: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScheduledEvent {
    /// Create a new event with default status and sequence zero
    #[must_use]
    pub fn new(
        user_id: UserId,
        calendar_id: CalendarId,
        ical_uid: IcalUid,
        title: impl Into<String>,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: EventId::new(),
            user_id,
            calendar_id,
            project_id: None,
            title: title.into(),
            description: None,
            location: None,
            start_at,
            end_at,
            is_all_day: false,
            status: DEFAULT_EVENT_STATUS.to_string(),
            ical_uid,
            etag: None,
            recurrence_rule: None,
            sequence: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub const fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    #[must_use]
    pub const fn all_day(mut self) -> Self {
        self.is_all_day = true;
        self
    }

    #[must_use]
    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }
}
