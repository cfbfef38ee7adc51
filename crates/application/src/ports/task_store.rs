//! Task store port

use async_trait::async_trait;
use domain::{CalendarId, IcalUid, Task, TimeRange, UserId};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for reading and deleting tasks that are attached to calendars
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Every task in a calendar
    async fn list_by_calendar(
        &self,
        user_id: &UserId,
        calendar_id: &CalendarId,
    ) -> Result<Vec<Task>, ApplicationError>;

    /// Tasks in a calendar whose due date falls within a bounded range
    async fn list_by_calendar_in_range(
        &self,
        user_id: &UserId,
        calendar_id: &CalendarId,
        range: &TimeRange,
    ) -> Result<Vec<Task>, ApplicationError>;

    /// Look up a task by its iCalendar UID
    async fn find_by_uid(
        &self,
        user_id: &UserId,
        uid: &IcalUid,
    ) -> Result<Option<Task>, ApplicationError>;

    /// Delete a task by UID, returning whether a row was removed
    async fn delete_by_uid(&self, user_id: &UserId, uid: &IcalUid)
    -> Result<bool, ApplicationError>;
}
