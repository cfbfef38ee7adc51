//! Scheduled event store port

use async_trait::async_trait;
use domain::{CalendarId, IcalUid, ScheduledEvent, TimeRange, UserId};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for reading and deleting scheduled events
///
/// Writes go through [`crate::ports::CalendarTransaction`] so that an import
/// commits as one unit.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Every event in a calendar
    async fn list_by_calendar(
        &self,
        user_id: &UserId,
        calendar_id: &CalendarId,
    ) -> Result<Vec<ScheduledEvent>, ApplicationError>;

    /// Events in a calendar that overlap a bounded range
    async fn list_by_calendar_in_range(
        &self,
        user_id: &UserId,
        calendar_id: &CalendarId,
        range: &TimeRange,
    ) -> Result<Vec<ScheduledEvent>, ApplicationError>;

    /// Look up an event by its iCalendar UID
    async fn find_by_uid(
        &self,
        user_id: &UserId,
        uid: &IcalUid,
    ) -> Result<Option<ScheduledEvent>, ApplicationError>;

    /// Delete an event by UID, returning whether a row was removed
    async fn delete_by_uid(&self, user_id: &UserId, uid: &IcalUid)
    -> Result<bool, ApplicationError>;
}
