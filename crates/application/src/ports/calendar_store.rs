//! Calendar store port
//!
//! Read and write access to a user's calendars and projects.

use async_trait::async_trait;
use domain::{Calendar, CalendarId, Project, UserId};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for calendar and project persistence
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CalendarStore: Send + Sync {
    /// All calendars owned by a user
    async fn list_calendars(&self, user_id: &UserId) -> Result<Vec<Calendar>, ApplicationError>;

    /// A single calendar, if it exists and belongs to the user
    async fn get_calendar(
        &self,
        user_id: &UserId,
        calendar_id: &CalendarId,
    ) -> Result<Option<Calendar>, ApplicationError>;

    /// The project the user marked as default, if any
    async fn default_project(&self, user_id: &UserId) -> Result<Option<Project>, ApplicationError>;

    /// Insert or replace a calendar
    async fn save_calendar(&self, calendar: &Calendar) -> Result<(), ApplicationError>;

    /// Insert or replace a project
    async fn save_project(&self, project: &Project) -> Result<(), ApplicationError>;
}
