//! Policies that choose the project of imported resources

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use domain::{Calendar, ProjectId};
use tracing::debug;

use crate::{
    error::ApplicationError,
    ports::{CalendarStore, ImportTargetPolicy},
};

/// Use the calendar's linked project, else the user's default project
pub struct LinkedOrDefaultProject {
    calendars: Arc<dyn CalendarStore>,
}

impl fmt::Debug for LinkedOrDefaultProject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedOrDefaultProject").finish_non_exhaustive()
    }
}

impl LinkedOrDefaultProject {
    pub fn new(calendars: Arc<dyn CalendarStore>) -> Self {
        Self { calendars }
    }
}

#[async_trait]
impl ImportTargetPolicy for LinkedOrDefaultProject {
    async fn resolve_project(&self, calendar: &Calendar) -> Result<ProjectId, ApplicationError> {
        if let Some(project_id) = calendar.project_id {
            return Ok(project_id);
        }
        let project = self
            .calendars
            .default_project(&calendar.user_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!(
                    "no project linked to calendar {} and no default project for user {}",
                    calendar.id, calendar.user_id
                ))
            })?;
        debug!(project_id = %project.id, "Falling back to default project");
        Ok(project.id)
    }
}

/// Always attribute imports to one project
#[derive(Debug, Clone, Copy)]
pub struct FixedProject(pub ProjectId);

#[async_trait]
impl ImportTargetPolicy for FixedProject {
    async fn resolve_project(&self, _calendar: &Calendar) -> Result<ProjectId, ApplicationError> {
        Ok(self.0)
    }
}
