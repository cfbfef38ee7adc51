//! Direct database administration
//!
//! Opens the configured database (running migrations when enabled) and works
//! through the same stores the server uses.

use std::sync::Arc;

use anyhow::{Context, Result};
use application::ports::CalendarStore;
use domain::{Calendar, Project, ProjectId, UserId};
use infrastructure::{DatabaseConfig, SqliteCalendarStore, create_pool};
use tracing::info;

/// Options for a new calendar
#[derive(Debug, Default)]
pub struct NewCalendar {
    pub name: String,
    pub project: Option<ProjectId>,
    pub color: Option<String>,
    pub description: Option<String>,
    pub is_default: bool,
}

fn open_store(database: &DatabaseConfig) -> Result<SqliteCalendarStore> {
    let pool = create_pool(database)
        .with_context(|| format!("failed to open database at {}", database.path))?;
    Ok(SqliteCalendarStore::new(Arc::new(pool)))
}

/// Create a project; a default project replaces the previous default
pub async fn create_project(
    database: &DatabaseConfig,
    user: UserId,
    name: &str,
    is_default: bool,
) -> Result<Project> {
    let store = open_store(database)?;
    let mut project = Project::new(user, name);
    if is_default {
        project = project.as_default();
    }
    store
        .save_project(&project)
        .await
        .context("failed to save project")?;
    info!(project_id = %project.id, %user, "Project created");
    Ok(project)
}

/// Create a calendar; a default calendar replaces the previous default
pub async fn create_calendar(
    database: &DatabaseConfig,
    user: UserId,
    options: NewCalendar,
) -> Result<Calendar> {
    let store = open_store(database)?;
    let mut calendar = Calendar::new(user, options.name);
    if let Some(project) = options.project {
        calendar = calendar.with_project(project);
    }
    if let Some(color) = options.color {
        calendar = calendar.with_color(color);
    }
    if let Some(description) = options.description {
        calendar = calendar.with_description(description);
    }
    if options.is_default {
        calendar = calendar.as_default();
    }
    store
        .save_calendar(&calendar)
        .await
        .context("failed to save calendar")?;
    info!(calendar_id = %calendar.id, %user, "Calendar created");
    Ok(calendar)
}

pub async fn list_calendars(database: &DatabaseConfig, user: UserId) -> Result<Vec<Calendar>> {
    let store = open_store(database)?;
    store
        .list_calendars(&user)
        .await
        .context("failed to list calendars")
}
