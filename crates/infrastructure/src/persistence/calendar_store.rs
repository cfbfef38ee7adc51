//! SQLite calendar and project store

use std::sync::Arc;

use application::{error::ApplicationError, ports::CalendarStore};
use async_trait::async_trait;
use domain::{Calendar, CalendarId, Project, UserId};
use rusqlite::{OptionalExtension, params};
use tracing::{debug, instrument};

use super::{
    connection::{ConnectionPool, with_connection},
    records::{CALENDAR_COLUMNS, PROJECT_COLUMNS, row_to_calendar, row_to_project, timestamp},
};

/// SQLite-based calendar store
#[derive(Debug, Clone)]
pub struct SqliteCalendarStore {
    pool: Arc<ConnectionPool>,
}

impl SqliteCalendarStore {
    #[must_use]
    pub const fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CalendarStore for SqliteCalendarStore {
    #[instrument(skip(self))]
    async fn list_calendars(&self, user_id: &UserId) -> Result<Vec<Calendar>, ApplicationError> {
        let user_id = user_id.to_string();
        with_connection(&self.pool, move |conn| {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {CALENDAR_COLUMNS} FROM calendars
                 WHERE user_id = ?1 ORDER BY is_default DESC, created_at ASC"
            ))?;
            stmt.query_map([&user_id], row_to_calendar)?.collect()
        })
        .await
    }

    #[instrument(skip(self))]
    async fn get_calendar(
        &self,
        user_id: &UserId,
        calendar_id: &CalendarId,
    ) -> Result<Option<Calendar>, ApplicationError> {
        let user_id = user_id.to_string();
        let calendar_id = calendar_id.to_string();
        with_connection(&self.pool, move |conn| {
            conn.query_row(
                &format!("SELECT {CALENDAR_COLUMNS} FROM calendars WHERE id = ?1 AND user_id = ?2"),
                params![calendar_id, user_id],
                row_to_calendar,
            )
            .optional()
        })
        .await
    }

    /// The project flagged default, else the oldest project of the user
    #[instrument(skip(self))]
    async fn default_project(&self, user_id: &UserId) -> Result<Option<Project>, ApplicationError> {
        let user_id = user_id.to_string();
        with_connection(&self.pool, move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {PROJECT_COLUMNS} FROM projects WHERE user_id = ?1
                     ORDER BY is_default DESC, created_at ASC, id ASC LIMIT 1"
                ),
                [&user_id],
                row_to_project,
            )
            .optional()
        })
        .await
    }

    #[instrument(skip(self, calendar), fields(calendar_id = %calendar.id))]
    async fn save_calendar(&self, calendar: &Calendar) -> Result<(), ApplicationError> {
        let calendar = calendar.clone();
        with_connection(&self.pool, move |conn| {
            let tx = conn.unchecked_transaction()?;
            if calendar.is_default {
                tx.execute(
                    "UPDATE calendars SET is_default = 0 WHERE user_id = ?1 AND id != ?2",
                    params![calendar.user_id.to_string(), calendar.id.to_string()],
                )?;
            }
            tx.execute(
                &format!(
                    "INSERT INTO calendars ({CALENDAR_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                     ON CONFLICT(id) DO UPDATE SET
                        name = excluded.name, color = excluded.color,
                        description = excluded.description, project_id = excluded.project_id,
                        is_default = excluded.is_default, updated_at = excluded.updated_at"
                ),
                params![
                    calendar.id.to_string(),
                    calendar.user_id.to_string(),
                    calendar.name,
                    calendar.color,
                    calendar.description,
                    calendar.project_id.map(|p| p.to_string()),
                    calendar.is_default,
                    timestamp(calendar.created_at),
                    timestamp(calendar.updated_at),
                ],
            )?;
            tx.commit()?;
            debug!("Saved calendar");
            Ok(())
        })
        .await
    }

    #[instrument(skip(self, project), fields(project_id = %project.id))]
    async fn save_project(&self, project: &Project) -> Result<(), ApplicationError> {
        let project = project.clone();
        with_connection(&self.pool, move |conn| {
            let tx = conn.unchecked_transaction()?;
            if project.is_default {
                tx.execute(
                    "UPDATE projects SET is_default = 0 WHERE user_id = ?1 AND id != ?2",
                    params![project.user_id.to_string(), project.id.to_string()],
                )?;
            }
            tx.execute(
                &format!(
                    "INSERT INTO projects ({PROJECT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT(id) DO UPDATE SET
                        name = excluded.name, is_default = excluded.is_default"
                ),
                params![
                    project.id.to_string(),
                    project.user_id.to_string(),
                    project.name,
                    project.is_default,
                    timestamp(project.created_at),
                ],
            )?;
            tx.commit()?;
            debug!("Saved project");
            Ok(())
        })
        .await
    }
}
