//! SQLite task store

use std::sync::Arc;

use application::{error::ApplicationError, ports::TaskStore};
use async_trait::async_trait;
use domain::{CalendarId, IcalUid, Task, TimeRange, UserId};
use tracing::{debug, instrument};

use super::{
    connection::{ConnectionPool, with_connection},
    records,
};

/// SQLite-based task store
#[derive(Debug, Clone)]
pub struct SqliteTaskStore {
    pool: Arc<ConnectionPool>,
}

impl SqliteTaskStore {
    #[must_use]
    pub const fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Insert a task outside of an import, e.g. from tooling
    #[instrument(skip(self, task), fields(uid = %task.ical_uid))]
    pub async fn insert(&self, task: &Task) -> Result<(), ApplicationError> {
        let task = task.clone();
        with_connection(&self.pool, move |conn| records::insert_task(conn, &task)).await
    }
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    #[instrument(skip(self))]
    async fn list_by_calendar(
        &self,
        user_id: &UserId,
        calendar_id: &CalendarId,
    ) -> Result<Vec<Task>, ApplicationError> {
        let (user_id, calendar_id) = (*user_id, *calendar_id);
        with_connection(&self.pool, move |conn| {
            records::select_tasks(conn, &user_id, &calendar_id)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn list_by_calendar_in_range(
        &self,
        user_id: &UserId,
        calendar_id: &CalendarId,
        range: &TimeRange,
    ) -> Result<Vec<Task>, ApplicationError> {
        let (user_id, calendar_id, range) = (*user_id, *calendar_id, *range);
        with_connection(&self.pool, move |conn| {
            records::select_tasks_in_range(conn, &user_id, &calendar_id, &range)
        })
        .await
    }

    #[instrument(skip(self), fields(uid = %uid))]
    async fn find_by_uid(
        &self,
        user_id: &UserId,
        uid: &IcalUid,
    ) -> Result<Option<Task>, ApplicationError> {
        let (user_id, uid) = (*user_id, uid.clone());
        with_connection(&self.pool, move |conn| {
            records::select_task_by_uid(conn, &user_id, &uid)
        })
        .await
    }

    #[instrument(skip(self), fields(uid = %uid))]
    async fn delete_by_uid(
        &self,
        user_id: &UserId,
        uid: &IcalUid,
    ) -> Result<bool, ApplicationError> {
        let (user_id, uid) = (*user_id, uid.clone());
        let removed = with_connection(&self.pool, move |conn| {
            records::delete_task_by_uid(conn, &user_id, &uid)
        })
        .await?;
        debug!(removed, "Deleted tasks by UID");
        Ok(removed > 0)
    }
}
