//! SQLite scheduled event store

use std::sync::Arc;

use application::{error::ApplicationError, ports::EventStore};
use async_trait::async_trait;
use domain::{CalendarId, IcalUid, ScheduledEvent, TimeRange, UserId};
use tracing::{debug, instrument};

use super::{
    connection::{ConnectionPool, with_connection},
    records,
};

/// SQLite-based event store
#[derive(Debug, Clone)]
pub struct SqliteEventStore {
    pool: Arc<ConnectionPool>,
}

impl SqliteEventStore {
    #[must_use]
    pub const fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Insert an event outside of an import, e.g. from tooling
    #[instrument(skip(self, event), fields(uid = %event.ical_uid))]
    pub async fn insert(&self, event: &ScheduledEvent) -> Result<(), ApplicationError> {
        let event = event.clone();
        with_connection(&self.pool, move |conn| records::insert_event(conn, &event)).await
    }
}

#[async_trait]
impl EventStore for SqliteEventStore {
    #[instrument(skip(self))]
    async fn list_by_calendar(
        &self,
        user_id: &UserId,
        calendar_id: &CalendarId,
    ) -> Result<Vec<ScheduledEvent>, ApplicationError> {
        let (user_id, calendar_id) = (*user_id, *calendar_id);
        with_connection(&self.pool, move |conn| {
            records::select_events(conn, &user_id, &calendar_id)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn list_by_calendar_in_range(
        &self,
        user_id: &UserId,
        calendar_id: &CalendarId,
        range: &TimeRange,
    ) -> Result<Vec<ScheduledEvent>, ApplicationError> {
        let (user_id, calendar_id, range) = (*user_id, *calendar_id, *range);
        with_connection(&self.pool, move |conn| {
            records::select_events_in_range(conn, &user_id, &calendar_id, &range)
        })
        .await
    }

    #[instrument(skip(self), fields(uid = %uid))]
    async fn find_by_uid(
        &self,
        user_id: &UserId,
        uid: &IcalUid,
    ) -> Result<Option<ScheduledEvent>, ApplicationError> {
        let (user_id, uid) = (*user_id, uid.clone());
        with_connection(&self.pool, move |conn| {
            records::select_event_by_uid(conn, &user_id, &uid)
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
            records::delete_event_by_uid(conn, &user_id, &uid)
        })
        .await?;
        debug!(removed, "Deleted events by UID");
        Ok(removed > 0)
    }
}
