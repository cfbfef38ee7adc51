//! CalDAV read and delete service
//!
//! Resolves calendars and their event/task resources for the protocol
//! handlers. Imports live in [`super::ImportService`].

use std::{fmt, sync::Arc};

use domain::{Calendar, CalendarId, CalendarResource, IcalUid, ResourceKind, ResourceQuery, UserId};
use tracing::{debug, info, instrument, warn};

use crate::{
    error::ApplicationError,
    ports::{CalendarStore, EventStore, TaskStore},
};

/// Result of deleting a resource whose kind is unknown up front
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// A resource of this kind was removed
    Removed(ResourceKind),
    /// Nothing matched the UID
    NotFound,
}

/// Service backing PROPFIND, REPORT, GET and DELETE
pub struct CalDavService {
    calendars: Arc<dyn CalendarStore>,
    events: Arc<dyn EventStore>,
    tasks: Arc<dyn TaskStore>,
}

impl fmt::Debug for CalDavService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalDavService").finish_non_exhaustive()
    }
}

impl CalDavService {
    /// Create a new service over the given stores
    pub fn new(
        calendars: Arc<dyn CalendarStore>,
        events: Arc<dyn EventStore>,
        tasks: Arc<dyn TaskStore>,
    ) -> Self {
        Self {
            calendars,
            events,
            tasks,
        }
    }

    /// All calendars in the user's calendar home
    #[instrument(skip(self))]
    pub async fn list_calendars(&self, user_id: &UserId) -> Result<Vec<Calendar>, ApplicationError> {
        self.calendars.list_calendars(user_id).await
    }

    /// A calendar of the user, or `NotFound`
    #[instrument(skip(self))]
    pub async fn get_calendar(
        &self,
        user_id: &UserId,
        calendar_id: &CalendarId,
    ) -> Result<Calendar, ApplicationError> {
        self.calendars
            .get_calendar(user_id, calendar_id)
            .await?
            .ok_or_else(|| ApplicationError::NotFound(format!("calendar {calendar_id}")))
    }

    /// Resources of a calendar, events first
    ///
    /// An unbounded range lists everything; any bound switches both listings
    /// to their range-filtered form.
    #[instrument(skip(self))]
    pub async fn list_resources(
        &self,
        user_id: &UserId,
        calendar_id: &CalendarId,
        query: &ResourceQuery,
    ) -> Result<Vec<CalendarResource>, ApplicationError> {
        let bounded = !query.range.is_unbounded();
        let mut resources = Vec::new();

        if query.include_events {
            let events = if bounded {
                self.events
                    .list_by_calendar_in_range(user_id, calendar_id, &query.range)
                    .await?
            } else {
                self.events.list_by_calendar(user_id, calendar_id).await?
            };
            resources.extend(events.into_iter().map(CalendarResource::Event));
        }

        if query.include_tasks {
            let tasks = if bounded {
                self.tasks
                    .list_by_calendar_in_range(user_id, calendar_id, &query.range)
                    .await?
            } else {
                self.tasks.list_by_calendar(user_id, calendar_id).await?
            };
            resources.extend(tasks.into_iter().map(CalendarResource::Task));
        }

        debug!(count = resources.len(), bounded, "Listed calendar resources");
        Ok(resources)
    }

    /// Look up a resource by UID, trying events before tasks
    ///
    /// A failed event lookup falls through to the task lookup. When neither
    /// lookup yields a resource the answer is `None`, so lookup errors are
    /// logged and surface as not found.
    #[instrument(skip(self))]
    pub async fn find_resource(
        &self,
        user_id: &UserId,
        uid: &IcalUid,
    ) -> Result<Option<CalendarResource>, ApplicationError> {
        match self.events.find_by_uid(user_id, uid).await {
            Ok(Some(event)) => return Ok(Some(CalendarResource::Event(event))),
            Ok(None) => {},
            Err(e) => warn!(%uid, error = %e, "Event lookup failed, trying tasks"),
        }
        match self.tasks.find_by_uid(user_id, uid).await {
            Ok(task) => Ok(task.map(CalendarResource::Task)),
            Err(e) => {
                warn!(%uid, error = %e, "Task lookup failed, treating resource as missing");
                Ok(None)
            },
        }
    }

    /// Delete a resource by UID
    ///
    /// The event delete runs first. The task delete runs whenever it removed
    /// nothing, so an unmatched UID costs two no-op deletes and is not an error.
    #[instrument(skip(self))]
    pub async fn delete_resource(
        &self,
        user_id: &UserId,
        uid: &IcalUid,
    ) -> Result<DeleteOutcome, ApplicationError> {
        if self.events.delete_by_uid(user_id, uid).await? {
            info!(%uid, "Deleted event resource");
            return Ok(DeleteOutcome::Removed(ResourceKind::Event));
        }
        if self.tasks.delete_by_uid(user_id, uid).await? {
            info!(%uid, "Deleted task resource");
            return Ok(DeleteOutcome::Removed(ResourceKind::Task));
        }
        debug!(%uid, "Delete matched no resource");
        Ok(DeleteOutcome::NotFound)
    }

    /// A calendar together with all of its resources, for whole-calendar export
    #[instrument(skip(self))]
    pub async fn export_calendar(
        &self,
        user_id: &UserId,
        calendar_id: &CalendarId,
    ) -> Result<(Calendar, Vec<CalendarResource>), ApplicationError> {
        let calendar = self.get_calendar(user_id, calendar_id).await?;
        let resources = self
            .list_resources(user_id, calendar_id, &ResourceQuery::all())
            .await?;
        Ok((calendar, resources))
    }
}
