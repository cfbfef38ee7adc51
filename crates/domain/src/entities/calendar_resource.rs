//! A calendar resource is either an event or a task

use serde::{Deserialize, Serialize};

use super::{ScheduledEvent, Task};
use crate::value_objects::{CalendarId, IcalUid};

/// Kind of entity behind a resource, used for UID registry bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Event,
    Task,
}

impl ResourceKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::Task => "task",
        }
    }

    /// iCalendar component name
    #[must_use]
    pub const fn component(&self) -> &'static str {
        match self {
            Self::Event => "VEVENT",
            Self::Task => "VTODO",
        }
    }
}

/// An addressable `{uid}.ics` resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalendarResource {
    Event(ScheduledEvent),
    Task(Task),
}

impl CalendarResource {
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        match self {
            Self::Event(_) => ResourceKind::Event,
            Self::Task(_) => ResourceKind::Task,
        }
    }

    #[must_use]
    pub const fn uid(&self) -> &IcalUid {
        match self {
            Self::Event(event) => &event.ical_uid,
            Self::Task(task) => &task.ical_uid,
        }
    }

    #[must_use]
    pub fn etag(&self) -> Option<&str> {
        match self {
            Self::Event(event) => event.etag.as_deref(),
            Self::Task(task) => task.etag.as_deref(),
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Event(event) => &event.title,
            Self::Task(task) => &task.title,
        }
    }

    /// Calendar the resource is filed under; tasks may have none
    #[must_use]
    pub const fn calendar_id(&self) -> Option<CalendarId> {
        match self {
            Self::Event(event) => Some(event.calendar_id),
            Self::Task(task) => task.calendar_id,
        }
    }
}

impl From<ScheduledEvent> for CalendarResource {
    fn from(event: ScheduledEvent) -> Self {
        Self::Event(event)
    }
}

impl From<Task> for CalendarResource {
    fn from(task: Task) -> Self {
        Self::Task(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::{ProjectId, UserId};
    use chrono::Utc;

    #[test]
    fn accessors_dispatch_on_variant() {
        let uid = IcalUid::new("event-1").unwrap();
        let now = Utc::now();
        let calendar = CalendarId::new();
        let event = ScheduledEvent::new(UserId::new(), calendar, uid.clone(), "Demo", now, now)
            .with_etag("e1");
        let resource = CalendarResource::from(event);
        assert_eq!(resource.kind(), ResourceKind::Event);
        assert_eq!(resource.uid(), &uid);
        assert_eq!(resource.etag(), Some("e1"));
        assert_eq!(resource.title(), "Demo");
        assert_eq!(resource.calendar_id(), Some(calendar));

        let task = Task::new(UserId::new(), ProjectId::new(), IcalUid::new("task-1").unwrap(), "Chore");
        let resource = CalendarResource::from(task);
        assert_eq!(resource.kind(), ResourceKind::Task);
        assert_eq!(resource.kind().component(), "VTODO");
        assert!(resource.etag().is_none());
        assert!(resource.calendar_id().is_none());
    }
}
