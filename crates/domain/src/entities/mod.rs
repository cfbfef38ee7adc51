//! Domain entities - Objects with identity and lifecycle

mod calendar;
mod calendar_resource;
mod incoming;
mod scheduled_event;
mod task;

pub use calendar::{Calendar, Project};
pub use calendar_resource::{CalendarResource, ResourceKind};
pub use incoming::{IncomingEvent, IncomingObject, IncomingTodo};
pub use scheduled_event::{DEFAULT_EVENT_STATUS, ScheduledEvent};
pub use task::Task;
