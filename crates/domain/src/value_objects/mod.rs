//! Value Objects - Immutable, identity-less domain primitives

mod ical_uid;
mod identifiers;
mod resource_query;
mod task_status;
mod time_range;

pub use ical_uid::IcalUid;
pub use identifiers::{CalendarId, EventId, ProjectId, TaskId, UserId};
pub use resource_query::ResourceQuery;
pub use task_status::TaskStatus;
pub use time_range::TimeRange;
