//! Application services - Use case implementations

mod caldav_service;
mod import_service;
mod import_target;

pub use caldav_service::{CalDavService, DeleteOutcome};
pub use import_service::ImportService;
pub use import_target::{FixedProject, LinkedOrDefaultProject};
