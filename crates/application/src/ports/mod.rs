//! Ports - Interfaces for external dependencies
//!
//! Storage adapters in the infrastructure layer implement these traits.

mod calendar_store;
mod event_store;
mod import_target_policy;
mod task_store;
mod transaction_port;

pub use calendar_store::CalendarStore;
#[cfg(test)]
pub use calendar_store::MockCalendarStore;
pub use event_store::EventStore;
#[cfg(test)]
pub use event_store::MockEventStore;
pub use import_target_policy::ImportTargetPolicy;
#[cfg(test)]
pub use import_target_policy::MockImportTargetPolicy;
pub use task_store::TaskStore;
#[cfg(test)]
pub use task_store::MockTaskStore;
pub use transaction_port::{CalendarTransaction, ImportSummary, ImportWork, TransactionPort};
