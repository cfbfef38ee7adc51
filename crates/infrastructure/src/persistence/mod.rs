//! Persistence module
//!
//! SQLite-backed stores for projects, calendars, events and tasks, plus the
//! transaction manager used by calendar imports.

pub mod calendar_store;
pub mod connection;
pub mod error;
pub mod event_store;
pub mod migrations;
mod records;
pub mod task_store;
pub mod transaction;

pub use calendar_store::SqliteCalendarStore;
pub use connection::{ConnectionPool, DatabaseError, MEMORY_PATH, create_pool};
pub use event_store::SqliteEventStore;
pub use task_store::SqliteTaskStore;
pub use transaction::SqliteTransactionManager;
