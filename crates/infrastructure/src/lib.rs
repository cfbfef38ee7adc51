//! Infrastructure layer - Adapters for external systems
//!
//! Implements the application ports on SQLite and carries the configuration,
//! telemetry and credential hashing shared by the binaries.

pub mod adapters;
pub mod config;
pub mod persistence;
pub mod telemetry;

pub use adapters::{ApiKeyHashError, ApiKeyHasher};
pub use config::{
    ApiKeyEntry, AppConfig, CalDavConfig, DatabaseConfig, LogFormat, SecurityConfig, ServerConfig,
    TelemetryAppConfig,
};
pub use persistence::{
    ConnectionPool, DatabaseError, SqliteCalendarStore, SqliteEventStore, SqliteTaskStore,
    SqliteTransactionManager, create_pool,
};
pub use telemetry::{TelemetryError, init_telemetry};
