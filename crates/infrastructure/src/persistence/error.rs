//! Shared error mapping for the SQLite persistence layer

use application::error::ApplicationError;
use rusqlite::ffi;

/// Map a rusqlite error to an application-layer error
///
/// UNIQUE and PRIMARY KEY violations become `Conflict`, since those are the
/// per-user UID rules a caller can trip. Every other constraint failure,
/// foreign keys included, is internal.
pub fn map_sqlite_error(e: rusqlite::Error) -> ApplicationError {
    match e {
        rusqlite::Error::QueryReturnedNoRows => {
            ApplicationError::NotFound("Database record not found".to_string())
        },
        rusqlite::Error::SqliteFailure(err, message) if is_uniqueness_violation(err) => {
            ApplicationError::Conflict(
                message.unwrap_or_else(|| "Constraint violation".to_string()),
            )
        },
        other => ApplicationError::Internal(format!("Database error: {other}")),
    }
}

const fn is_uniqueness_violation(err: ffi::Error) -> bool {
    matches!(
        err.extended_code,
        ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

/// Map a connection pool error
pub fn map_pool_error(e: r2d2::Error) -> ApplicationError {
    ApplicationError::Internal(format!("Connection pool error: {e}"))
}

/// Map a failed blocking task
pub fn map_join_error(e: tokio::task::JoinError) -> ApplicationError {
    ApplicationError::Internal(format!("Database task failed: {e}"))
}
