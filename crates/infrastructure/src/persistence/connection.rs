//! Database connection management
//!
//! Provides SQLite connection pooling via r2d2.

use std::{path::Path, sync::Arc};

use application::error::ApplicationError;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use thiserror::Error;
use tracing::{debug, info};

use super::error::{map_join_error, map_pool_error, map_sqlite_error};
use crate::config::DatabaseConfig;

/// Path that selects an in-memory database
pub const MEMORY_PATH: &str = ":memory:";

/// Database errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Migration error: {0}")]
    Migration(String),
}

/// SQLite connection pool type alias
pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// Pooled connection type alias
pub type PooledConn = PooledConnection<SqliteConnectionManager>;

/// Create a new connection pool
///
/// Every in-memory connection is its own database, so a `:memory:` pool is
/// capped at one connection.
pub fn create_pool(config: &DatabaseConfig) -> Result<ConnectionPool, DatabaseError> {
    info!(path = %config.path, max_connections = config.max_connections, "Creating database connection pool");

    let (manager, max_size) = if config.path == MEMORY_PATH {
        (SqliteConnectionManager::memory(), 1)
    } else {
        // Create parent directories if they don't exist
        if let Some(parent) = Path::new(&config.path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DatabaseError::Migration(format!("Failed to create database directory: {e}"))
                })?;
            }
        }
        (
            SqliteConnectionManager::file(&config.path),
            config.max_connections.max(1),
        )
    };

    let manager = manager.with_init(initialize_connection);

    let pool = Pool::builder().max_size(max_size).build(manager)?;

    if config.run_migrations {
        let conn = pool.get()?;
        crate::persistence::migrations::run_migrations(&conn)?;
    }

    debug!("Database connection pool created successfully");
    Ok(pool)
}

/// Run `work` on a pooled connection on the blocking thread pool
pub(crate) async fn with_connection<T, F>(
    pool: &Arc<ConnectionPool>,
    work: F,
) -> Result<T, ApplicationError>
where
    T: Send + 'static,
    F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
{
    let pool = Arc::clone(pool);
    tokio::task::spawn_blocking(move || {
        let conn = pool.get().map_err(map_pool_error)?;
        work(&*conn).map_err(map_sqlite_error)
    })
    .await
    .map_err(map_join_error)?
}

/// Per-connection settings; foreign keys are off by default in SQLite
fn initialize_connection(conn: &mut Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
}
