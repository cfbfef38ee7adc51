//! Application state shared across handlers

use std::sync::Arc;

use application::{CalDavService, ImportService, LinkedOrDefaultProject};
use caldav_protocol::{DavPaths, ICalendarCodec};
use infrastructure::{
    CalDavConfig, ConnectionPool, SqliteCalendarStore, SqliteEventStore, SqliteTaskStore,
    SqliteTransactionManager,
};

/// Shared application state
#[derive(Clone, Debug)]
pub struct AppState {
    /// Listing, lookup and delete
    pub caldav: Arc<CalDavService>,
    /// PUT reconciliation
    pub import: Arc<ImportService>,
    pub codec: Arc<ICalendarCodec>,
    pub paths: Arc<DavPaths>,
}

impl AppState {
    /// Wire the SQLite stores behind the application services
    #[must_use]
    pub fn from_pool(pool: Arc<ConnectionPool>, config: &CalDavConfig) -> Self {
        let calendars = Arc::new(SqliteCalendarStore::new(Arc::clone(&pool)));
        let events = Arc::new(SqliteEventStore::new(Arc::clone(&pool)));
        let tasks = Arc::new(SqliteTaskStore::new(Arc::clone(&pool)));
        let transactions = Arc::new(SqliteTransactionManager::new(pool));

        let caldav = CalDavService::new(calendars.clone(), events, tasks);
        let import = ImportService::new(
            calendars.clone(),
            Arc::new(LinkedOrDefaultProject::new(calendars)),
            transactions,
        );

        Self {
            caldav: Arc::new(caldav),
            import: Arc::new(import),
            codec: Arc::new(ICalendarCodec::new(config.product_id.clone())),
            paths: Arc::new(DavPaths::new(&config.base_path)),
        }
    }
}
