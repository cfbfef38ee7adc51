//! Atomic import execution on a single SQLite transaction

use std::sync::Arc;

use application::{
    error::ApplicationError,
    ports::{CalendarTransaction, ImportSummary, ImportWork, TransactionPort},
};
use async_trait::async_trait;
use domain::{IcalUid, ScheduledEvent, Task, UserId};
use rusqlite::{Transaction, TransactionBehavior};
use tokio::task;
use tracing::{debug, instrument, warn};

use super::{
    connection::ConnectionPool,
    error::{map_join_error, map_pool_error, map_sqlite_error},
    records,
};

/// Runs import work inside an `IMMEDIATE` transaction
///
/// The write lock is taken up front so two imports for the same user cannot
/// interleave their lookups and inserts. Work that returns `Err` is rolled back.
#[derive(Debug, Clone)]
pub struct SqliteTransactionManager {
    pool: Arc<ConnectionPool>,
}

impl SqliteTransactionManager {
    #[must_use]
    pub const fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }
}

struct SqliteCalendarTransaction<'a> {
    tx: &'a Transaction<'a>,
}

fn expect_one_row(changed: usize, what: &str) -> Result<(), ApplicationError> {
    if changed == 0 {
        Err(ApplicationError::NotFound(format!("{what} vanished during import")))
    } else {
        Ok(())
    }
}

impl CalendarTransaction for SqliteCalendarTransaction<'_> {
    fn find_event_by_uid(
        &mut self,
        user_id: &UserId,
        uid: &IcalUid,
    ) -> Result<Option<ScheduledEvent>, ApplicationError> {
        records::select_event_by_uid(self.tx, user_id, uid).map_err(map_sqlite_error)
    }

    fn find_task_by_uid(
        &mut self,
        user_id: &UserId,
        uid: &IcalUid,
    ) -> Result<Option<Task>, ApplicationError> {
        records::select_task_by_uid(self.tx, user_id, uid).map_err(map_sqlite_error)
    }

    fn insert_event(&mut self, event: &ScheduledEvent) -> Result<(), ApplicationError> {
        records::insert_event(self.tx, event).map_err(map_sqlite_error)
    }

    fn update_event(&mut self, event: &ScheduledEvent) -> Result<(), ApplicationError> {
        let changed = records::update_event(self.tx, event).map_err(map_sqlite_error)?;
        expect_one_row(changed, "event")
    }

    fn insert_task(&mut self, task: &Task) -> Result<(), ApplicationError> {
        records::insert_task(self.tx, task).map_err(map_sqlite_error)
    }

    fn update_task(&mut self, task: &Task) -> Result<(), ApplicationError> {
        let changed = records::update_task(self.tx, task).map_err(map_sqlite_error)?;
        expect_one_row(changed, "task")
    }
}

#[async_trait]
impl TransactionPort for SqliteTransactionManager {
    #[instrument(skip(self, work))]
    async fn run_atomically(&self, work: ImportWork) -> Result<ImportSummary, ApplicationError> {
        let pool = Arc::clone(&self.pool);

        task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(map_pool_error)?;
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(map_sqlite_error)?;

            let outcome = {
                let mut handle = SqliteCalendarTransaction { tx: &tx };
                work(&mut handle)
            };

            match outcome {
                Ok(summary) => {
                    tx.commit().map_err(map_sqlite_error)?;
                    debug!(total = summary.total(), "Import committed");
                    Ok(summary)
                },
                Err(e) => {
                    if let Err(rollback) = tx.rollback() {
                        warn!(error = %rollback, "Rollback failed");
                    }
                    Err(e)
                },
            }
        })
        .await
        .map_err(map_join_error)?
    }
}
