//! Transaction port
//!
//! The import reconciler hands a unit of work to the storage layer, which runs
//! it inside one transaction and commits only if the work returns `Ok`.

use async_trait::async_trait;
use domain::{IcalUid, ScheduledEvent, Task, UserId};
use serde::{Deserialize, Serialize};

use crate::error::ApplicationError;

/// Counts of what an import changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub events_created: usize,
    pub events_updated: usize,
    pub tasks_created: usize,
    pub tasks_updated: usize,
}

impl ImportSummary {
    /// Total number of objects written
    #[must_use]
    pub const fn total(&self) -> usize {
        self.events_created + self.events_updated + self.tasks_created + self.tasks_updated
    }

    /// Whether any object was newly created
    #[must_use]
    pub const fn created_any(&self) -> bool {
        self.events_created + self.tasks_created > 0
    }
}

/// Synchronous view of storage inside an open transaction
pub trait CalendarTransaction {
    fn find_event_by_uid(
        &mut self,
        user_id: &UserId,
        uid: &IcalUid,
    ) -> Result<Option<ScheduledEvent>, ApplicationError>;

    fn find_task_by_uid(
        &mut self,
        user_id: &UserId,
        uid: &IcalUid,
    ) -> Result<Option<Task>, ApplicationError>;

    fn insert_event(&mut self, event: &ScheduledEvent) -> Result<(), ApplicationError>;

    fn update_event(&mut self, event: &ScheduledEvent) -> Result<(), ApplicationError>;

    fn insert_task(&mut self, task: &Task) -> Result<(), ApplicationError>;

    fn update_task(&mut self, task: &Task) -> Result<(), ApplicationError>;
}

/// Work executed inside a transaction
pub type ImportWork = Box<
    dyn FnOnce(&mut dyn CalendarTransaction) -> Result<ImportSummary, ApplicationError> + Send,
>;

/// Port for running work atomically
#[async_trait]
pub trait TransactionPort: Send + Sync {
    /// Run `work` in one transaction, rolling back on error
    async fn run_atomically(&self, work: ImportWork) -> Result<ImportSummary, ApplicationError>;
}
