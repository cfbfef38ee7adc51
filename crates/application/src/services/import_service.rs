//! Import reconciler
//!
//! Upserts decoded calendar objects into a calendar by UID. Every object of
//! one payload is written in the same transaction.

use std::{fmt, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use domain::{
    CalendarId, IcalUid, IncomingEvent, IncomingObject, IncomingTodo, ProjectId, ScheduledEvent,
    Task, UserId,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    error::ApplicationError,
    ports::{CalendarStore, CalendarTransaction, ImportSummary, ImportTargetPolicy, TransactionPort},
};

/// Where newly created resources land
#[derive(Debug, Clone, Copy)]
struct ImportTarget {
    user_id: UserId,
    calendar_id: CalendarId,
    project_id: ProjectId,
}

/// Service that reconciles inbound iCalendar objects with stored resources
pub struct ImportService {
    calendars: Arc<dyn CalendarStore>,
    policy: Arc<dyn ImportTargetPolicy>,
    transactions: Arc<dyn TransactionPort>,
}

impl fmt::Debug for ImportService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportService").finish_non_exhaustive()
    }
}

impl ImportService {
    pub fn new(
        calendars: Arc<dyn CalendarStore>,
        policy: Arc<dyn ImportTargetPolicy>,
        transactions: Arc<dyn TransactionPort>,
    ) -> Self {
        Self {
            calendars,
            policy,
            transactions,
        }
    }

    /// Import `objects` into a calendar of `user_id`
    ///
    /// Objects whose UID already exists for the user are updated in place and
    /// keep their calendar. All others are created in this calendar under the
    /// project chosen by the target policy. Any failure rolls back the whole
    /// payload.
    #[instrument(skip(self, objects), fields(objects = objects.len()))]
    pub async fn import(
        &self,
        user_id: &UserId,
        calendar_id: &CalendarId,
        objects: Vec<IncomingObject>,
    ) -> Result<ImportSummary, ApplicationError> {
        let calendar = self
            .calendars
            .get_calendar(user_id, calendar_id)
            .await?
            .ok_or_else(|| ApplicationError::NotFound(format!("calendar {calendar_id}")))?;

        let keyed = objects
            .into_iter()
            .map(keyed)
            .collect::<Result<Vec<_>, _>>()?;
        if keyed.is_empty() {
            return Ok(ImportSummary::default());
        }

        let project_id = self.policy.resolve_project(&calendar).await?;
        let target = ImportTarget {
            user_id: *user_id,
            calendar_id: calendar.id,
            project_id,
        };

        let summary = self
            .transactions
            .run_atomically(Box::new(move |tx: &mut dyn CalendarTransaction| {
                reconcile(tx, &target, keyed, Utc::now())
            }))
            .await?;

        info!(
            events_created = summary.events_created,
            events_updated = summary.events_updated,
            tasks_created = summary.tasks_created,
            tasks_updated = summary.tasks_updated,
            "Imported calendar objects"
        );
        Ok(summary)
    }
}

fn keyed(object: IncomingObject) -> Result<(IcalUid, IncomingObject), ApplicationError> {
    let Some(raw) = object.uid() else {
        return Err(ApplicationError::InvalidOperation(
            "calendar object without UID".to_string(),
        ));
    };
    let uid = IcalUid::new(raw)?;
    Ok((uid, object))
}

/// Fresh opaque version token
fn new_etag() -> String {
    Uuid::now_v7().simple().to_string()
}

fn reconcile(
    tx: &mut dyn CalendarTransaction,
    target: &ImportTarget,
    objects: Vec<(IcalUid, IncomingObject)>,
    now: DateTime<Utc>,
) -> Result<ImportSummary, ApplicationError> {
    let mut summary = ImportSummary::default();
    for (uid, object) in objects {
        match object {
            IncomingObject::Event(incoming) => {
                upsert_event(tx, target, uid, &incoming, now, &mut summary)?;
            },
            IncomingObject::Todo(incoming) => {
                upsert_task(tx, target, uid, &incoming, now, &mut summary)?;
            },
        }
    }
    Ok(summary)
}

/// Resolve start and end, falling back to the stored span on update
fn event_span(
    uid: &IcalUid,
    incoming: &IncomingEvent,
    stored: Option<(DateTime<Utc>, DateTime<Utc>)>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), ApplicationError> {
    let (start, end) = match (incoming.start, stored) {
        (Some(start), _) => {
            let default_end = if incoming.is_all_day {
                start + Duration::days(1)
            } else {
                start
            };
            (start, incoming.end.unwrap_or(default_end))
        },
        (None, Some((start, end))) => (start, incoming.end.unwrap_or(end)),
        (None, None) => {
            return Err(ApplicationError::InvalidOperation(format!(
                "VEVENT {uid} has no DTSTART"
            )));
        },
    };
    if end < start {
        return Err(ApplicationError::InvalidOperation(format!(
            "VEVENT {uid} ends before it starts"
        )));
    }
    Ok((start, end))
}

fn upsert_event(
    tx: &mut dyn CalendarTransaction,
    target: &ImportTarget,
    uid: IcalUid,
    incoming: &IncomingEvent,
    now: DateTime<Utc>,
    summary: &mut ImportSummary,
) -> Result<(), ApplicationError> {
    if let Some(mut event) = tx.find_event_by_uid(&target.user_id, &uid)? {
        let (start, end) = event_span(&uid, incoming, Some((event.start_at, event.end_at)))?;
        if let Some(title) = &incoming.summary {
            event.title.clone_from(title);
        }
        event.description.clone_from(&incoming.description);
        event.location.clone_from(&incoming.location);
        event.start_at = start;
        event.end_at = end;
        event.is_all_day = incoming.is_all_day;
        if let Some(status) = &incoming.status {
            event.status.clone_from(status);
        }
        event.sequence += 1;
        event.etag = Some(new_etag());
        event.updated_at = now;
        tx.update_event(&event)?;
        summary.events_updated += 1;
        return Ok(());
    }

    if tx.find_task_by_uid(&target.user_id, &uid)?.is_some() {
        return Err(ApplicationError::Conflict(format!(
            "UID {uid} already belongs to a task"
        )));
    }

    let (start, end) = event_span(&uid, incoming, None)?;
    let mut event = ScheduledEvent::new(
        target.user_id,
        target.calendar_id,
        uid,
        incoming.summary.clone().unwrap_or_default(),
        start,
        end,
    )
    .with_project(target.project_id)
    .with_etag(new_etag());
    event.description.clone_from(&incoming.description);
    event.location.clone_from(&incoming.location);
    event.is_all_day = incoming.is_all_day;
    if let Some(status) = &incoming.status {
        event.status.clone_from(status);
    }
    event.created_at = now;
    event.updated_at = now;
    tx.insert_event(&event)?;
    summary.events_created += 1;
    Ok(())
}

fn upsert_task(
    tx: &mut dyn CalendarTransaction,
    target: &ImportTarget,
    uid: IcalUid,
    incoming: &IncomingTodo,
    now: DateTime<Utc>,
    summary: &mut ImportSummary,
) -> Result<(), ApplicationError> {
    let status = incoming.status.unwrap_or_default();

    if let Some(mut task) = tx.find_task_by_uid(&target.user_id, &uid)? {
        if let Some(title) = &incoming.summary {
            task.title.clone_from(title);
        }
        task.note.clone_from(&incoming.description);
        task.due_at = incoming.due;
        task.priority = incoming.priority.unwrap_or_default();
        task.set_status(status, incoming.completed, now);
        task.etag = Some(new_etag());
        task.updated_at = now;
        tx.update_task(&task)?;
        summary.tasks_updated += 1;
        return Ok(());
    }

    if tx.find_event_by_uid(&target.user_id, &uid)?.is_some() {
        return Err(ApplicationError::Conflict(format!(
            "UID {uid} already belongs to an event"
        )));
    }

    let mut task = Task::new(
        target.user_id,
        target.project_id,
        uid,
        incoming.summary.clone().unwrap_or_default(),
    )
    .in_calendar(target.calendar_id)
    .with_etag(new_etag());
    task.note.clone_from(&incoming.description);
    task.due_at = incoming.due;
    task.priority = incoming.priority.unwrap_or_default();
    task.set_status(status, incoming.completed, now);
    task.created_at = now;
    task.updated_at = now;
    tx.insert_task(&task)?;
    summary.tasks_created += 1;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use async_trait::async_trait;
    use chrono::TimeZone;
    use domain::{Calendar, TaskStatus};

    use super::*;
    use crate::{
        ports::{ImportWork, MockCalendarStore},
        services::FixedProject,
    };

    #[derive(Debug, Clone, Default)]
    struct Tables {
        events: HashMap<String, ScheduledEvent>,
        tasks: HashMap<String, Task>,
    }

    impl CalendarTransaction for Tables {
        fn find_event_by_uid(
            &mut self,
            user_id: &UserId,
            uid: &IcalUid,
        ) -> Result<Option<ScheduledEvent>, ApplicationError> {
            Ok(self
                .events
                .get(uid.as_str())
                .filter(|e| e.user_id == *user_id)
                .cloned())
        }

        fn find_task_by_uid(
            &mut self,
            user_id: &UserId,
            uid: &IcalUid,
        ) -> Result<Option<Task>, ApplicationError> {
            Ok(self
                .tasks
                .get(uid.as_str())
                .filter(|t| t.user_id == *user_id)
                .cloned())
        }

        fn insert_event(&mut self, event: &ScheduledEvent) -> Result<(), ApplicationError> {
            self.events.insert(event.ical_uid.to_string(), event.clone());
            Ok(())
        }

        fn update_event(&mut self, event: &ScheduledEvent) -> Result<(), ApplicationError> {
            self.insert_event(event)
        }

        fn insert_task(&mut self, task: &Task) -> Result<(), ApplicationError> {
            self.tasks.insert(task.ical_uid.to_string(), task.clone());
            Ok(())
        }

        fn update_task(&mut self, task: &Task) -> Result<(), ApplicationError> {
            self.insert_task(task)
        }
    }

    /// Commits the working copy only when the work succeeds
    #[derive(Default)]
    struct MemoryTransactions {
        tables: Mutex<Tables>,
        runs: AtomicUsize,
    }

    #[async_trait]
    impl TransactionPort for MemoryTransactions {
        async fn run_atomically(&self, work: ImportWork) -> Result<ImportSummary, ApplicationError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            let mut tables = self.tables.lock().unwrap();
            let mut working = tables.clone();
            let summary = work(&mut working)?;
            *tables = working;
            Ok(summary)
        }
    }

    struct Fixture {
        user: UserId,
        calendar: Calendar,
        project: ProjectId,
        transactions: Arc<MemoryTransactions>,
        service: ImportService,
    }

    fn fixture() -> Fixture {
        let user = UserId::new();
        let calendar = Calendar::new(user, "Personal");
        let project = ProjectId::new();
        let stored = calendar.clone();
        let mut calendars = MockCalendarStore::new();
        calendars
            .expect_get_calendar()
            .returning(move |_, _| Ok(Some(stored.clone())));
        let transactions = Arc::new(MemoryTransactions::default());
        let service = ImportService::new(
            Arc::new(calendars),
            Arc::new(FixedProject(project)),
            transactions.clone(),
        );
        Fixture {
            user,
            calendar,
            project,
            transactions,
            service,
        }
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    fn vevent(uid: &str, summary: &str) -> IncomingObject {
        IncomingObject::Event(IncomingEvent {
            uid: Some(uid.to_string()),
            summary: Some(summary.to_string()),
            start: Some(at(10, 9)),
            end: Some(at(10, 10)),
            ..IncomingEvent::default()
        })
    }

    fn vtodo(uid: &str, summary: &str, status: Option<TaskStatus>) -> IncomingObject {
        IncomingObject::Todo(IncomingTodo {
            uid: Some(uid.to_string()),
            summary: Some(summary.to_string()),
            status,
            ..IncomingTodo::default()
        })
    }

    #[tokio::test]
    async fn novel_event_is_created_in_target_project() {
        let fx = fixture();
        let summary = fx
            .service
            .import(&fx.user, &fx.calendar.id, vec![vevent("e1", "Kickoff")])
            .await
            .unwrap();

        assert_eq!(summary.events_created, 1);
        let tables = fx.transactions.tables.lock().unwrap();
        assert_eq!(tables.events.len(), 1);
        let event = &tables.events["e1"];
        assert_eq!(event.project_id, Some(fx.project));
        assert_eq!(event.calendar_id, fx.calendar.id);
        assert_eq!(event.status, "CONFIRMED");
        assert!(event.etag.is_some());
    }

    #[tokio::test]
    async fn matching_uid_updates_without_duplicating() {
        let fx = fixture();
        fx.service
            .import(&fx.user, &fx.calendar.id, vec![vevent("e1", "Kickoff")])
            .await
            .unwrap();
        let first_etag = fx.transactions.tables.lock().unwrap().events["e1"].etag.clone();

        let summary = fx
            .service
            .import(&fx.user, &fx.calendar.id, vec![vevent("e1", "Kickoff (moved)")])
            .await
            .unwrap();

        assert_eq!(summary.events_updated, 1);
        assert_eq!(summary.events_created, 0);
        let tables = fx.transactions.tables.lock().unwrap();
        assert_eq!(tables.events.len(), 1);
        let event = &tables.events["e1"];
        assert_eq!(event.title, "Kickoff (moved)");
        assert_eq!(event.sequence, 1);
        assert_ne!(event.etag, first_etag);
    }

    #[tokio::test]
    async fn update_keeps_owning_calendar() {
        let fx = fixture();
        let other_calendar = CalendarId::new();
        let existing = ScheduledEvent::new(
            fx.user,
            other_calendar,
            IcalUid::new("e1").unwrap(),
            "Old",
            at(1, 9),
            at(1, 10),
        );
        fx.transactions
            .tables
            .lock()
            .unwrap()
            .events
            .insert("e1".to_string(), existing);

        fx.service
            .import(&fx.user, &fx.calendar.id, vec![vevent("e1", "New")])
            .await
            .unwrap();

        let tables = fx.transactions.tables.lock().unwrap();
        assert_eq!(tables.events["e1"].calendar_id, other_calendar);
        assert_eq!(tables.events["e1"].ical_uid.as_str(), "e1");
    }

    #[tokio::test]
    async fn todo_status_and_completion_are_applied() {
        let fx = fixture();
        fx.service
            .import(
                &fx.user,
                &fx.calendar.id,
                vec![vtodo("t1", "Taxes", Some(TaskStatus::Done))],
            )
            .await
            .unwrap();

        let tables = fx.transactions.tables.lock().unwrap();
        let task = &tables.tasks["t1"];
        assert_eq!(task.status, TaskStatus::Done);
        assert!(task.completed_at.is_some());
        assert_eq!(task.calendar_id, Some(fx.calendar.id));
        assert_eq!(task.project_id, fx.project);
    }

    #[tokio::test]
    async fn missing_status_defaults_to_todo_on_update() {
        let fx = fixture();
        fx.service
            .import(&fx.user, &fx.calendar.id, vec![vtodo("t1", "Taxes", Some(TaskStatus::Doing))])
            .await
            .unwrap();
        fx.service
            .import(&fx.user, &fx.calendar.id, vec![vtodo("t1", "Taxes", None)])
            .await
            .unwrap();

        let tables = fx.transactions.tables.lock().unwrap();
        assert_eq!(tables.tasks["t1"].status, TaskStatus::Todo);
    }

    #[tokio::test]
    async fn todo_priority_is_applied_and_cleared_when_omitted() {
        let fx = fixture();
        let urgent = IncomingObject::Todo(IncomingTodo {
            uid: Some("t1".to_string()),
            summary: Some("Taxes".to_string()),
            priority: Some(1),
            ..IncomingTodo::default()
        });
        fx.service
            .import(&fx.user, &fx.calendar.id, vec![urgent])
            .await
            .unwrap();
        assert_eq!(fx.transactions.tables.lock().unwrap().tasks["t1"].priority, 1);

        fx.service
            .import(&fx.user, &fx.calendar.id, vec![vtodo("t1", "Taxes", None)])
            .await
            .unwrap();
        assert_eq!(fx.transactions.tables.lock().unwrap().tasks["t1"].priority, 0);
    }

    #[tokio::test]
    async fn failure_rolls_back_whole_payload() {
        let fx = fixture();
        let broken = IncomingObject::Event(IncomingEvent {
            uid: Some("e2".to_string()),
            ..IncomingEvent::default()
        });

        let err = fx
            .service
            .import(&fx.user, &fx.calendar.id, vec![vevent("e1", "Fine"), broken])
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::InvalidOperation(_)));
        assert!(fx.transactions.tables.lock().unwrap().events.is_empty());
    }

    #[tokio::test]
    async fn object_without_uid_is_rejected_before_transaction() {
        let fx = fixture();
        let anonymous = IncomingObject::Todo(IncomingTodo::default());

        let err = fx
            .service
            .import(&fx.user, &fx.calendar.id, vec![anonymous])
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::InvalidOperation(_)));
        assert_eq!(fx.transactions.runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn uid_of_other_kind_conflicts() {
        let fx = fixture();
        fx.service
            .import(&fx.user, &fx.calendar.id, vec![vtodo("shared", "Task", None)])
            .await
            .unwrap();

        let err = fx
            .service
            .import(&fx.user, &fx.calendar.id, vec![vevent("shared", "Event")])
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::Conflict(_)));
        assert!(fx.transactions.tables.lock().unwrap().events.is_empty());
    }

    #[tokio::test]
    async fn all_day_event_without_end_spans_one_day() {
        let fx = fixture();
        let object = IncomingObject::Event(IncomingEvent {
            uid: Some("holiday".to_string()),
            summary: Some("Holiday".to_string()),
            start: Some(at(5, 0)),
            is_all_day: true,
            ..IncomingEvent::default()
        });

        fx.service
            .import(&fx.user, &fx.calendar.id, vec![object])
            .await
            .unwrap();

        let tables = fx.transactions.tables.lock().unwrap();
        let event = &tables.events["holiday"];
        assert!(event.is_all_day);
        assert_eq!(event.end_at, at(6, 0));
    }

    #[tokio::test]
    async fn empty_payload_is_a_no_op() {
        let fx = fixture();
        let summary = fx
            .service
            .import(&fx.user, &fx.calendar.id, Vec::new())
            .await
            .unwrap();
        assert_eq!(summary, ImportSummary::default());
        assert_eq!(fx.transactions.runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_calendar_is_not_found() {
        let mut calendars = MockCalendarStore::new();
        calendars.expect_get_calendar().returning(|_, _| Ok(None));
        let service = ImportService::new(
            Arc::new(calendars),
            Arc::new(FixedProject(ProjectId::new())),
            Arc::new(MemoryTransactions::default()),
        );

        let err = service
            .import(&UserId::new(), &CalendarId::new(), vec![vevent("e1", "x")])
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound(_)));
    }
}
