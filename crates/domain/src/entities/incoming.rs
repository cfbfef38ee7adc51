//! Calendar objects decoded from an inbound iCalendar payload
//!
//! These carry only what the client sent. Every field except the kind is
//! optional, and the UID stays raw until the importer validates it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::TaskStatus;

/// Fields of a decoded VEVENT
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingEvent {
    pub uid: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// DTSTART carried a date without a time
    pub is_all_day: bool,
    pub status: Option<String>,
}

/// Fields of a decoded VTODO
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingTodo {
    pub uid: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub due: Option<DateTime<Utc>>,
    pub status: Option<TaskStatus>,
    pub completed: Option<DateTime<Utc>>,
    /// PRIORITY in 1..=9; 0 and absent both mean undefined
    pub priority: Option<i32>,
}

/// One decoded calendar object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "component")]
pub enum IncomingObject {
    #[serde(rename = "VEVENT")]
    Event(IncomingEvent),
    #[serde(rename = "VTODO")]
    Todo(IncomingTodo),
}

impl IncomingObject {
    /// The raw UID, if the client supplied one
    #[must_use]
    pub fn uid(&self) -> Option<&str> {
        match self {
            Self::Event(event) => event.uid.as_deref(),
            Self::Todo(todo) => todo.uid.as_deref(),
        }
    }
}
