//! Task status value object
//!
//! Represents the lifecycle state of a task.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a task
///
/// Maps onto the iCalendar VTODO STATUS property (RFC 5545) through a fixed
/// two-way table: TODO is NEEDS-ACTION, DOING is IN-PROCESS, DONE is COMPLETED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    /// Not yet started
    #[default]
    Todo,
    /// In progress
    Doing,
    /// Finished
    Done,
}

impl TaskStatus {
    /// All states, in lifecycle order
    pub const ALL: [Self; 3] = [Self::Todo, Self::Doing, Self::Done];

    /// Check if the task is finished
    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Storage and API representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "TODO",
            Self::Doing => "DOING",
            Self::Done => "DONE",
        }
    }

    /// Convert to iCalendar STATUS value
    #[must_use]
    pub const fn to_ical(&self) -> &'static str {
        match self {
            Self::Todo => "NEEDS-ACTION",
            Self::Doing => "IN-PROCESS",
            Self::Done => "COMPLETED",
        }
    }

    /// Parse from iCalendar STATUS value
    ///
    /// Anything unrecognized, including CANCELLED, becomes `Todo`.
    #[must_use]
    pub fn from_ical(status: &str) -> Self {
        match status.trim().to_uppercase().as_str() {
            "IN-PROCESS" => Self::Doing,
            "COMPLETED" => Self::Done,
            _ => Self::Todo,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "TODO" => Ok(Self::Todo),
            "DOING" => Ok(Self::Doing),
            "DONE" => Ok(Self::Done),
            _ => Err("Invalid task status"),
        }
    }
}
