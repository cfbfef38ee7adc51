//! Optional-bounded time range used by calendar queries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// A time window whose sides may each be open
///
/// A missing bound means "unbounded on that side". A range with neither bound
/// matches everything and listings skip range filtering entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    /// A range with no bounds
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    /// Build a range, rejecting an end that precedes the start
    pub fn new(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Self, DomainError> {
        if let (Some(s), Some(e)) = (start, end) {
            if e < s {
                return Err(DomainError::InvalidDateTime(format!(
                    "time range end {e} precedes start {s}"
                )));
            }
        }
        Ok(Self { start, end })
    }

    /// True when neither side is bounded
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}
