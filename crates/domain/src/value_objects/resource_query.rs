//! Listing request against the resources of one calendar

use serde::{Deserialize, Serialize};

use super::TimeRange;

/// Which resource kinds a listing should return, and in what window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceQuery {
    pub include_events: bool,
    pub include_tasks: bool,
    pub range: TimeRange,
}

impl ResourceQuery {
    /// Every event and task, unfiltered
    #[must_use]
    pub const fn all() -> Self {
        Self {
            include_events: true,
            include_tasks: true,
            range: TimeRange::unbounded(),
        }
    }

    /// Events only
    #[must_use]
    pub const fn events() -> Self {
        Self {
            include_events: true,
            include_tasks: false,
            range: TimeRange::unbounded(),
        }
    }

    /// Tasks only
    #[must_use]
    pub const fn tasks() -> Self {
        Self {
            include_events: false,
            include_tasks: true,
            range: TimeRange::unbounded(),
        }
    }

    /// Restrict the listing to a time window
    #[must_use]
    pub const fn with_range(mut self, range: TimeRange) -> Self {
        self.range = range;
        self
    }
}

impl Default for ResourceQuery {
    fn default() -> Self {
        Self::all()
    }
}
