//! iCalendar UID value object

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

/// Stable iCalendar UID of a calendar resource
///
/// The UID doubles as the resource name: a resource lives at
/// `{calendar-href}{uid}.ics`, so it must be usable as a single path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IcalUid(String);

impl IcalUid {
    /// Longest accepted UID in bytes, after trimming
    pub const MAX_LEN: usize = 255;

    /// Validate and wrap a UID received from a client or storage
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty()
            || trimmed.len() > Self::MAX_LEN
            || trimmed.contains('/')
            || trimmed.chars().any(char::is_control)
        {
            return Err(DomainError::InvalidUid(value));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Generate a fresh, globally unique UID
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the UID as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IcalUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for IcalUid {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<IcalUid> for String {
    fn from(uid: IcalUid) -> Self {
        uid.0
    }
}

impl AsRef<str> for IcalUid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
