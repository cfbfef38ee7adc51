//! Request context for propagating the authenticated principal
//!
//! The HTTP auth middleware creates a `RequestContext` after verifying the
//! caller's credentials. DAV handlers use it to check that the user id embedded
//! in a path belongs to the caller.
//!
//! # Examples
//!
//! ```
//! use application::RequestContext;
//! use domain::UserId;
//!
//! let user_id = UserId::new();
//! let ctx = RequestContext::new(user_id);
//!
//! assert_eq!(ctx.user_id(), user_id);
//! assert!(ctx.authorize_principal(&user_id).is_ok());
//! assert!(ctx.authorize_principal(&UserId::new()).is_err());
//! ```

use chrono::{DateTime, Utc};
use domain::UserId;
use uuid::Uuid;

use crate::error::ApplicationError;

/// Context for a single request, carrying the principal and request metadata
#[derive(Debug, Clone)]
pub struct RequestContext {
    user_id: UserId,
    request_id: Uuid,
    timestamp: DateTime<Utc>,
}

impl RequestContext {
    /// Create a context with a fresh request id
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        Self::with_request_id(user_id, Uuid::now_v7())
    }

    /// Create a context correlated with an upstream request id
    #[must_use]
    pub fn with_request_id(user_id: UserId, request_id: Uuid) -> Self {
        Self {
            user_id,
            request_id,
            timestamp: Utc::now(),
        }
    }

    /// The authenticated user
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub const fn request_id(&self) -> Uuid {
        self.request_id
    }

    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Check that a path-embedded user id is the caller
    ///
    /// A mismatch is `Forbidden`, never `NotFound`: principal URLs are not
    /// secret, and a 404 here would make a wrongly configured client look like
    /// it is talking to an empty account.
    pub fn authorize_principal(&self, path_user: &UserId) -> Result<(), ApplicationError> {
        if self.user_id == *path_user {
            Ok(())
        } else {
            Err(ApplicationError::Forbidden(format!(
                "principal {} may not access resources of {path_user}",
                self.user_id
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_creates_unique_request_id() {
        let user_id = UserId::new();
        let ctx1 = RequestContext::new(user_id);
        let ctx2 = RequestContext::new(user_id);

        assert_ne!(ctx1.request_id(), ctx2.request_id());
    }

    #[test]
    fn with_request_id_uses_provided_id() {
        let user_id = UserId::new();
        let request_id = Uuid::new_v4();
        let ctx = RequestContext::with_request_id(user_id, request_id);

        assert_eq!(ctx.request_id(), request_id);
        assert_eq!(ctx.user_id(), user_id);
    }

    #[test]
    fn new_captures_current_timestamp() {
        let before = Utc::now();
        let ctx = RequestContext::new(UserId::new());
        assert!(ctx.timestamp() >= before);
    }

    #[test]
    fn mismatched_principal_is_forbidden() {
        let ctx = RequestContext::new(UserId::new());
        let err = ctx.authorize_principal(&UserId::new()).unwrap_err();
        assert!(matches!(err, ApplicationError::Forbidden(_)));
    }
}
