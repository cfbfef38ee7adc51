//! Application-level errors

use domain::DomainError;
use thiserror::Error;

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Referenced calendar, resource or project does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Authenticated principal may not touch this resource
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Request is well-formed but cannot be applied
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Write collides with existing state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Whether the caller sent something the server can never accept as-is
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Domain(_)
                | Self::NotFound(_)
                | Self::Forbidden(_)
                | Self::InvalidOperation(_)
                | Self::Conflict(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_error_is_transparent() {
        let err: ApplicationError = DomainError::not_found("Calendar", "abc").into();
        assert_eq!(err.to_string(), "Calendar not found: abc");
    }

    #[test]
    fn client_errors_are_classified() {
        assert!(ApplicationError::Forbidden("x".into()).is_client_error());
        assert!(ApplicationError::Conflict("x".into()).is_client_error());
        assert!(!ApplicationError::Internal("x".into()).is_client_error());
        assert!(!ApplicationError::Configuration("x".into()).is_client_error());
    }

    #[test]
    fn messages_carry_context() {
        assert_eq!(
            ApplicationError::NotFound("calendar 1".into()).to_string(),
            "Not found: calendar 1"
        );
        assert_eq!(
            ApplicationError::InvalidOperation("missing UID".into()).to_string(),
            "Invalid operation: missing UID"
        );
    }
}
