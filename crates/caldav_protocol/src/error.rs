//! Protocol errors

use thiserror::Error;

/// Errors raised while interpreting DAV requests or calendar payloads
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Request body is not well-formed XML
    #[error("Malformed XML: {0}")]
    Xml(String),

    /// Path segment is not a valid identifier
    #[error("Invalid {kind} identifier: {value}")]
    InvalidIdentifier { kind: &'static str, value: String },

    /// `Depth` header has an unsupported value
    #[error("Invalid Depth header: {0}")]
    InvalidDepth(String),

    /// A time-range bound is not in `YYYYMMDDThhmmssZ` form
    #[error("Invalid time-range: {0}")]
    InvalidTimeRange(String),

    /// REPORT body is not a supported report
    #[error("Unsupported report: {0}")]
    UnsupportedReport(String),

    /// Component filters nest deeper than CalDAV allows
    #[error("Component filter nesting exceeds {0} levels")]
    FilterTooDeep(usize),

    /// iCalendar payload could not be parsed
    #[error("iCalendar parse error: {0}")]
    Calendar(String),
}

impl From<quick_xml::Error> for ProtocolError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for ProtocolError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        assert_eq!(
            ProtocolError::InvalidDepth("2".into()).to_string(),
            "Invalid Depth header: 2"
        );
        assert_eq!(
            ProtocolError::FilterTooDeep(3).to_string(),
            "Component filter nesting exceeds 3 levels"
        );
        assert_eq!(
            ProtocolError::UnsupportedReport("sync-collection".into()).to_string(),
            "Unsupported report: sync-collection"
        );
    }
}
