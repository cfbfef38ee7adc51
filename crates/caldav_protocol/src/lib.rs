//! CalDAV protocol layer
//!
//! Transport-independent pieces of the CalDAV adapter: DAV addressing,
//! property negotiation, PROPFIND/REPORT request parsing, the multistatus
//! writer and the iCalendar codec. HTTP handlers compose these with the
//! application services.

pub mod addressing;
pub mod error;
pub mod ical;
pub mod multistatus;
pub mod properties;
pub mod propfind;
pub mod report;
mod xml;

pub use addressing::{DavLocation, DavPaths, Depth};
pub use error::ProtocolError;
pub use ical::ICalendarCodec;
pub use multistatus::{DavResponse, Multistatus, ResponseBody};
pub use properties::{
    DavStatus, PropRequest, PropStat, Property, PropertyName, PropertySet, PropertyValue,
    ResourceTypeFlag, negotiate,
};
pub use propfind::{parse_propfind, parse_propfind_strict};
pub use report::{CompFilter, MAX_FILTER_DEPTH, ReportRequest, parse_report};

/// DAV namespace URI
pub const DAV_NS: &str = "DAV:";

/// CalDAV namespace URI
pub const CALDAV_NS: &str = "urn:ietf:params:xml:ns:caldav";

/// Content type of iCalendar bodies
pub const ICALENDAR_CONTENT_TYPE: &str = "text/calendar; charset=utf-8";

/// Content type of multistatus bodies
pub const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";

/// Compliance classes advertised in the `DAV` header
pub const DAV_COMPLIANCE: &str = "1, 2, calendar-access, calendar-proxy";

/// Methods advertised in the `Allow` header
pub const ALLOWED_METHODS: &str = "OPTIONS, GET, HEAD, PUT, DELETE, PROPFIND, REPORT";
