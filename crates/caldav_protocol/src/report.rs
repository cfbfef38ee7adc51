//! REPORT request bodies
//!
//! Supports `calendar-query` with a nested `comp-filter` tree and
//! `calendar-multiget`. Anything else is an unsupported report.

use chrono::{DateTime, NaiveDateTime, Utc};
use domain::{ResourceQuery, TimeRange};

use crate::{
    CALDAV_NS, DAV_NS,
    error::ProtocolError,
    propfind::prop_request,
    properties::PropRequest,
    xml::{XmlElement, parse_document},
};

/// Deepest comp-filter nesting accepted (VCALENDAR > VEVENT > VALARM)
pub const MAX_FILTER_DEPTH: usize = 3;

const TIME_RANGE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// A parsed REPORT request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportRequest {
    CalendarQuery {
        props: PropRequest,
        filter: Option<CompFilter>,
    },
    Multiget {
        props: PropRequest,
        hrefs: Vec<String>,
    },
}

impl ReportRequest {
    #[must_use]
    pub const fn props(&self) -> &PropRequest {
        match self {
            Self::CalendarQuery { props, .. } | Self::Multiget { props, .. } => props,
        }
    }
}

/// One level of a `comp-filter` tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompFilter {
    pub name: String,
    pub time_range: Option<TimeRange>,
    pub child: Option<Box<CompFilter>>,
}

impl CompFilter {
    /// A filter level without range or child
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            time_range: None,
            child: None,
        }
    }

    #[must_use]
    pub const fn with_time_range(mut self, range: TimeRange) -> Self {
        self.time_range = Some(range);
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.child = Some(Box::new(child));
        self
    }

    /// Number of levels, this one included
    #[must_use]
    pub fn depth(&self) -> usize {
        1 + self.child.as_ref().map_or(0, |c| c.depth())
    }

    /// Resolve the tree into a listing request
    ///
    /// The component level (the child of VCALENDAR, or the root itself when a
    /// client omits VCALENDAR) selects events, tasks, or neither, and its
    /// time-range bounds the listing. Deeper levels do not narrow the result.
    #[must_use]
    pub fn to_query(&self) -> ResourceQuery {
        let component = if self.name.eq_ignore_ascii_case("VCALENDAR") {
            match &self.child {
                Some(child) => &**child,
                None => return ResourceQuery::all().with_range(self.time_range.unwrap_or_default()),
            }
        } else {
            self
        };

        let selection = if component.name.eq_ignore_ascii_case("VEVENT") {
            ResourceQuery::events()
        } else if component.name.eq_ignore_ascii_case("VTODO") {
            ResourceQuery::tasks()
        } else {
            ResourceQuery {
                include_events: false,
                include_tasks: false,
                ..ResourceQuery::all()
            }
        };
        selection.with_range(component.time_range.unwrap_or_default())
    }
}

/// Parse a REPORT body
pub fn parse_report(body: &str) -> Result<ReportRequest, ProtocolError> {
    if body.trim().is_empty() {
        return Err(ProtocolError::UnsupportedReport("empty body".to_string()));
    }
    let root = parse_document(body)?;

    if root.is(CALDAV_NS, "calendar-query") {
        let filter = match root.child(CALDAV_NS, "filter") {
            Some(filter) => filter
                .child(CALDAV_NS, "comp-filter")
                .map(|c| parse_comp_filter(c, 1))
                .transpose()?,
            None => None,
        };
        return Ok(ReportRequest::CalendarQuery {
            props: prop_request(&root),
            filter,
        });
    }

    if root.is(CALDAV_NS, "calendar-multiget") {
        let hrefs = root
            .children_named(DAV_NS, "href")
            .map(|h| h.text.trim().to_string())
            .filter(|h| !h.is_empty())
            .collect();
        return Ok(ReportRequest::Multiget {
            props: prop_request(&root),
            hrefs,
        });
    }

    Err(ProtocolError::UnsupportedReport(root.local))
}

fn parse_comp_filter(element: &XmlElement, depth: usize) -> Result<CompFilter, ProtocolError> {
    if depth > MAX_FILTER_DEPTH {
        return Err(ProtocolError::FilterTooDeep(MAX_FILTER_DEPTH));
    }
    let name = element
        .attribute("name")
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ProtocolError::UnsupportedReport("comp-filter without name".to_string()))?;

    let time_range = element
        .child(CALDAV_NS, "time-range")
        .map(parse_time_range)
        .transpose()?;

    let child = element
        .child(CALDAV_NS, "comp-filter")
        .map(|c| parse_comp_filter(c, depth + 1))
        .transpose()?
        .map(Box::new);

    Ok(CompFilter {
        name: name.to_string(),
        time_range,
        child,
    })
}

fn parse_time_range(element: &XmlElement) -> Result<TimeRange, ProtocolError> {
    let start = element.attribute("start").map(parse_utc).transpose()?;
    let end = element.attribute("end").map(parse_utc).transpose()?;
    TimeRange::new(start, end).map_err(|e| ProtocolError::InvalidTimeRange(e.to_string()))
}

fn parse_utc(value: &str) -> Result<DateTime<Utc>, ProtocolError> {
    NaiveDateTime::parse_from_str(value.trim(), TIME_RANGE_FORMAT)
        .map(|dt| dt.and_utc())
        .map_err(|_| ProtocolError::InvalidTimeRange(value.to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::properties::PropertyName;

    const QUERY_JANUARY: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
        <C:calendar-query xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
          <D:prop>
            <D:getetag/>
            <C:calendar-data/>
          </D:prop>
          <C:filter>
            <C:comp-filter name="VCALENDAR">
              <C:comp-filter name="VEVENT">
                <C:time-range start="20240101T000000Z" end="20240131T235959Z"/>
              </C:comp-filter>
            </C:comp-filter>
          </C:filter>
        </C:calendar-query>"#;

    #[test]
    fn parses_nested_time_range() {
        let ReportRequest::CalendarQuery { props, filter } = parse_report(QUERY_JANUARY).unwrap() else {
            panic!("expected calendar-query");
        };
        assert_eq!(
            props,
            PropRequest::Props(vec![PropertyName::GetETag, PropertyName::CalendarData])
        );
        let filter = filter.unwrap();
        assert_eq!(filter.name, "VCALENDAR");
        assert_eq!(filter.depth(), 2);

        let query = filter.to_query();
        assert!(query.include_events);
        assert!(!query.include_tasks);
        assert_eq!(
            query.range.start,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            query.range.end,
            Some(Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap())
        );
    }

    #[test]
    fn missing_bounds_stay_open() {
        let body = r#"<c:calendar-query xmlns:c="urn:ietf:params:xml:ns:caldav">
            <c:filter><c:comp-filter name="VCALENDAR"><c:comp-filter name="VTODO">
              <c:time-range start="20240101T000000Z"/>
            </c:comp-filter></c:comp-filter></c:filter></c:calendar-query>"#;
        let ReportRequest::CalendarQuery { filter, .. } = parse_report(body).unwrap() else {
            panic!("expected calendar-query");
        };
        let query = filter.unwrap().to_query();
        assert!(query.include_tasks);
        assert!(query.range.start.is_some());
        assert!(query.range.end.is_none());
    }

    #[test]
    fn no_filter_lists_everything() {
        let body = r#"<c:calendar-query xmlns:c="urn:ietf:params:xml:ns:caldav" xmlns:d="DAV:"><d:allprop/></c:calendar-query>"#;
        let ReportRequest::CalendarQuery { props, filter } = parse_report(body).unwrap() else {
            panic!("expected calendar-query");
        };
        assert_eq!(props, PropRequest::AllProp);
        assert!(filter.is_none());
    }

    #[test]
    fn vcalendar_only_filter_is_unbounded_and_unrestricted() {
        let query = CompFilter::named("VCALENDAR").to_query();
        assert_eq!(query, ResourceQuery::all());
    }

    #[test]
    fn unknown_component_matches_nothing() {
        let query = CompFilter::named("VCALENDAR")
            .with_child(CompFilter::named("VJOURNAL"))
            .to_query();
        assert!(!query.include_events);
        assert!(!query.include_tasks);
    }

    #[test]
    fn bare_component_filter_is_accepted() {
        let query = CompFilter::named("VTODO").to_query();
        assert_eq!(query, ResourceQuery::tasks());
    }

    #[test]
    fn rejects_too_deep_filters() {
        let body = r#"<c:calendar-query xmlns:c="urn:ietf:params:xml:ns:caldav"><c:filter>
            <c:comp-filter name="VCALENDAR"><c:comp-filter name="VEVENT">
              <c:comp-filter name="VALARM"><c:comp-filter name="X"/></c:comp-filter>
            </c:comp-filter></c:comp-filter></c:filter></c:calendar-query>"#;
        assert!(matches!(parse_report(body), Err(ProtocolError::FilterTooDeep(3))));
    }

    #[test]
    fn three_levels_are_fine() {
        let body = r#"<c:calendar-query xmlns:c="urn:ietf:params:xml:ns:caldav"><c:filter>
            <c:comp-filter name="VCALENDAR"><c:comp-filter name="VEVENT">
              <c:comp-filter name="VALARM"/>
            </c:comp-filter></c:comp-filter></c:filter></c:calendar-query>"#;
        let ReportRequest::CalendarQuery { filter, .. } = parse_report(body).unwrap() else {
            panic!("expected calendar-query");
        };
        assert_eq!(filter.unwrap().depth(), 3);
    }

    #[test]
    fn rejects_bad_time_format() {
        let body = r#"<c:calendar-query xmlns:c="urn:ietf:params:xml:ns:caldav"><c:filter>
            <c:comp-filter name="VCALENDAR"><c:comp-filter name="VEVENT">
              <c:time-range start="2024-01-01"/>
            </c:comp-filter></c:comp-filter></c:filter></c:calendar-query>"#;
        assert!(matches!(parse_report(body), Err(ProtocolError::InvalidTimeRange(_))));
    }

    #[test]
    fn parses_multiget_hrefs() {
        let body = r#"<c:calendar-multiget xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
            <d:prop><d:getetag/></d:prop>
            <d:href>/dav/calendars/u/c/a.ics</d:href>
            <d:href> /dav/calendars/u/c/b.ics </d:href>
        </c:calendar-multiget>"#;
        let request = parse_report(body).unwrap();
        assert_eq!(request.props(), &PropRequest::Props(vec![PropertyName::GetETag]));
        let ReportRequest::Multiget { hrefs, .. } = request else {
            panic!("expected multiget");
        };
        assert_eq!(hrefs, vec!["/dav/calendars/u/c/a.ics", "/dav/calendars/u/c/b.ics"]);
    }

    #[test]
    fn other_reports_are_unsupported() {
        let body = r#"<d:sync-collection xmlns:d="DAV:"><d:sync-token/></d:sync-collection>"#;
        assert!(matches!(
            parse_report(body),
            Err(ProtocolError::UnsupportedReport(name)) if name == "sync-collection"
        ));
        assert!(parse_report("").is_err());
        assert!(parse_report("<broken").is_err());
    }
}
