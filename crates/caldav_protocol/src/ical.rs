//! iCalendar codec
//!
//! Encodes events as VEVENT and tasks as VTODO, and decodes inbound
//! calendar streams into [`IncomingObject`]s. Times are written in UTC.
//! Floating and TZID-qualified times are read as UTC.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use domain::{
    CalendarResource, IncomingEvent, IncomingObject, IncomingTodo, ScheduledEvent, Task,
    TaskStatus,
};
use icalendar::{CalendarComponent, Component, parser};
use tracing::debug;

use crate::error::ProtocolError;

/// Longest content line in octets, excluding the CRLF
const MAX_LINE_OCTETS: usize = 75;

const DATETIME_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const FLOATING_FORMAT: &str = "%Y%m%dT%H%M%S";
const DATE_FORMAT: &str = "%Y%m%d";

/// Encoder/decoder for `text/calendar` bodies
#[derive(Debug, Clone)]
pub struct ICalendarCodec {
    product_id: String,
}

impl Default for ICalendarCodec {
    fn default() -> Self {
        Self::new("-//taskdav//CalDAV Server//EN")
    }
}

impl ICalendarCodec {
    /// Codec that stamps `PRODID` with `product_id`
    #[must_use]
    pub fn new(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
        }
    }

    #[must_use]
    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    /// One resource wrapped in its own VCALENDAR
    #[must_use]
    pub fn encode_resource(&self, resource: &CalendarResource) -> String {
        let mut ical = String::new();
        self.open_calendar(&mut ical, None);
        write_component(&mut ical, resource);
        close_calendar(&mut ical);
        ical
    }

    /// Every resource of a calendar under one VCALENDAR
    #[must_use]
    pub fn encode_calendar(&self, name: &str, resources: &[CalendarResource]) -> String {
        let mut ical = String::new();
        self.open_calendar(&mut ical, Some(name));
        for resource in resources {
            write_component(&mut ical, resource);
        }
        close_calendar(&mut ical);
        ical
    }

    /// Decode every VEVENT and VTODO of a calendar stream
    ///
    /// The stream may hold several VCALENDAR objects back to back. Other
    /// component types are skipped. Missing fields decode to `None`, but a
    /// date that cannot be read is an error.
    pub fn decode(&self, data: &str) -> Result<Vec<IncomingObject>, ProtocolError> {
        let unfolded = parser::unfold(data);
        let blocks = calendar_blocks(&unfolded)?;

        let mut objects = Vec::new();
        for block in blocks {
            let parsed = parser::read_calendar(&block)
                .map_err(|e| ProtocolError::Calendar(format!("iCalendar parse error: {e}")))?;
            let mut texts = component_texts(&block).into_iter();

            for component in parsed.components {
                match CalendarComponent::from(component) {
                    CalendarComponent::Event(event) => {
                        let text = texts.next().unwrap_or_default();
                        objects.push(IncomingObject::Event(decode_event(&event, &text)?));
                    },
                    CalendarComponent::Todo(todo) => {
                        let text = texts.next().unwrap_or_default();
                        objects.push(IncomingObject::Todo(decode_todo(&todo, &text)?));
                    },
                    _ => debug!("Skipping unsupported calendar component"),
                }
            }
        }
        Ok(objects)
    }

    fn open_calendar(&self, ical: &mut String, name: Option<&str>) {
        ical.push_str("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n");
        content_line(ical, "PRODID", &self.product_id);
        ical.push_str("CALSCALE:GREGORIAN\r\n");
        if let Some(name) = name {
            content_line(ical, "X-WR-CALNAME", &escape_text(name));
        }
    }
}

fn close_calendar(ical: &mut String) {
    ical.push_str("END:VCALENDAR\r\n");
}

fn write_component(ical: &mut String, resource: &CalendarResource) {
    match resource {
        CalendarResource::Event(event) => write_event(ical, event),
        CalendarResource::Task(task) => write_todo(ical, task),
    }
}

fn write_event(ical: &mut String, event: &ScheduledEvent) {
    ical.push_str("BEGIN:VEVENT\r\n");
    content_line(ical, "UID", &escape_text(event.ical_uid.as_str()));
    content_line(ical, "DTSTAMP", &format_datetime(event.updated_at));
    content_line(ical, "SUMMARY", &escape_text(&event.title));
    if let Some(description) = &event.description {
        content_line(ical, "DESCRIPTION", &escape_text(description));
    }
    if let Some(location) = &event.location {
        content_line(ical, "LOCATION", &escape_text(location));
    }
    if event.is_all_day {
        content_line(ical, "DTSTART;VALUE=DATE", &format_date(event.start_at));
        content_line(ical, "DTEND;VALUE=DATE", &format_date(event.end_at));
    } else {
        content_line(ical, "DTSTART", &format_datetime(event.start_at));
        content_line(ical, "DTEND", &format_datetime(event.end_at));
    }
    content_line(ical, "STATUS", &escape_text(&event.status));
    content_line(ical, "SEQUENCE", &event.sequence.to_string());
    ical.push_str("END:VEVENT\r\n");
}

fn write_todo(ical: &mut String, task: &Task) {
    ical.push_str("BEGIN:VTODO\r\n");
    content_line(ical, "UID", &escape_text(task.ical_uid.as_str()));
    content_line(ical, "DTSTAMP", &format_datetime(task.updated_at));
    content_line(ical, "SUMMARY", &escape_text(&task.title));
    if let Some(note) = &task.note {
        content_line(ical, "DESCRIPTION", &escape_text(note));
    }
    if let Some(due) = task.due_at {
        content_line(ical, "DUE", &format_datetime(due));
    }
    content_line(ical, "STATUS", task.status.to_ical());
    if let Some(completed) = task.completed_at {
        content_line(ical, "COMPLETED", &format_datetime(completed));
    }
    if task.priority > 0 {
        content_line(ical, "PRIORITY", &task.priority.to_string());
    }
    ical.push_str("END:VTODO\r\n");
}

fn decode_event(
    event: &icalendar::Event,
    text: &ComponentText,
) -> Result<IncomingEvent, ProtocolError> {
    let start = event
        .property_value("DTSTART")
        .map(|v| parse_time("DTSTART", v))
        .transpose()?;
    let end = event
        .property_value("DTEND")
        .map(|v| parse_time("DTEND", v))
        .transpose()?;

    Ok(IncomingEvent {
        uid: text.get("UID"),
        summary: text.get("SUMMARY"),
        description: text.get("DESCRIPTION"),
        location: text.get("LOCATION"),
        start: start.map(|(at, _)| at),
        end: end.map(|(at, _)| at),
        is_all_day: start.is_some_and(|(_, date_only)| date_only),
        status: text.get("STATUS"),
    })
}

fn decode_todo(
    todo: &icalendar::Todo,
    text: &ComponentText,
) -> Result<IncomingTodo, ProtocolError> {
    let due = todo
        .property_value("DUE")
        .map(|v| parse_time("DUE", v))
        .transpose()?;
    let completed = todo
        .property_value("COMPLETED")
        .map(|v| parse_time("COMPLETED", v))
        .transpose()?;
    let priority = todo
        .property_value("PRIORITY")
        .and_then(|v| v.trim().parse::<i32>().ok())
        .filter(|p| (0..=9).contains(p));

    Ok(IncomingTodo {
        uid: text.get("UID"),
        summary: text.get("SUMMARY"),
        description: text.get("DESCRIPTION"),
        due: due.map(|(at, _)| at),
        status: text.get("STATUS").as_deref().map(TaskStatus::from_ical),
        completed: completed.map(|(at, _)| at),
        priority,
    })
}

/// Still-escaped TEXT values of one VEVENT or VTODO
///
/// The parser unescapes TEXT with chained replacements, which turns an
/// escaped backslash followed by `n` into a newline. TEXT properties are
/// therefore read from the content lines and unescaped once here.
#[derive(Debug, Default)]
struct ComponentText {
    raw: HashMap<String, String>,
}

impl ComponentText {
    fn get(&self, name: &str) -> Option<String> {
        self.raw
            .get(name)
            .map(String::as_str)
            .map(unescape_text)
            .filter(|v| !v.is_empty())
    }
}

const TEXT_PROPERTIES: [&str; 5] = ["UID", "SUMMARY", "DESCRIPTION", "LOCATION", "STATUS"];

/// TEXT values of each top-level VEVENT and VTODO of one VCALENDAR, in order
///
/// Properties of nested components such as VALARM are not collected.
fn component_texts(block: &str) -> Vec<ComponentText> {
    let mut texts = Vec::new();
    let mut current: Option<ComponentText> = None;
    let mut depth = 0usize;

    for line in block.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(kind) = line.strip_prefix("BEGIN:") {
            depth += 1;
            if depth == 2 && matches!(kind, "VEVENT" | "VTODO") {
                current = Some(ComponentText::default());
            }
            continue;
        }
        if line.starts_with("END:") {
            if depth == 2 {
                if let Some(done) = current.take() {
                    texts.push(done);
                }
            }
            depth = depth.saturating_sub(1);
            continue;
        }
        if depth != 2 {
            continue;
        }
        if let (Some(text), Some((name, value))) = (current.as_mut(), split_content_line(line)) {
            if TEXT_PROPERTIES.contains(&name) {
                text.raw.insert(name.to_string(), value.to_string());
            }
        }
    }
    texts
}

/// Split `NAME;PARAM=...:value` at the first colon outside a quoted parameter
fn split_content_line(line: &str) -> Option<(&str, &str)> {
    let mut quoted = false;
    for (idx, ch) in line.char_indices() {
        match ch {
            '"' => quoted = !quoted,
            ':' if !quoted => {
                let head = &line[..idx];
                let name = head.split_once(';').map_or(head, |(name, _)| name);
                return Some((name.trim(), &line[idx + 1..]));
            },
            _ => {},
        }
    }
    None
}

/// Split an unfolded stream into its VCALENDAR objects
fn calendar_blocks(unfolded: &str) -> Result<Vec<String>, ProtocolError> {
    let mut blocks = Vec::new();
    let mut current: Option<String> = None;

    for line in unfolded.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("BEGIN:VCALENDAR") {
            if current.is_some() {
                return Err(ProtocolError::Calendar("nested VCALENDAR".to_string()));
            }
            current = Some(String::new());
        }
        let Some(block) = current.as_mut() else {
            return Err(ProtocolError::Calendar(format!(
                "content outside VCALENDAR: {}",
                truncate(line)
            )));
        };
        block.push_str(line);
        block.push_str("\r\n");
        if line.eq_ignore_ascii_case("END:VCALENDAR") {
            if let Some(done) = current.take() {
                blocks.push(done);
            }
        }
    }

    if current.is_some() {
        return Err(ProtocolError::Calendar("unterminated VCALENDAR".to_string()));
    }
    Ok(blocks)
}

fn truncate(line: &str) -> &str {
    line.char_indices()
        .nth(40)
        .map_or(line, |(idx, _)| &line[..idx])
}

/// Parse a DATE or DATE-TIME value; the flag is set for date-only values
fn parse_time(property: &str, value: &str) -> Result<(DateTime<Utc>, bool), ProtocolError> {
    let value = value.trim();
    let invalid = || ProtocolError::Calendar(format!("invalid {property} value: {value}"));

    if value.len() == 8 {
        let date = NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| invalid())?;
        let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(invalid)?;
        return Ok((Utc.from_utc_datetime(&midnight), true));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, DATETIME_FORMAT) {
        return Ok((Utc.from_utc_datetime(&dt), false));
    }
    NaiveDateTime::parse_from_str(value, FLOATING_FORMAT)
        .map(|dt| (Utc.from_utc_datetime(&dt), false))
        .map_err(|_| invalid())
}

fn format_datetime(at: DateTime<Utc>) -> String {
    at.format(DATETIME_FORMAT).to_string()
}

fn format_date(at: DateTime<Utc>) -> String {
    at.format(DATE_FORMAT).to_string()
}

/// Escape a TEXT value
pub(crate) fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {},
            other => out.push(other),
        }
    }
    out
}

/// Reverse of [`escape_text`]; unknown escapes keep the escaped character
pub(crate) fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Append `NAME:value` folded at 75 octets
fn content_line(ical: &mut String, name: &str, value: &str) {
    let line = format!("{name}:{value}");
    let mut budget = MAX_LINE_OCTETS;
    let mut used = 0;
    for ch in line.chars() {
        let len = ch.len_utf8();
        if used + len > budget {
            ical.push_str("\r\n ");
            used = 0;
            // continuation lines start with a space
            budget = MAX_LINE_OCTETS - 1;
        }
        ical.push(ch);
        used += len;
    }
    ical.push_str("\r\n");
}
