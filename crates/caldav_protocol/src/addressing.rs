//! DAV resource addressing
//!
//! Maps the five URI shapes of the server onto entity identifiers and back:
//!
//! | Shape | Path |
//! |---|---|
//! | principal collection | `{base}/principals/` |
//! | principal | `{base}/principals/{user}/` |
//! | calendar home | `{base}/calendars/{user}/` |
//! | calendar collection | `{base}/calendars/{user}/{calendar}/` |
//! | calendar resource | `{base}/calendars/{user}/{calendar}/{uid}.ics` |

use domain::{CalendarId, IcalUid, UserId};

use crate::error::ProtocolError;

/// Suffix every resource name carries
pub const RESOURCE_SUFFIX: &str = ".ics";

/// A parsed DAV location
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DavLocation {
    Principals,
    Principal(UserId),
    CalendarHome(UserId),
    Calendar(UserId, CalendarId),
    Resource(UserId, CalendarId, IcalUid),
}

/// Builds and parses hrefs below a fixed base path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DavPaths {
    base: String,
}

impl Default for DavPaths {
    fn default() -> Self {
        Self::new("/dav")
    }
}

impl DavPaths {
    /// Create paths rooted at `base`; `""` and `"/"` mount at the server root
    #[must_use]
    pub fn new(base: &str) -> Self {
        let trimmed = base.trim().trim_matches('/');
        let base = if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        };
        Self { base }
    }

    /// Normalised base path without trailing slash
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    #[must_use]
    pub fn principals(&self) -> String {
        format!("{}/principals/", self.base)
    }

    #[must_use]
    pub fn principal(&self, user_id: &UserId) -> String {
        format!("{}/principals/{user_id}/", self.base)
    }

    #[must_use]
    pub fn calendar_home(&self, user_id: &UserId) -> String {
        format!("{}/calendars/{user_id}/", self.base)
    }

    #[must_use]
    pub fn calendar(&self, user_id: &UserId, calendar_id: &CalendarId) -> String {
        format!("{}/calendars/{user_id}/{calendar_id}/", self.base)
    }

    /// Href of a resource: the calendar href followed by `{uid}.ics`
    #[must_use]
    pub fn resource(&self, user_id: &UserId, calendar_id: &CalendarId, uid: &IcalUid) -> String {
        format!(
            "{}{}{RESOURCE_SUFFIX}",
            self.calendar(user_id, calendar_id),
            encode_segment(uid.as_str())
        )
    }

    /// Parse an href sent by a client, absolute or path-only
    ///
    /// Returns `None` for anything outside the address space, including
    /// resource names without the `.ics` suffix.
    #[must_use]
    pub fn parse_href(&self, href: &str) -> Option<DavLocation> {
        let path = strip_authority(href.trim());
        let rest = path.strip_prefix(self.base.as_str())?;
        let segments: Vec<String> = rest
            .split('/')
            .filter(|s| !s.is_empty())
            .map(decode_segment)
            .collect::<Option<_>>()?;

        match segments.as_slice() {
            [p] if p == "principals" => Some(DavLocation::Principals),
            [p, user] if p == "principals" => UserId::parse(user).ok().map(DavLocation::Principal),
            [c, user] if c == "calendars" => {
                UserId::parse(user).ok().map(DavLocation::CalendarHome)
            },
            [c, user, calendar] if c == "calendars" => Some(DavLocation::Calendar(
                UserId::parse(user).ok()?,
                CalendarId::parse(calendar).ok()?,
            )),
            [c, user, calendar, name] if c == "calendars" => Some(DavLocation::Resource(
                UserId::parse(user).ok()?,
                CalendarId::parse(calendar).ok()?,
                resource_uid(name)?,
            )),
            _ => None,
        }
    }
}

/// Parse the `{user}` path segment
pub fn parse_user_segment(segment: &str) -> Result<UserId, ProtocolError> {
    UserId::parse(segment).map_err(|_| ProtocolError::InvalidIdentifier {
        kind: "user",
        value: segment.to_string(),
    })
}

/// Parse the `{calendar}` path segment
pub fn parse_calendar_segment(segment: &str) -> Result<CalendarId, ProtocolError> {
    CalendarId::parse(segment).map_err(|_| ProtocolError::InvalidIdentifier {
        kind: "calendar",
        value: segment.to_string(),
    })
}

/// UID named by a resource segment, or `None` when it is not a `.ics` name
#[must_use]
pub fn resource_uid(name: &str) -> Option<IcalUid> {
    let stem = name.strip_suffix(RESOURCE_SUFFIX)?;
    IcalUid::new(stem).ok()
}

/// `Depth` request header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    Zero,
    One,
    Infinity,
}

impl Depth {
    /// Parse the header value; an absent header means infinity
    pub fn parse(header: Option<&str>) -> Result<Self, ProtocolError> {
        match header.map(str::trim) {
            None => Ok(Self::Infinity),
            Some("0") => Ok(Self::Zero),
            Some("1") => Ok(Self::One),
            Some(v) if v.eq_ignore_ascii_case("infinity") => Ok(Self::Infinity),
            Some(other) => Err(ProtocolError::InvalidDepth(other.to_string())),
        }
    }

    /// Whether members of a collection are listed alongside it
    #[must_use]
    pub const fn includes_members(self) -> bool {
        !matches!(self, Self::Zero)
    }
}

fn strip_authority(href: &str) -> &str {
    match href.find("://") {
        Some(scheme_end) => {
            let after = &href[scheme_end + 3..];
            after.find('/').map_or("/", |slash| &after[slash..])
        },
        None => href,
    }
}

/// Percent-encode characters that cannot appear raw in a path segment
fn encode_segment(segment: &str) -> String {
    let mut result = String::with_capacity(segment.len());
    for c in segment.chars() {
        match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' | '~' | '@' | '+' | '=' | ':' => {
                result.push(c);
            },
            _ => {
                let mut bytes = [0u8; 4];
                for b in c.encode_utf8(&mut bytes).bytes() {
                    result.push_str(&format!("%{b:02X}"));
                }
            },
        }
    }
    result
}

/// Decode `%XX` escapes; `None` on malformed escapes or invalid UTF-8
fn decode_segment(segment: &str) -> Option<String> {
    let bytes = segment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = segment.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}
