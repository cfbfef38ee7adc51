//! Property negotiation
//!
//! Each resource advertises the properties it has (the available set). A
//! PROPFIND or REPORT names the properties the client wants (the requested
//! set). Negotiation splits the request into a `200 OK` group of requested
//! properties that exist and a `404 Not Found` group of those that do not.
//! Unknown properties are never an error.

use crate::{CALDAV_NS, DAV_NS};

/// Identity of a DAV property: namespace plus local name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyName {
    ResourceType,
    DisplayName,
    CurrentUserPrincipal,
    CalendarHomeSet,
    SupportedCalendarComponentSet,
    GetContentType,
    GetETag,
    GetContentLength,
    CalendarData,
    CalendarDescription,
    /// Anything else a client may probe for
    Other { namespace: String, name: String },
}

impl PropertyName {
    /// Map a namespace-qualified element name onto a property
    #[must_use]
    pub fn from_qualified(namespace: &str, name: &str) -> Self {
        match (namespace, name) {
            (DAV_NS, "resourcetype") => Self::ResourceType,
            (DAV_NS, "displayname") => Self::DisplayName,
            (DAV_NS, "current-user-principal") => Self::CurrentUserPrincipal,
            (DAV_NS, "getcontenttype") => Self::GetContentType,
            (DAV_NS, "getetag") => Self::GetETag,
            (DAV_NS, "getcontentlength") => Self::GetContentLength,
            (CALDAV_NS, "calendar-home-set") => Self::CalendarHomeSet,
            (CALDAV_NS, "supported-calendar-component-set") => Self::SupportedCalendarComponentSet,
            (CALDAV_NS, "calendar-data") => Self::CalendarData,
            (CALDAV_NS, "calendar-description") => Self::CalendarDescription,
            _ => Self::Other {
                namespace: namespace.to_string(),
                name: name.to_string(),
            },
        }
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        match self {
            Self::ResourceType
            | Self::DisplayName
            | Self::CurrentUserPrincipal
            | Self::GetContentType
            | Self::GetETag
            | Self::GetContentLength => DAV_NS,
            Self::CalendarHomeSet
            | Self::SupportedCalendarComponentSet
            | Self::CalendarData
            | Self::CalendarDescription => CALDAV_NS,
            Self::Other { namespace, .. } => namespace,
        }
    }

    #[must_use]
    pub fn local_name(&self) -> &str {
        match self {
            Self::ResourceType => "resourcetype",
            Self::DisplayName => "displayname",
            Self::CurrentUserPrincipal => "current-user-principal",
            Self::CalendarHomeSet => "calendar-home-set",
            Self::SupportedCalendarComponentSet => "supported-calendar-component-set",
            Self::GetContentType => "getcontenttype",
            Self::GetETag => "getetag",
            Self::GetContentLength => "getcontentlength",
            Self::CalendarData => "calendar-data",
            Self::CalendarDescription => "calendar-description",
            Self::Other { name, .. } => name,
        }
    }
}

/// Flags rendered inside `<resourcetype>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceTypeFlag {
    Collection,
    Calendar,
    Principal,
}

/// Value of an available property
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Text(String),
    /// A single `<href>` child
    Href(String),
    ResourceType(Vec<ResourceTypeFlag>),
    /// `<comp name="..."/>` children
    ComponentSet(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: PropertyName,
    pub value: PropertyValue,
}

/// Properties available on one resource, in rendering order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertySet {
    properties: Vec<Property>,
}

impl PropertySet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a property
    #[must_use]
    pub fn with(mut self, name: PropertyName, value: PropertyValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: PropertyName, value: PropertyValue) {
        if let Some(existing) = self.properties.iter_mut().find(|p| p.name == name) {
            existing.value = value;
        } else {
            self.properties.push(Property { name, value });
        }
    }

    #[must_use]
    pub fn get(&self, name: &PropertyName) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|p| &p.name == name)
            .map(|p| &p.value)
    }

    #[must_use]
    pub fn contains(&self, name: &PropertyName) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// What a client asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropRequest {
    /// Every available property with its value
    AllProp,
    /// Every available property name, without values
    PropName,
    /// Exactly these properties
    Props(Vec<PropertyName>),
}

/// Status line of a propstat or response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DavStatus {
    Ok,
    NotFound,
}

impl DavStatus {
    #[must_use]
    pub const fn status_line(self) -> &'static str {
        match self {
            Self::Ok => "HTTP/1.1 200 OK",
            Self::NotFound => "HTTP/1.1 404 Not Found",
        }
    }
}

/// One property group with a shared status
///
/// `None` values render as empty placeholder elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropStat {
    pub status: DavStatus,
    pub properties: Vec<(PropertyName, Option<PropertyValue>)>,
}

impl PropStat {
    /// Property names in this group, in order
    pub fn names(&self) -> impl Iterator<Item = &PropertyName> {
        self.properties.iter().map(|(name, _)| name)
    }
}

/// Split a request against the available properties of one resource
///
/// With no explicit property list the result is exactly one `200 OK` group.
/// Otherwise the found group holds the requested properties that are
/// available and the not-found group holds the rest; empty groups are
/// omitted. Duplicate requested names are collapsed.
#[must_use]
pub fn negotiate(request: &PropRequest, available: &PropertySet) -> Vec<PropStat> {
    let requested = match request {
        PropRequest::AllProp => return vec![all_properties(available)],
        PropRequest::Props(names) if names.is_empty() => return vec![all_properties(available)],
        PropRequest::PropName => {
            return vec![PropStat {
                status: DavStatus::Ok,
                properties: available.iter().map(|p| (p.name.clone(), None)).collect(),
            }];
        },
        PropRequest::Props(names) => names,
    };

    let mut found = Vec::new();
    let mut missing = Vec::new();
    let mut seen: Vec<&PropertyName> = Vec::with_capacity(requested.len());

    for name in requested {
        if seen.contains(&name) {
            continue;
        }
        seen.push(name);
        match available.get(name) {
            Some(value) => found.push((name.clone(), Some(value.clone()))),
            None => missing.push((name.clone(), None)),
        }
    }

    let mut groups = Vec::with_capacity(2);
    if !found.is_empty() {
        groups.push(PropStat {
            status: DavStatus::Ok,
            properties: found,
        });
    }
    if !missing.is_empty() {
        groups.push(PropStat {
            status: DavStatus::NotFound,
            properties: missing,
        });
    }
    groups
}

fn all_properties(available: &PropertySet) -> PropStat {
    PropStat {
        status: DavStatus::Ok,
        properties: available
            .iter()
            .map(|p| (p.name.clone(), Some(p.value.clone())))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn available() -> PropertySet {
        PropertySet::new()
            .with(PropertyName::DisplayName, PropertyValue::Text("Work".into()))
            .with(
                PropertyName::ResourceType,
                PropertyValue::ResourceType(vec![ResourceTypeFlag::Collection]),
            )
    }

    #[test]
    fn allprop_returns_single_found_group() {
        let groups = negotiate(&PropRequest::AllProp, &available());
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].status, DavStatus::Ok);
        assert_eq!(groups[0].properties.len(), 2);
    }

    #[test]
    fn empty_prop_list_behaves_like_allprop() {
        let groups = negotiate(&PropRequest::Props(vec![]), &available());
        assert_eq!(groups, negotiate(&PropRequest::AllProp, &available()));
    }

    #[test]
    fn splits_found_and_missing() {
        let request = PropRequest::Props(vec![
            PropertyName::DisplayName,
            PropertyName::GetETag,
            PropertyName::from_qualified("http://apple.com/ns/ical/", "calendar-color"),
        ]);
        let groups = negotiate(&request, &available());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].status, DavStatus::Ok);
        assert_eq!(groups[0].names().collect::<Vec<_>>(), vec![&PropertyName::DisplayName]);
        assert_eq!(groups[1].status, DavStatus::NotFound);
        assert_eq!(groups[1].properties.len(), 2);
        assert!(groups[1].properties.iter().all(|(_, v)| v.is_none()));
    }

    #[test]
    fn only_missing_yields_only_not_found_group() {
        let groups = negotiate(&PropRequest::Props(vec![PropertyName::CalendarData]), &available());
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].status, DavStatus::NotFound);
    }

    #[test]
    fn duplicates_are_collapsed() {
        let request = PropRequest::Props(vec![PropertyName::DisplayName, PropertyName::DisplayName]);
        let groups = negotiate(&request, &available());
        assert_eq!(groups[0].properties.len(), 1);
    }

    #[test]
    fn propname_lists_names_without_values() {
        let groups = negotiate(&PropRequest::PropName, &available());
        assert_eq!(groups.len(), 1);
        assert!(groups[0].properties.iter().all(|(_, v)| v.is_none()));
        assert_eq!(groups[0].properties.len(), 2);
    }

    #[test]
    fn qualified_names_round_trip() {
        for name in [
            PropertyName::ResourceType,
            PropertyName::DisplayName,
            PropertyName::CurrentUserPrincipal,
            PropertyName::CalendarHomeSet,
            PropertyName::SupportedCalendarComponentSet,
            PropertyName::GetContentType,
            PropertyName::GetETag,
            PropertyName::GetContentLength,
            PropertyName::CalendarData,
            PropertyName::CalendarDescription,
        ] {
            assert_eq!(PropertyName::from_qualified(name.namespace(), name.local_name()), name);
        }
    }

    #[test]
    fn namespace_distinguishes_properties() {
        let wrong_ns = PropertyName::from_qualified(CALDAV_NS, "displayname");
        assert!(matches!(wrong_ns, PropertyName::Other { .. }));
    }

    #[test]
    fn insert_replaces_existing_value() {
        let mut set = available();
        set.insert(PropertyName::DisplayName, PropertyValue::Text("Home".into()));
        assert_eq!(set.len(), 2);
        assert_eq!(
            set.get(&PropertyName::DisplayName),
            Some(&PropertyValue::Text("Home".into()))
        );
    }
}
