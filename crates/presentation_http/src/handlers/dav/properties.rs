//! Available property sets per location kind

use caldav_protocol::{
    DavPaths, ICALENDAR_CONTENT_TYPE, PropertyName, PropertySet, PropertyValue, ResourceTypeFlag,
};
use domain::{Calendar, CalendarResource, UserId};

/// Components every calendar collection accepts
const SUPPORTED_COMPONENTS: [&str; 2] = ["VEVENT", "VTODO"];

pub(super) fn principal_collection(paths: &DavPaths, user: &UserId) -> PropertySet {
    PropertySet::new()
        .with(
            PropertyName::ResourceType,
            PropertyValue::ResourceType(vec![ResourceTypeFlag::Collection]),
        )
        .with(
            PropertyName::CurrentUserPrincipal,
            PropertyValue::Href(paths.principal(user)),
        )
}

pub(super) fn principal(paths: &DavPaths, user: &UserId) -> PropertySet {
    PropertySet::new()
        .with(
            PropertyName::ResourceType,
            PropertyValue::ResourceType(vec![
                ResourceTypeFlag::Principal,
                ResourceTypeFlag::Collection,
            ]),
        )
        .with(PropertyName::DisplayName, PropertyValue::Text(user.to_string()))
        .with(
            PropertyName::CurrentUserPrincipal,
            PropertyValue::Href(paths.principal(user)),
        )
        .with(
            PropertyName::CalendarHomeSet,
            PropertyValue::Href(paths.calendar_home(user)),
        )
}

pub(super) fn calendar_home(paths: &DavPaths, user: &UserId) -> PropertySet {
    PropertySet::new()
        .with(
            PropertyName::ResourceType,
            PropertyValue::ResourceType(vec![ResourceTypeFlag::Collection]),
        )
        .with(PropertyName::DisplayName, PropertyValue::Text("Calendars".to_string()))
        .with(
            PropertyName::CurrentUserPrincipal,
            PropertyValue::Href(paths.principal(user)),
        )
}

pub(super) fn calendar_collection(paths: &DavPaths, calendar: &Calendar) -> PropertySet {
    let mut set = PropertySet::new()
        .with(
            PropertyName::ResourceType,
            PropertyValue::ResourceType(vec![
                ResourceTypeFlag::Collection,
                ResourceTypeFlag::Calendar,
            ]),
        )
        .with(PropertyName::DisplayName, PropertyValue::Text(calendar.name.clone()))
        .with(
            PropertyName::SupportedCalendarComponentSet,
            PropertyValue::ComponentSet(SUPPORTED_COMPONENTS.map(String::from).to_vec()),
        )
        .with(
            PropertyName::CurrentUserPrincipal,
            PropertyValue::Href(paths.principal(&calendar.user_id)),
        );
    if let Some(description) = &calendar.description {
        set.insert(
            PropertyName::CalendarDescription,
            PropertyValue::Text(description.clone()),
        );
    }
    set
}

/// Quoted entity tag as sent in `ETag` headers and `getetag`
pub(super) fn quoted_etag(etag: &str) -> String {
    format!("\"{etag}\"")
}

/// Properties of one `.ics` resource
///
/// `encoded` is the resource's iCalendar body. It sizes `getcontentlength`
/// and becomes `calendar-data` when `with_data` is set.
pub(super) fn calendar_resource(
    resource: &CalendarResource,
    encoded: &str,
    with_data: bool,
) -> PropertySet {
    let mut set = PropertySet::new()
        .with(
            PropertyName::GetContentType,
            PropertyValue::Text(ICALENDAR_CONTENT_TYPE.to_string()),
        )
        .with(
            PropertyName::GetContentLength,
            PropertyValue::Text(encoded.len().to_string()),
        )
        .with(PropertyName::ResourceType, PropertyValue::ResourceType(Vec::new()));
    if let Some(etag) = resource.etag() {
        set.insert(PropertyName::GetETag, PropertyValue::Text(quoted_etag(etag)));
    }
    if with_data {
        set.insert(PropertyName::CalendarData, PropertyValue::Text(encoded.to_string()));
    }
    set
}
