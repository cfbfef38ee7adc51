//! Property-based tests for the CalDAV protocol layer

use std::collections::BTreeSet;

use caldav_protocol::{
    DavLocation, DavPaths, DavStatus, Depth, ICalendarCodec, PropRequest, PropertyName,
    PropertySet, PropertyValue, negotiate, parse_propfind, parse_report,
};
use chrono::{DateTime, Duration, Utc};
use domain::{
    CalendarId, IcalUid, IncomingObject, ProjectId, ScheduledEvent, Task, TaskStatus, UserId,
};
use proptest::prelude::*;

const KNOWN: [PropertyName; 10] = [
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
];

fn property_name() -> impl Strategy<Value = PropertyName> {
    prop_oneof![
        (0..KNOWN.len()).prop_map(|i| KNOWN[i].clone()),
        "[a-z]{1,8}".prop_map(|name| PropertyName::Other {
            namespace: "http://example.com/ns/".to_string(),
            name,
        }),
    ]
}

fn available_set() -> impl Strategy<Value = PropertySet> {
    prop::collection::vec(property_name(), 0..8).prop_map(|names| {
        let mut set = PropertySet::new();
        for name in names {
            let value = PropertyValue::Text(name.local_name().to_string());
            set.insert(name, value);
        }
        set
    })
}

// ============================================================================
// Property negotiation
// ============================================================================

mod negotiation_tests {
    use super::*;

    proptest! {
        #[test]
        fn found_is_intersection_and_missing_is_difference(
            requested in prop::collection::vec(property_name(), 1..10),
            available in available_set(),
        ) {
            let groups = negotiate(&PropRequest::Props(requested.clone()), &available);

            let requested: BTreeSet<PropertyName> = requested.into_iter().collect();
            let offered: BTreeSet<PropertyName> =
                available.iter().map(|p| p.name.clone()).collect();

            let found: BTreeSet<PropertyName> = groups
                .iter()
                .filter(|g| g.status == DavStatus::Ok)
                .flat_map(|g| g.names().cloned())
                .collect();
            let missing: BTreeSet<PropertyName> = groups
                .iter()
                .filter(|g| g.status == DavStatus::NotFound)
                .flat_map(|g| g.names().cloned())
                .collect();

            let expected_found: BTreeSet<_> = requested.intersection(&offered).cloned().collect();
            let expected_missing: BTreeSet<_> = requested.difference(&offered).cloned().collect();
            prop_assert_eq!(found, expected_found);
            prop_assert_eq!(missing, expected_missing);
            prop_assert!(groups.len() <= 2);
            prop_assert!(groups.iter().all(|g| !g.properties.is_empty()));
        }

        #[test]
        fn missing_properties_carry_no_value(
            requested in prop::collection::vec(property_name(), 1..10),
            available in available_set(),
        ) {
            for group in negotiate(&PropRequest::Props(requested), &available) {
                for (_, value) in &group.properties {
                    prop_assert_eq!(value.is_some(), group.status == DavStatus::Ok);
                }
            }
        }

        #[test]
        fn allprop_returns_one_group_equal_to_available(available in available_set()) {
            for request in [PropRequest::AllProp, PropRequest::Props(Vec::new())] {
                let groups = negotiate(&request, &available);
                prop_assert_eq!(groups.len(), 1);
                prop_assert_eq!(groups[0].status, DavStatus::Ok);
                let names: Vec<&PropertyName> = groups[0].names().collect();
                let offered: Vec<&PropertyName> = available.iter().map(|p| &p.name).collect();
                prop_assert_eq!(names, offered);
            }
        }
    }
}

// ============================================================================
// Request parsing
// ============================================================================

mod parsing_tests {
    use super::*;

    proptest! {
        #[test]
        fn propfind_parsing_never_fails(body in prop::collection::vec(any::<u8>(), 0..256)) {
            let _ = parse_propfind(&body);
        }

        #[test]
        fn report_parsing_never_panics(body in ".{0,256}") {
            let _ = parse_report(&body);
        }

        #[test]
        fn depth_accepts_only_known_values(value in "[a-z0-9]{0,10}") {
            let parsed = Depth::parse(Some(&value));
            let known = matches!(value.as_str(), "0" | "1" | "infinity");
            prop_assert_eq!(parsed.is_ok(), known);
        }
    }
}

// ============================================================================
// Addressing
// ============================================================================

mod addressing_tests {
    use super::*;

    proptest! {
        #[test]
        fn resource_hrefs_parse_back(uid in "[A-Za-z0-9@._+ -]{1,40}", base in "(/[a-z]{1,6}){0,2}") {
            prop_assume!(!uid.trim().is_empty());
            let paths = DavPaths::new(&base);
            let user = UserId::new();
            let calendar = CalendarId::new();
            let uid = IcalUid::new(uid).unwrap();

            let href = paths.resource(&user, &calendar, &uid);
            prop_assert!(href.ends_with(".ics"));
            prop_assert_eq!(
                paths.parse_href(&href),
                Some(DavLocation::Resource(user, calendar, uid))
            );
        }

        #[test]
        fn names_without_suffix_are_outside_the_address_space(name in "[a-z0-9]{1,12}") {
            let paths = DavPaths::default();
            let href = format!(
                "{}{name}",
                paths.calendar(&UserId::new(), &CalendarId::new())
            );
            prop_assert_eq!(paths.parse_href(&href), None);
        }
    }
}

// ============================================================================
// iCalendar codec
// ============================================================================

mod codec_tests {
    use super::*;

    /// TEXT with every character that needs escaping, plus some multibyte ones
    fn text() -> impl Strategy<Value = String> {
        r#"[A-Za-z0-9 ,;:"\\\né€]{1,120}"#
    }

    fn instant() -> impl Strategy<Value = DateTime<Utc>> {
        (0i64..4_000_000_000).prop_map(|secs| DateTime::from_timestamp(secs, 0).unwrap())
    }

    fn task_status() -> impl Strategy<Value = TaskStatus> {
        (0..TaskStatus::ALL.len()).prop_map(|i| TaskStatus::ALL[i])
    }

    proptest! {
        #[test]
        fn event_text_and_times_survive_encoding(
            title in text(),
            description in prop::option::of(text()),
            location in prop::option::of(text()),
            status in "[A-Z-]{1,12}",
            start in instant(),
            minutes in 1i64..10_000,
        ) {
            let mut event = ScheduledEvent::new(
                UserId::new(),
                CalendarId::new(),
                IcalUid::new("evt@example.com").unwrap(),
                title.clone(),
                start,
                start + Duration::minutes(minutes),
            )
            .with_status(status.clone());
            event.description.clone_from(&description);
            event.location.clone_from(&location);

            let codec = ICalendarCodec::default();
            let objects = codec.decode(&codec.encode_resource(&event.clone().into())).unwrap();
            prop_assert_eq!(objects.len(), 1);
            let IncomingObject::Event(decoded) = &objects[0] else {
                return Err(TestCaseError::fail("expected an event"));
            };
            prop_assert_eq!(decoded.uid.as_deref(), Some("evt@example.com"));
            prop_assert_eq!(decoded.summary.as_deref(), Some(title.as_str()));
            prop_assert_eq!(&decoded.description, &description);
            prop_assert_eq!(&decoded.location, &location);
            prop_assert_eq!(decoded.status.as_deref(), Some(status.as_str()));
            prop_assert_eq!(decoded.start, Some(event.start_at));
            prop_assert_eq!(decoded.end, Some(event.end_at));
        }

        #[test]
        fn task_text_status_and_dates_survive_encoding(
            title in text(),
            note in prop::option::of(text()),
            status in task_status(),
            due in prop::option::of(instant()),
            completed in instant(),
            priority in 0i32..=9,
        ) {
            let mut task = Task::new(
                UserId::new(),
                ProjectId::new(),
                IcalUid::new("task@example.com").unwrap(),
                title.clone(),
            );
            task.note.clone_from(&note);
            task.due_at = due;
            task.priority = priority;
            task.set_status(status, Some(completed), Utc::now());

            let codec = ICalendarCodec::default();
            let objects = codec.decode(&codec.encode_resource(&task.clone().into())).unwrap();
            prop_assert_eq!(objects.len(), 1);
            let IncomingObject::Todo(decoded) = &objects[0] else {
                return Err(TestCaseError::fail("expected a task"));
            };
            prop_assert_eq!(decoded.summary.as_deref(), Some(title.as_str()));
            prop_assert_eq!(&decoded.description, &note);
            prop_assert_eq!(decoded.status, Some(status));
            prop_assert_eq!(decoded.due, due);
            prop_assert_eq!(decoded.completed, task.completed_at);
            // zero is the undefined priority and is not written
            prop_assert_eq!(decoded.priority, (priority > 0).then_some(priority));
        }
    }
}

