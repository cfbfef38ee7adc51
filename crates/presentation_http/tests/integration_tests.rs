//! End-to-end tests for the CalDAV router
//!
//! Each test builds the full router over its own in-memory database and
//! drives it with `tower::ServiceExt::oneshot`.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use application::ports::CalendarStore;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use caldav_protocol::{ALLOWED_METHODS, DAV_COMPLIANCE};
use domain::{Calendar, Project, UserId};
use infrastructure::{
    ApiKeyEntry, ApiKeyHasher, AppConfig, DatabaseConfig, SqliteCalendarStore, create_pool,
};
use presentation_http::{AppState, create_router};
use tower::ServiceExt;

const KEY: &str = "sk-test-key";

struct TestApp {
    router: Router,
    user: UserId,
    calendar: Calendar,
}

impl TestApp {
    async fn new() -> Self {
        let user = UserId::new();
        let mut config = AppConfig::default();
        config.security.api_keys = vec![ApiKeyEntry {
            hash: ApiKeyHasher::new().hash(KEY).unwrap(),
            user_id: user.to_string(),
        }];

        let pool = Arc::new(create_pool(&DatabaseConfig::in_memory()).unwrap());
        let calendars = SqliteCalendarStore::new(Arc::clone(&pool));
        calendars
            .save_project(&Project::new(user, "Inbox").as_default())
            .await
            .unwrap();
        let calendar = Calendar::new(user, "Personal").as_default();
        calendars.save_calendar(&calendar).await.unwrap();

        let state = AppState::from_pool(pool, &config.caldav);
        Self {
            router: create_router(state, &config),
            user,
            calendar,
        }
    }

    fn calendar_path(&self) -> String {
        format!("/dav/calendars/{}/{}/", self.user, self.calendar.id)
    }

    fn resource_path(&self, name: &str) -> String {
        format!("{}{name}", self.calendar_path())
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, String) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, String::from_utf8(body.to_vec()).unwrap())
    }

    async fn dav(
        &self,
        method: &str,
        uri: &str,
        depth: Option<&str>,
        body: &str,
    ) -> (StatusCode, HeaderMap, String) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {KEY}"));
        if let Some(depth) = depth {
            builder = builder.header("Depth", depth);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    async fn put_event(&self, uid: &str, start: &str, end: &str) -> StatusCode {
        let ics = format!(
            "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//test//EN\r\nBEGIN:VEVENT\r\n\
             UID:{uid}\r\nSUMMARY:Planning\r\nDTSTART:{start}\r\nDTEND:{end}\r\n\
             END:VEVENT\r\nEND:VCALENDAR\r\n"
        );
        let (status, _, _) = self
            .dav("PUT", &self.resource_path(&format!("{uid}.ics")), None, &ics)
            .await;
        status
    }
}

fn time_range_query(start: &str, end: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8" ?>
        <C:calendar-query xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
          <D:prop><D:getetag/><C:calendar-data/></D:prop>
          <C:filter>
            <C:comp-filter name="VCALENDAR">
              <C:comp-filter name="VEVENT">
                <C:time-range start="{start}" end="{end}"/>
              </C:comp-filter>
            </C:comp-filter>
          </C:filter>
        </C:calendar-query>"#
    )
}

// ============================================================================
// Public endpoints
// ============================================================================

#[tokio::test]
async fn health_needs_no_credentials() {
    let app = TestApp::new().await;
    let (status, headers, body) = app
        .send(Request::get("/health").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"status\":\"ok\""));
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn well_known_redirects_to_principals() {
    let app = TestApp::new().await;
    let (status, headers, _) = app
        .send(
            Request::builder()
                .method("PROPFIND")
                .uri("/.well-known/caldav")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::MOVED_PERMANENTLY);
    assert_eq!(headers[header::LOCATION], "/dav/principals/");
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn missing_credentials_get_a_basic_challenge() {
    let app = TestApp::new().await;
    let (status, headers, _) = app
        .send(
            Request::builder()
                .method("PROPFIND")
                .uri("/dav/principals/")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(
        headers[header::WWW_AUTHENTICATE]
            .to_str()
            .unwrap()
            .starts_with("Basic realm=\"taskdav\"")
    );
}

#[tokio::test]
async fn basic_auth_password_carries_the_key() {
    let app = TestApp::new().await;
    let credentials = STANDARD.encode(format!("anyone:{KEY}"));
    let (status, _, _) = app
        .send(
            Request::builder()
                .method("PROPFIND")
                .uri("/dav/principals/")
                .header("Depth", "0")
                .header(header::AUTHORIZATION, format!("Basic {credentials}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::MULTI_STATUS);
}

#[tokio::test]
async fn other_users_paths_are_forbidden() {
    let app = TestApp::new().await;
    let stranger = UserId::new();
    let (status, _, _) = app
        .dav(
            "PROPFIND",
            &format!("/dav/calendars/{stranger}/"),
            Some("1"),
            "",
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn other_users_paths_are_forbidden_even_when_malformed() {
    let app = TestApp::new().await;
    let stranger = UserId::new();
    for path in [
        format!("/dav/calendars/{stranger}/not-a-calendar/x.ics"),
        format!("/dav/calendars/{stranger}/{}/notes.txt", app.calendar.id),
        format!("/dav/principals/{stranger}/extra/"),
    ] {
        let (status, _, _) = app.dav("PROPFIND", &path, Some("0"), "").await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{path}");
    }
}

#[tokio::test]
async fn lookalike_of_health_is_not_public() {
    let app = TestApp::new().await;
    let (status, _, _) = app
        .send(Request::get("/healthX").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Discovery
// ============================================================================

#[tokio::test]
async fn options_advertises_calendar_access() {
    let app = TestApp::new().await;
    let (status, headers, _) = app.dav("OPTIONS", &app.calendar_path(), None, "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::ALLOW], ALLOWED_METHODS);
    assert_eq!(headers["dav"], DAV_COMPLIANCE);
}

#[tokio::test]
async fn principal_names_the_calendar_home() {
    let app = TestApp::new().await;
    let (status, _, body) = app
        .dav(
            "PROPFIND",
            &format!("/dav/principals/{}/", app.user),
            Some("0"),
            "",
        )
        .await;
    assert_eq!(status, StatusCode::MULTI_STATUS);
    assert!(body.contains(&format!("/dav/calendars/{}/", app.user)));
    assert!(body.contains("calendar-home-set"));
}

#[tokio::test]
async fn calendar_home_depth_one_lists_calendars() {
    let app = TestApp::new().await;
    let home = format!("/dav/calendars/{}/", app.user);

    let (_, _, shallow) = app.dav("PROPFIND", &home, Some("0"), "").await;
    assert!(!shallow.contains(&app.calendar_path()));

    let (status, _, deep) = app.dav("PROPFIND", &home, Some("1"), "").await;
    assert_eq!(status, StatusCode::MULTI_STATUS);
    assert!(deep.contains(&app.calendar_path()));
    assert!(deep.contains("Personal"));
}

#[tokio::test]
async fn calendar_depth_controls_member_listing() {
    let app = TestApp::new().await;
    app.put_event("one@test", "20240301T090000Z", "20240301T100000Z")
        .await;
    app.put_event("two@test", "20240302T090000Z", "20240302T100000Z")
        .await;

    let (status, _, shallow) = app
        .dav("PROPFIND", &app.calendar_path(), Some("0"), "")
        .await;
    assert_eq!(status, StatusCode::MULTI_STATUS);
    assert_eq!(shallow.matches("<d:response>").count(), 1);
    assert!(!shallow.contains("one@test.ics"));

    for depth in [Some("1"), Some("infinity"), None] {
        let (status, _, deep) = app.dav("PROPFIND", &app.calendar_path(), depth, "").await;
        assert_eq!(status, StatusCode::MULTI_STATUS, "{depth:?}");
        assert_eq!(deep.matches("<d:response>").count(), 3, "{depth:?}");
        assert!(deep.contains("one@test.ics"), "{depth:?}");
        assert!(deep.contains("two@test.ics"), "{depth:?}");
    }
}

#[tokio::test]
async fn malformed_depth_is_a_bad_request() {
    let app = TestApp::new().await;
    let (status, _, _) = app
        .dav("PROPFIND", &app.calendar_path(), Some("2"), "")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Resources
// ============================================================================

#[tokio::test]
async fn put_get_delete_round_trip() {
    let app = TestApp::new().await;
    let path = app.resource_path("sync@test.ics");

    assert_eq!(
        app.put_event("sync@test", "20240315T100000Z", "20240315T110000Z")
            .await,
        StatusCode::CREATED
    );

    let (status, headers, body) = app.dav("GET", &path, None, "").await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers.contains_key(header::ETAG));
    assert!(body.contains("UID:sync@test"));
    assert!(body.contains("SUMMARY:Planning"));

    assert_eq!(
        app.put_event("sync@test", "20240315T120000Z", "20240315T130000Z")
            .await,
        StatusCode::NO_CONTENT
    );
    let (_, _, updated) = app.dav("GET", &path, None, "").await;
    assert!(updated.contains("DTSTART:20240315T120000Z"));

    let (status, _, _) = app.dav("DELETE", &path, None, "").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _, _) = app.dav("GET", &path, None, "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Deleting again is still a success
    let (status, _, _) = app.dav("DELETE", &path, None, "").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn escaped_text_comes_back_unchanged() {
    let app = TestApp::new().await;
    let ics = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//test//EN\r\nBEGIN:VEVENT\r\n\
               UID:paths@test\r\nSUMMARY:C:\\\\Users\\\\new\r\n\
               DESCRIPTION:one\\, two\\; three\\nnext line\r\n\
               DTSTART:20240315T100000Z\r\nDTEND:20240315T110000Z\r\n\
               END:VEVENT\r\nEND:VCALENDAR\r\n";
    let path = app.resource_path("paths@test.ics");
    let (status, _, _) = app.dav("PUT", &path, None, ics).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _, body) = app.dav("GET", &path, None, "").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("SUMMARY:C:\\\\Users\\\\new\r\n"), "{body}");
    assert!(body.contains("DESCRIPTION:one\\, two\\; three\\nnext line\r\n"), "{body}");
}

#[tokio::test]
async fn todo_priority_survives_put_and_get() {
    let app = TestApp::new().await;
    let ics = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//test//EN\r\nBEGIN:VTODO\r\n\
               UID:chore@test\r\nSUMMARY:Water plants\r\nPRIORITY:1\r\n\
               STATUS:IN-PROCESS\r\nEND:VTODO\r\nEND:VCALENDAR\r\n";
    let path = app.resource_path("chore@test.ics");
    let (status, _, _) = app.dav("PUT", &path, None, ics).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _, body) = app.dav("GET", &path, None, "").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("BEGIN:VTODO\r\n"));
    assert!(body.contains("PRIORITY:1\r\n"), "{body}");
    assert!(body.contains("STATUS:IN-PROCESS\r\n"));
}

#[tokio::test]
async fn unparseable_payload_is_rejected() {
    let app = TestApp::new().await;
    let (status, _, _) = app
        .dav("PUT", &app.resource_path("bad.ics"), None, "not a calendar")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn calendar_export_contains_every_resource() {
    let app = TestApp::new().await;
    app.put_event("a@test", "20240301T090000Z", "20240301T100000Z")
        .await;
    app.put_event("b@test", "20240302T090000Z", "20240302T100000Z")
        .await;

    let (status, headers, body) = app.dav("GET", &app.calendar_path(), None, "").await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        headers[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/calendar")
    );
    assert!(body.contains("UID:a@test"));
    assert!(body.contains("UID:b@test"));
    assert!(body.contains("X-WR-CALNAME:Personal"));
}

// ============================================================================
// Reports
// ============================================================================

#[tokio::test]
async fn time_range_report_returns_overlapping_events() {
    let app = TestApp::new().await;
    app.put_event("march@test", "20240310T090000Z", "20240310T100000Z")
        .await;
    app.put_event("april@test", "20240410T090000Z", "20240410T100000Z")
        .await;

    let (status, _, body) = app
        .dav(
            "REPORT",
            &app.calendar_path(),
            Some("1"),
            &time_range_query("20240301T000000Z", "20240401T000000Z"),
        )
        .await;
    assert_eq!(status, StatusCode::MULTI_STATUS);
    assert!(body.contains("march@test.ics"));
    assert!(!body.contains("april@test.ics"));
    assert!(body.contains("calendar-data"));
}

#[tokio::test]
async fn multiget_reports_missing_hrefs() {
    let app = TestApp::new().await;
    app.put_event("known@test", "20240310T090000Z", "20240310T100000Z")
        .await;

    let known = app.resource_path("known@test.ics");
    let missing = app.resource_path("missing@test.ics");
    let body = format!(
        r#"<?xml version="1.0" encoding="utf-8" ?>
        <C:calendar-multiget xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
          <D:prop><D:getetag/></D:prop>
          <D:href>{known}</D:href>
          <D:href>{missing}</D:href>
        </C:calendar-multiget>"#
    );

    let (status, _, xml) = app
        .dav("REPORT", &app.calendar_path(), Some("1"), &body)
        .await;
    assert_eq!(status, StatusCode::MULTI_STATUS);
    assert!(xml.contains(&known));
    assert!(xml.contains(&missing));
    assert!(xml.contains("HTTP/1.1 404 Not Found"));
}

#[tokio::test]
async fn unsupported_method_is_405() {
    let app = TestApp::new().await;
    let (status, headers, _) = app.dav("MKCALENDAR", &app.calendar_path(), None, "").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(headers[header::ALLOW], ALLOWED_METHODS);
}
