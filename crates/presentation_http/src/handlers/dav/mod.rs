//! CalDAV request dispatch
//!
//! Every DAV path is routed here. The path-embedded user is checked against
//! the caller, the rest of the path is resolved to a [`DavLocation`], and the
//! method picks the handler. Unknown methods on a known location are 405.

mod collection;
mod discovery;
mod properties;
mod resource;
mod responses;

use application::RequestContext;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, Uri},
    response::Response,
};
use caldav_protocol::{
    DavLocation, DavPaths, Depth,
    addressing::{parse_calendar_segment, parse_user_segment},
};
use domain::UserId;
use tracing::{debug, instrument};

use crate::{error::ApiError, state::AppState};

/// Inputs shared by every DAV handler
pub(crate) struct DavRequest<'a> {
    pub state: &'a AppState,
    pub ctx: &'a RequestContext,
    pub headers: &'a HeaderMap,
    pub body: &'a Bytes,
}

impl DavRequest<'_> {
    fn depth(&self) -> Result<Depth, ApiError> {
        let header = self.headers.get("Depth").map(|v| v.to_str()).transpose();
        let header =
            header.map_err(|_| ApiError::BadRequest("Depth header is not ASCII".to_string()))?;
        Ok(Depth::parse(header)?)
    }

    fn body_text(&self) -> Result<&str, ApiError> {
        std::str::from_utf8(self.body)
            .map_err(|_| ApiError::BadRequest("request body is not UTF-8".to_string()))
    }

    fn user(&self) -> UserId {
        self.ctx.user_id()
    }
}

/// Entry point for every method on every DAV path
#[instrument(skip_all, fields(method = %method, path = %uri.path()))]
pub async fn dispatch(
    State(state): State<AppState>,
    axum::Extension(ctx): axum::Extension<RequestContext>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    if let Some(user) = path_user(&state.paths, uri.path())? {
        ctx.authorize_principal(&user)?;
    }
    let location = locate(&state.paths, uri.path())?;
    debug!(?location, "Resolved DAV location");

    if method == Method::OPTIONS {
        return Ok(responses::options());
    }

    let req = DavRequest {
        state: &state,
        ctx: &ctx,
        headers: &headers,
        body: &body,
    };

    match (location, method.as_str()) {
        (DavLocation::Principals, "PROPFIND") => discovery::principals(&req),
        (DavLocation::Principal(user), "PROPFIND") => discovery::principal(&req, &user),
        (DavLocation::CalendarHome(user), "PROPFIND") => {
            discovery::calendar_home(&req, &user).await
        },
        (DavLocation::Calendar(user, calendar), "PROPFIND") => {
            collection::propfind(&req, &user, &calendar).await
        },
        (DavLocation::Calendar(user, calendar), "REPORT") => {
            collection::report(&req, &user, &calendar).await
        },
        (DavLocation::Calendar(user, calendar), "GET" | "HEAD") => {
            collection::export(&req, &user, &calendar).await
        },
        (DavLocation::Resource(user, calendar, uid), "PROPFIND") => {
            resource::propfind(&req, &user, &calendar, &uid).await
        },
        (DavLocation::Resource(user, calendar, uid), "GET" | "HEAD") => {
            resource::get(&req, &user, &calendar, &uid).await
        },
        (DavLocation::Resource(user, calendar, uid), "PUT") => {
            resource::put(&req, &user, &calendar, &uid).await
        },
        (DavLocation::Resource(user, _, uid), "DELETE") => {
            resource::delete(&req, &user, &uid).await
        },
        (_, other) => Err(ApiError::MethodNotAllowed(other.to_string())),
    }
}

/// Owner named by the segment after `principals/` or `calendars/`
///
/// Read before the rest of the path so that another user's paths are 403
/// whatever follows the user segment.
fn path_user(paths: &DavPaths, path: &str) -> Result<Option<UserId>, ApiError> {
    match segments(paths, path).as_slice() {
        ["principals" | "calendars", user, ..] => Ok(Some(parse_user_segment(user)?)),
        _ => Ok(None),
    }
}

fn segments<'a>(paths: &DavPaths, path: &'a str) -> Vec<&'a str> {
    let rest = path.strip_prefix(paths.base()).unwrap_or(path);
    rest.split('/').filter(|s| !s.is_empty()).collect()
}

/// Resolve a request path
///
/// Malformed user or calendar identifiers are 400. Everything else outside
/// the address space, `.ics`-less resource names included, is 404.
fn locate(paths: &DavPaths, path: &str) -> Result<DavLocation, ApiError> {
    if let Some(location) = paths.parse_href(path) {
        return Ok(location);
    }

    match segments(paths, path).as_slice() {
        ["principals" | "calendars", user] => {
            parse_user_segment(user)?;
        },
        ["calendars", user, calendar] | ["calendars", user, calendar, _] => {
            parse_user_segment(user)?;
            parse_calendar_segment(calendar)?;
        },
        _ => {},
    }
    Err(ApiError::NotFound(format!("no DAV resource at {path}")))
}
