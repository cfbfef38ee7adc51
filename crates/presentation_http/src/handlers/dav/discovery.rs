//! Principal and calendar-home discovery

use axum::response::Response;
use caldav_protocol::{DavResponse, Multistatus, negotiate, parse_propfind};
use domain::UserId;
use tracing::instrument;

use super::{DavRequest, properties, responses};
use crate::error::ApiError;

/// PROPFIND on the principal collection
///
/// Below depth 0 the caller's own principal is listed as the only member.
#[instrument(skip_all)]
pub(super) fn principals(req: &DavRequest<'_>) -> Result<Response, ApiError> {
    let depth = req.depth()?;
    let props = parse_propfind(req.body);
    let paths = &req.state.paths;
    let user = req.user();

    let mut multistatus = Multistatus::new();
    multistatus.push(DavResponse::with_propstats(
        paths.principals(),
        negotiate(&props, &properties::principal_collection(paths, &user)),
    ));
    if depth.includes_members() {
        multistatus.push(DavResponse::with_propstats(
            paths.principal(&user),
            negotiate(&props, &properties::principal(paths, &user)),
        ));
    }
    responses::multistatus(&multistatus)
}

/// PROPFIND on one principal
#[instrument(skip_all, fields(%user))]
pub(super) fn principal(req: &DavRequest<'_>, user: &UserId) -> Result<Response, ApiError> {
    req.depth()?;
    let props = parse_propfind(req.body);
    let paths = &req.state.paths;

    let mut multistatus = Multistatus::new();
    multistatus.push(DavResponse::with_propstats(
        paths.principal(user),
        negotiate(&props, &properties::principal(paths, user)),
    ));
    responses::multistatus(&multistatus)
}

/// PROPFIND on a calendar home, listing the user's calendars below depth 0
#[instrument(skip_all, fields(%user))]
pub(super) async fn calendar_home(
    req: &DavRequest<'_>,
    user: &UserId,
) -> Result<Response, ApiError> {
    let depth = req.depth()?;
    let props = parse_propfind(req.body);
    let paths = &req.state.paths;

    let mut multistatus = Multistatus::new();
    multistatus.push(DavResponse::with_propstats(
        paths.calendar_home(user),
        negotiate(&props, &properties::calendar_home(paths, user)),
    ));
    if depth.includes_members() {
        for calendar in req.state.caldav.list_calendars(user).await? {
            multistatus.push(DavResponse::with_propstats(
                paths.calendar(user, &calendar.id),
                negotiate(&props, &properties::calendar_collection(paths, &calendar)),
            ));
        }
    }
    responses::multistatus(&multistatus)
}
