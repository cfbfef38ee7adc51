//! Single `.ics` resources: PROPFIND, GET, PUT and DELETE

use axum::{http::StatusCode, response::Response};
use caldav_protocol::{DavResponse, Multistatus, negotiate, parse_propfind};
use domain::{CalendarId, CalendarResource, IcalUid, UserId};
use tracing::{info, instrument};

use super::{DavRequest, properties, responses};
use crate::error::ApiError;

/// The resource named by `uid`, provided it is filed under `calendar_id`
async fn find_in_calendar(
    req: &DavRequest<'_>,
    user: &UserId,
    calendar_id: &CalendarId,
    uid: &IcalUid,
) -> Result<CalendarResource, ApiError> {
    req.state
        .caldav
        .find_resource(user, uid)
        .await?
        .filter(|resource| resource.calendar_id() == Some(*calendar_id))
        .ok_or_else(|| ApiError::NotFound(format!("resource {uid}")))
}

#[instrument(skip_all, fields(%uid))]
pub(super) async fn propfind(
    req: &DavRequest<'_>,
    user: &UserId,
    calendar_id: &CalendarId,
    uid: &IcalUid,
) -> Result<Response, ApiError> {
    req.depth()?;
    let props = parse_propfind(req.body);
    let resource = find_in_calendar(req, user, calendar_id, uid).await?;
    let encoded = req.state.codec.encode_resource(&resource);

    let mut multistatus = Multistatus::new();
    multistatus.push(DavResponse::with_propstats(
        req.state.paths.resource(user, calendar_id, uid),
        negotiate(&props, &properties::calendar_resource(&resource, &encoded, false)),
    ));
    responses::multistatus(&multistatus)
}

#[instrument(skip_all, fields(%uid))]
pub(super) async fn get(
    req: &DavRequest<'_>,
    user: &UserId,
    calendar_id: &CalendarId,
    uid: &IcalUid,
) -> Result<Response, ApiError> {
    let resource = find_in_calendar(req, user, calendar_id, uid).await?;
    let body = req.state.codec.encode_resource(&resource);
    Ok(responses::calendar_body(body, resource.etag()))
}

/// Import the payload into the calendar
///
/// 201 when anything was created, 204 when the payload only updated
/// existing resources.
#[instrument(skip_all, fields(%uid, bytes = req.body.len()))]
pub(super) async fn put(
    req: &DavRequest<'_>,
    user: &UserId,
    calendar_id: &CalendarId,
    uid: &IcalUid,
) -> Result<Response, ApiError> {
    let objects = req.state.codec.decode(req.body_text()?)?;
    let summary = req.state.import.import(user, calendar_id, objects).await?;

    let stored = req.state.caldav.find_resource(user, uid).await?;
    let status = if summary.created_any() {
        StatusCode::CREATED
    } else {
        StatusCode::NO_CONTENT
    };
    info!(total = summary.total(), %status, "Stored calendar payload");
    Ok(responses::status_with_etag(
        status,
        stored.as_ref().and_then(CalendarResource::etag),
    ))
}

/// Delete by UID; an unmatched UID is still 204
#[instrument(skip_all, fields(%uid))]
pub(super) async fn delete(
    req: &DavRequest<'_>,
    user: &UserId,
    uid: &IcalUid,
) -> Result<Response, ApiError> {
    let outcome = req.state.caldav.delete_resource(user, uid).await?;
    info!(?outcome, "DELETE handled");
    Ok(responses::status_with_etag(StatusCode::NO_CONTENT, None))
}
