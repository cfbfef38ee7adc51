//! Calendar collection: PROPFIND, REPORT and whole-calendar export

use axum::response::Response;
use caldav_protocol::{
    CompFilter, DavLocation, DavResponse, Multistatus, PropRequest, ReportRequest, negotiate,
    parse_propfind, parse_report,
};
use domain::{CalendarId, CalendarResource, ResourceQuery, UserId};
use tracing::{debug, instrument};

use super::{DavRequest, properties, responses};
use crate::error::ApiError;

/// PROPFIND on a calendar; depth 0 answers for the collection alone
#[instrument(skip_all, fields(%user, %calendar_id))]
pub(super) async fn propfind(
    req: &DavRequest<'_>,
    user: &UserId,
    calendar_id: &CalendarId,
) -> Result<Response, ApiError> {
    let depth = req.depth()?;
    let props = parse_propfind(req.body);
    let caldav = &req.state.caldav;
    let paths = &req.state.paths;

    let calendar = caldav.get_calendar(user, calendar_id).await?;
    let mut multistatus = Multistatus::new();
    multistatus.push(DavResponse::with_propstats(
        paths.calendar(user, calendar_id),
        negotiate(&props, &properties::calendar_collection(paths, &calendar)),
    ));

    if depth.includes_members() {
        let resources = caldav
            .list_resources(user, calendar_id, &ResourceQuery::all())
            .await?;
        push_resources(req, &mut multistatus, user, calendar_id, &props, &resources, false);
    }
    responses::multistatus(&multistatus)
}

/// REPORT on a calendar: `calendar-query` or `calendar-multiget`
#[instrument(skip_all, fields(%user, %calendar_id))]
pub(super) async fn report(
    req: &DavRequest<'_>,
    user: &UserId,
    calendar_id: &CalendarId,
) -> Result<Response, ApiError> {
    let report = parse_report(req.body_text()?)?;
    let caldav = &req.state.caldav;
    caldav.get_calendar(user, calendar_id).await?;

    let mut multistatus = Multistatus::new();
    match report {
        ReportRequest::CalendarQuery { props, filter } => {
            let query = filter
                .as_ref()
                .map_or_else(ResourceQuery::all, CompFilter::to_query);
            debug!(?query, "calendar-query");
            let resources = caldav.list_resources(user, calendar_id, &query).await?;
            push_resources(req, &mut multistatus, user, calendar_id, &props, &resources, true);
        },
        ReportRequest::Multiget { props, hrefs } => {
            for href in hrefs {
                let found = match req.state.paths.parse_href(&href) {
                    Some(DavLocation::Resource(owner, calendar, uid))
                        if owner == *user && calendar == *calendar_id =>
                    {
                        caldav
                            .find_resource(user, &uid)
                            .await?
                            .filter(|r| r.calendar_id() == Some(calendar))
                    },
                    _ => None,
                };
                match found {
                    Some(resource) => {
                        let encoded = req.state.codec.encode_resource(&resource);
                        let available = properties::calendar_resource(&resource, &encoded, true);
                        multistatus.push(DavResponse::with_propstats(
                            href,
                            negotiate(&props, &available),
                        ));
                    },
                    None => multistatus.push(DavResponse::not_found(href)),
                }
            }
        },
    }
    responses::multistatus(&multistatus)
}

/// GET on a calendar: every resource under one VCALENDAR
#[instrument(skip_all, fields(%user, %calendar_id))]
pub(super) async fn export(
    req: &DavRequest<'_>,
    user: &UserId,
    calendar_id: &CalendarId,
) -> Result<Response, ApiError> {
    let (calendar, resources) = req.state.caldav.export_calendar(user, calendar_id).await?;
    let body = req.state.codec.encode_calendar(&calendar.name, &resources);
    Ok(responses::calendar_body(body, None))
}

fn push_resources(
    req: &DavRequest<'_>,
    multistatus: &mut Multistatus,
    user: &UserId,
    calendar_id: &CalendarId,
    props: &PropRequest,
    resources: &[CalendarResource],
    with_data: bool,
) {
    for resource in resources {
        let encoded = req.state.codec.encode_resource(resource);
        let available = properties::calendar_resource(resource, &encoded, with_data);
        multistatus.push(DavResponse::with_propstats(
            req.state.paths.resource(user, calendar_id, resource.uid()),
            negotiate(props, &available),
        ));
    }
}
