//! Response builders shared by the DAV handlers

use axum::{
    http::{
        HeaderName, HeaderValue, StatusCode,
        header::{ALLOW, CONTENT_TYPE, ETAG},
    },
    response::{IntoResponse, Response},
};
use caldav_protocol::{
    ALLOWED_METHODS, DAV_COMPLIANCE, ICALENDAR_CONTENT_TYPE, Multistatus, XML_CONTENT_TYPE,
};

use super::properties::quoted_etag;
use crate::error::ApiError;

const DAV: &str = "dav";

/// `207 Multi-Status` with the serialized envelope
pub(super) fn multistatus(body: &Multistatus) -> Result<Response, ApiError> {
    let xml = body
        .to_xml()
        .map_err(|e| ApiError::Internal(format!("multistatus serialization failed: {e}")))?;
    Ok((
        StatusCode::MULTI_STATUS,
        [(CONTENT_TYPE, HeaderValue::from_static(XML_CONTENT_TYPE))],
        xml,
    )
        .into_response())
}

/// `200 OK` advertising methods and compliance classes, without a body
pub(super) fn options() -> Response {
    let mut response =
        (StatusCode::OK, [(ALLOW, HeaderValue::from_static(ALLOWED_METHODS))]).into_response();
    response.headers_mut().insert(
        HeaderName::from_static(DAV),
        HeaderValue::from_static(DAV_COMPLIANCE),
    );
    response
}

/// `200 OK` with an iCalendar body
pub(super) fn calendar_body(ical: String, etag: Option<&str>) -> Response {
    let mut response = (
        StatusCode::OK,
        [(CONTENT_TYPE, HeaderValue::from_static(ICALENDAR_CONTENT_TYPE))],
        ical,
    )
        .into_response();
    set_etag(&mut response, etag);
    response
}

/// A bodiless status, optionally carrying an `ETag`
pub(super) fn status_with_etag(status: StatusCode, etag: Option<&str>) -> Response {
    let mut response = status.into_response();
    set_etag(&mut response, etag);
    response
}

fn set_etag(response: &mut Response, etag: Option<&str>) {
    if let Some(value) = etag.and_then(|e| HeaderValue::from_str(&quoted_etag(e)).ok()) {
        response.headers_mut().insert(ETAG, value);
    }
}
