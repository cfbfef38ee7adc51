//! `/.well-known/caldav` bootstrap (RFC 6764)

use axum::{
    extract::State,
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};

use crate::state::AppState;

/// Point clients at the principal collection, whatever the method
pub async fn caldav_redirect(State(state): State<AppState>) -> Response {
    (
        StatusCode::MOVED_PERMANENTLY,
        [(LOCATION, state.paths.principals())],
    )
        .into_response()
}
