//! Route definitions

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{any, get},
};
use infrastructure::AppConfig;
use tower_http::trace::TraceLayer;

use crate::{
    handlers,
    middleware::{ApiKeyAuthLayer, RequestIdLayer},
    state::AppState,
};

/// Create the router with every route and the middleware stack
///
/// DAV methods are not standard HTTP verbs, so DAV paths accept any method
/// and dispatch on it themselves.
pub fn create_router(state: AppState, config: &AppConfig) -> Router {
    let base = state.paths.base().to_string();
    let auth = ApiKeyAuthLayer::from_api_keys(config.security.api_keys.clone())
        .with_realm(&config.caldav.auth_realm);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/.well-known/caldav", any(handlers::well_known::caldav_redirect))
        .route(&format!("{base}/"), any(handlers::dav::dispatch))
        .route(&format!("{base}/{{*path}}"), any(handlers::dav::dispatch))
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.server.max_body_bytes))
        .layer(auth)
        .layer(RequestIdLayer::new())
        .layer(TraceLayer::new_for_http())
}
