//! taskdav HTTP presentation layer
//!
//! Serves the CalDAV tree, the `.well-known` bootstrap redirect and a health
//! probe on top of the application services.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::{ApiError, set_expose_internal_errors};
pub use middleware::{ApiKeyAuthLayer, RequestIdLayer};
pub use routes::create_router;
pub use state::AppState;
