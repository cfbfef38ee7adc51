//! HTTP middleware: authentication and request correlation

pub mod auth;
pub mod request_id;

pub use auth::{ApiKeyAuth, ApiKeyAuthLayer, ApiKeyStore};
pub use request_id::{REQUEST_ID_HEADER, RequestId, RequestIdLayer};
