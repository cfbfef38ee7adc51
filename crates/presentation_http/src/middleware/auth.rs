//! API key authentication middleware
//!
//! CalDAV clients authenticate either with `Authorization: Bearer <key>` or
//! with HTTP Basic, where the password carries the key and the username is
//! ignored. Keys are verified against the Argon2id hashes in configuration;
//! each hash maps to one user.
//!
//! Without any configured key every DAV request is rejected.

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use application::RequestContext;
use axum::{
    extract::Request,
    http::{
        HeaderValue,
        header::{AUTHORIZATION, WWW_AUTHENTICATE},
    },
    response::{IntoResponse, Response},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use domain::UserId;
use infrastructure::{ApiKeyHasher, config::ApiKeyEntry};
use tower::{Layer, Service};
use tracing::{debug, warn};

use crate::{error::ApiError, middleware::RequestId};

/// Paths that never require credentials, along with everything below them
const PUBLIC_PATHS: [&str; 2] = ["/health", "/.well-known"];

fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.iter().any(|public| {
        path.strip_prefix(public)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

#[derive(Clone, Debug)]
struct VerifiedKeyEntry {
    hash: String,
    user_id: UserId,
}

/// Hashed API keys with their users
#[derive(Clone, Debug, Default)]
pub struct ApiKeyStore {
    entries: Vec<VerifiedKeyEntry>,
    hasher: ApiKeyHasher,
}

impl ApiKeyStore {
    /// Build from configuration, skipping unusable entries
    #[must_use]
    pub fn from_entries(entries: Vec<ApiKeyEntry>) -> Self {
        let entries = entries
            .into_iter()
            .filter_map(|entry| {
                if !ApiKeyHasher::is_hashed(&entry.hash) {
                    warn!(user_id = %entry.user_id, "API key entry is not an Argon2 hash, skipping");
                    return None;
                }
                match UserId::parse(&entry.user_id) {
                    Ok(user_id) => Some(VerifiedKeyEntry {
                        hash: entry.hash,
                        user_id,
                    }),
                    Err(e) => {
                        warn!(
                            user_id = %entry.user_id,
                            error = %e,
                            "Invalid user ID format in api_keys configuration, skipping entry"
                        );
                        None
                    },
                }
            })
            .collect();

        Self {
            entries,
            hasher: ApiKeyHasher::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The user owning `api_key`, if any entry matches
    #[must_use]
    pub fn verify(&self, api_key: &str) -> Option<UserId> {
        self.entries.iter().find_map(|entry| {
            match self.hasher.verify(api_key, &entry.hash) {
                Ok(true) => Some(entry.user_id),
                Ok(false) => None,
                Err(e) => {
                    warn!(error = %e, "Error verifying API key hash");
                    None
                },
            }
        })
    }
}

/// Key presented in an `Authorization` header
#[derive(Debug, PartialEq, Eq)]
enum PresentedKey {
    Key(String),
    Malformed(&'static str),
}

fn presented_key(header: &str) -> PresentedKey {
    if let Some(token) = header.strip_prefix("Bearer ") {
        return PresentedKey::Key(token.trim().to_string());
    }
    if let Some(encoded) = header.strip_prefix("Basic ") {
        let Ok(decoded) = STANDARD.decode(encoded.trim()) else {
            return PresentedKey::Malformed("Basic credentials are not valid base64");
        };
        let Ok(credentials) = String::from_utf8(decoded) else {
            return PresentedKey::Malformed("Basic credentials are not valid UTF-8");
        };
        return match credentials.split_once(':') {
            Some((_, password)) => PresentedKey::Key(password.to_string()),
            None => PresentedKey::Malformed("Basic credentials lack a password"),
        };
    }
    PresentedKey::Malformed("expected Bearer or Basic credentials")
}

/// Layer that applies API key authentication
#[derive(Clone, Debug)]
pub struct ApiKeyAuthLayer {
    api_key_store: Arc<ApiKeyStore>,
    challenge: Option<HeaderValue>,
}

impl ApiKeyAuthLayer {
    #[must_use]
    pub fn from_api_keys(entries: Vec<ApiKeyEntry>) -> Self {
        Self {
            api_key_store: Arc::new(ApiKeyStore::from_entries(entries)),
            challenge: None,
        }
    }

    /// Advertise `WWW-Authenticate: Basic realm="<realm>"` on 401 responses
    #[must_use]
    pub fn with_realm(mut self, realm: &str) -> Self {
        let escaped = realm.replace('"', "'");
        self.challenge = HeaderValue::from_str(&format!("Basic realm=\"{escaped}\"")).ok();
        self
    }
}

impl<S> Layer<S> for ApiKeyAuthLayer {
    type Service = ApiKeyAuth<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ApiKeyAuth {
            inner,
            api_key_store: Arc::clone(&self.api_key_store),
            challenge: self.challenge.clone(),
        }
    }
}

/// Middleware service for API key authentication
#[derive(Clone, Debug)]
pub struct ApiKeyAuth<S> {
    inner: S,
    api_key_store: Arc<ApiKeyStore>,
    challenge: Option<HeaderValue>,
}

impl<S> Service<Request> for ApiKeyAuth<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let api_key_store = Arc::clone(&self.api_key_store);
        let challenge = self.challenge.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if is_public(req.uri().path()) {
                return inner.call(req).await;
            }

            let header = req
                .headers()
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok());

            let outcome = match header.map(presented_key) {
                None => Err("Missing Authorization header"),
                Some(PresentedKey::Malformed(reason)) => Err(reason),
                Some(PresentedKey::Key(_)) if api_key_store.is_empty() => {
                    Err("No API keys are configured")
                },
                Some(PresentedKey::Key(key)) => {
                    api_key_store.verify(&key).ok_or("Invalid API key")
                },
            };

            match outcome {
                Ok(user_id) => {
                    debug!(%user_id, "Authenticated DAV request");
                    inject_request_context(&mut req, user_id);
                    inner.call(req).await
                },
                Err(reason) => Ok(unauthorized_response(reason, challenge)),
            }
        })
    }
}

/// Store a `RequestContext` for the handlers, reusing the request id when present
fn inject_request_context(req: &mut Request, user_id: UserId) {
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map_or_else(uuid::Uuid::now_v7, RequestId::as_uuid);

    let ctx = RequestContext::with_request_id(user_id, request_id);
    req.extensions_mut().insert(ctx);
}

fn unauthorized_response(message: &str, challenge: Option<HeaderValue>) -> Response {
    let mut response = ApiError::Unauthorized(message.to_string()).into_response();
    if let Some(value) = challenge {
        response.headers_mut().insert(WWW_AUTHENTICATE, value);
    }
    response
}
