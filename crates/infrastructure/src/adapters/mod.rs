//! Infrastructure adapters

mod api_key_hasher;

pub use api_key_hasher::{ApiKeyHashError, ApiKeyHasher};
