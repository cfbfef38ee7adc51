//! CalDAV endpoint configuration.

use serde::{Deserialize, Serialize};

/// Where the DAV tree is mounted and how the server identifies itself
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalDavConfig {
    /// Path prefix of every DAV route
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// `PRODID` written into generated calendars
    #[serde(default = "default_product_id")]
    pub product_id: String,

    /// Realm announced in `WWW-Authenticate` challenges
    #[serde(default = "default_auth_realm")]
    pub auth_realm: String,
}

fn default_base_path() -> String {
    "/dav".to_string()
}

fn default_product_id() -> String {
    "-//taskdav//CalDAV Server//EN".to_string()
}

fn default_auth_realm() -> String {
    "taskdav".to_string()
}

impl Default for CalDavConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            product_id: default_product_id(),
            auth_realm: default_auth_realm(),
        }
    }
}
