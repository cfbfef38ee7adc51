//! Application configuration
//!
//! Split into focused sub-modules:
//! - `server`: HTTP listener settings
//! - `database`: SQLite database settings
//! - `security`: API keys
//! - `caldav`: DAV mount point and product identity
//! - `telemetry`: log filter and format
//!
//! Values are layered: built-in defaults, then an optional `config.toml`,
//! then `TASKDAV_*` environment variables (`TASKDAV_SERVER__PORT=8080`).

mod caldav;
mod database;
mod security;
mod server;
mod telemetry;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use caldav::CalDavConfig;
pub use database::DatabaseConfig;
pub use security::{ApiKeyEntry, SecurityConfig};
pub use server::ServerConfig;
pub use telemetry::{LogFormat, TelemetryAppConfig};

/// Shared default for boolean `true` fields across config structs
pub(crate) const fn default_true() -> bool {
    true
}

/// Environment variable prefix
pub const ENV_PREFIX: &str = "TASKDAV";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Security configuration
    #[serde(default)]
    pub security: SecurityConfig,

    /// CalDAV endpoint configuration
    #[serde(default)]
    pub caldav: CalDavConfig,

    /// Logging configuration
    #[serde(default)]
    pub telemetry: TelemetryAppConfig,
}

impl AppConfig {
    /// Load configuration from `config.toml` (if present) and the environment
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, reading `file` instead of `config.toml` when given
    ///
    /// An explicit file must exist; the default one is optional.
    pub fn load_from(file: Option<&Path>) -> Result<Self, config::ConfigError> {
        let file_source = match file {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("config").required(false),
        };

        let builder = config::Config::builder()
            .add_source(file_source)
            // Override with environment variables (e.g., TASKDAV_SERVER__PORT)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Socket address the HTTP server binds to
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
