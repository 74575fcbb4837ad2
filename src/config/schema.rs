//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for a kick site.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct KickConfig {
    /// Listener settings for the host process.
    pub server: ServerConfig,

    /// Where routes are discovered from.
    pub routes: RoutesConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Host listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,

    /// Upper bound on one request, in seconds.
    pub request_timeout_secs: u64,

    /// Largest request body read from the wire, in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Route discovery configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RoutesConfig {
    /// Root of the routes directory.
    pub path: PathBuf,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("demos/pages"),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error), or a full filter
    /// directive. `RUST_LOG` takes precedence when set.
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
