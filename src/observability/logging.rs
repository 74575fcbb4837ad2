//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Configure log level from config and environment
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Log level configurable via config and environment, environment first
//! - A bare level applies to this crate and the HTTP tracing layer; anything
//!   else is taken as a complete filter directive

use tracing_subscriber::{
    filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Returns true if `level` is a bare level such as `debug`.
pub fn is_level(level: &str) -> bool {
    level.parse::<LevelFilter>().is_ok()
}

/// Expands the configured log level into filter directives.
pub fn directives(level: &str) -> String {
    if is_level(level) {
        format!("kick={level},tower_http={level}")
    } else {
        level.to_string()
    }
}

/// Builds the filter: `RUST_LOG` when set, otherwise the configured level.
pub fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives(level)))
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init(level: &str) -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(filter(level))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}
