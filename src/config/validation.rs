//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, parseable addresses)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: KickConfig → Result<(), Vec<ValidationError>>
//! - The routes directory is not checked for existence here; discovery
//!   reports it on the first request

use std::net::SocketAddr;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::KickConfig;
use crate::observability::logging;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("server.bind_address \"{0}\" is not a socket address")]
    BindAddress(String),

    #[error("server.request_timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("server.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("routes.path must not be empty")]
    EmptyRoutesPath,

    #[error("observability.log_level \"{0}\" is not a valid filter")]
    LogLevel(String),
}

pub fn validate_config(config: &KickConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.server.bind_address.clone()));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if config.server.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    if config.routes.path.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyRoutesPath);
    }
    let level = &config.observability.log_level;
    let is_directive = level.contains(['=', ',']);
    if !(logging::is_level(level) || is_directive)
        || EnvFilter::try_new(logging::directives(level)).is_err()
    {
        errors.push(ValidationError::LogLevel(level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
