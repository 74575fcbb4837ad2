//! Error taxonomy for the dispatch core.
//!
//! Every error below propagates to the dispatcher boundary, where it is
//! handed exactly once to the configured error handler.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while resolving services from the container.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// Nothing is registered for the identifier and it has no constructor.
    #[error("Service \"{service}\" is not defined{}.", resolving_suffix(.resolving))]
    ServiceNotFound {
        service: String,
        resolving: Option<String>,
    },

    /// A constructor asked for a parameter it never declared a type for.
    #[error("Parameter \"{parameter}\" has an unknown type (resolving \"{resolving}\").")]
    ParameterTypeUnknown { parameter: String, resolving: String },

    /// The artifact cannot be invoked with resolved arguments.
    #[error("Callable \"{0}\" is unsupported.")]
    UnsupportedCallable(String),
}

fn resolving_suffix(resolving: &Option<String>) -> String {
    match resolving {
        Some(name) => format!(" (resolving \"{}\")", name),
        None => String::new(),
    }
}

/// Errors raised while scanning the routes directory.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Failed to read route source {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An error carrying an explicit status code and a message that is safe to
/// show to clients.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApplicationError {
    pub status: u16,
    pub message: String,
}

impl ApplicationError {
    pub const NOT_FOUND: u16 = 404;

    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// The error raised when no route matches a request.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(Self::NOT_FOUND, message)
    }
}

/// Any failure that can occur between receiving a request and producing its
/// response.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Application(#[from] ApplicationError),

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("Middleware \"{0}\" must be a callable or a list of container services")]
    InvalidMiddlewareDefinition(String),

    #[error("Artifact \"{0}\" is not registered")]
    ArtifactNotFound(String),

    #[error("Request pipeline panicked: {0}")]
    Panicked(String),

    /// An arbitrary failure raised by a handler or middleware.
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl DispatchError {
    /// Wraps an arbitrary error raised by handler code.
    pub fn other<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        DispatchError::Other(error.into())
    }

    /// Returns the application error, if this failure carries one.
    pub fn as_application(&self) -> Option<&ApplicationError> {
        match self {
            DispatchError::Application(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_not_found_display() {
        let err = ContainerError::ServiceNotFound {
            service: "Mailer".into(),
            resolving: None,
        };
        assert_eq!(err.to_string(), "Service \"Mailer\" is not defined.");

        let err = ContainerError::ServiceNotFound {
            service: "Mailer".into(),
            resolving: Some("Signup".into()),
        };
        assert_eq!(
            err.to_string(),
            "Service \"Mailer\" is not defined (resolving \"Signup\")."
        );
    }

    #[test]
    fn test_application_error_passthrough() {
        let err: DispatchError = ApplicationError::not_found("Route does not exist.").into();
        assert_eq!(err.to_string(), "Route does not exist.");
        assert_eq!(err.as_application().map(|e| e.status), Some(404));

        let err = DispatchError::other("boom");
        assert!(err.as_application().is_none());
        assert_eq!(err.to_string(), "boom");
    }
}
