//! Request dispatcher.
//!
//! # Responsibilities
//! - Own the container, the router and the artifact loader
//! - Match a request, build its pipeline and run it
//! - Hand every failure to the error handler and normalize its reply
//!
//! # Design Decisions
//! - `handle` never fails: errors and panics become responses
//! - The error handler sees the request as matched, segments included
//! - The error handler can be swapped at runtime without locking
//!
//! # Data Flow
//! ```text
//! Request
//!     → router (first matching route, named segments)
//!     → pipeline builder (handler + middleware from the loader)
//!     → pipeline (container-resolved dependencies)
//!     → Response
//!
//! any DispatchError or panic
//!     → error handler (default: status + message by accepted media type)
//!     → Reply → Response
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use serde_json::json;

use crate::error::{ApplicationError, DispatchError, DispatchResult};
use crate::http::request::CONTENT_TYPE;
use crate::http::{Reply, Request, Response};
use crate::pipeline::{ArtifactLoader, ArtifactRegistry, PipelineBuilder};
use crate::routing::{Route, Router};
use crate::service::Container;
use crate::view::element::{body, h1, html, p};

/// Message of the error raised when no route matches.
pub const ROUTE_NOT_FOUND: &str = "Route does not exist.";

/// Message shown for any failure that is not an [`ApplicationError`].
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred.";

/// Turns a failed dispatch into the reply sent to the client.
pub type ErrorHandler = dyn Fn(&DispatchError, &Request) -> Reply + Send + Sync;

/// The dispatch core: routes, services and artifacts for one site.
pub struct Application {
    container: Arc<Container>,
    router: Router,
    loader: Arc<dyn ArtifactLoader>,
    error_handler: ArcSwap<Box<ErrorHandler>>,
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

impl Application {
    /// Creates an application with an empty container, no routes and the
    /// default error handler.
    pub fn new() -> Self {
        Self {
            container: Arc::new(Container::new()),
            router: Router::new(),
            loader: Arc::new(ArtifactRegistry::new()),
            error_handler: ArcSwap::from_pointee(Box::new(default_error_handler) as Box<ErrorHandler>),
        }
    }

    /// Runs a provider hook against the container, typically to register
    /// literals and factories.
    pub fn with_provider<F>(self, provider: F) -> Self
    where
        F: FnOnce(&Container),
    {
        provider(&self.container);
        self
    }

    /// Discovers routes from `path` on the first request.
    pub fn with_routes(mut self, path: impl Into<PathBuf>) -> Self {
        self.router = Router::with_path(path);
        self
    }

    pub fn with_artifacts(mut self, loader: impl ArtifactLoader + 'static) -> Self {
        self.loader = Arc::new(loader);
        self
    }

    pub fn with_error_handler<F, R>(self, handler: F) -> Self
    where
        F: Fn(&DispatchError, &Request) -> R + Send + Sync + 'static,
        R: Into<Reply>,
    {
        self.set_error_handler(handler);
        self
    }

    /// Replaces the error handler. Requests already failing keep the handler
    /// they loaded.
    pub fn set_error_handler<F, R>(&self, handler: F)
    where
        F: Fn(&DispatchError, &Request) -> R + Send + Sync + 'static,
        R: Into<Reply>,
    {
        let handler: Box<ErrorHandler> =
            Box::new(move |error: &DispatchError, request: &Request| -> Reply {
                handler(error, request).into()
            });
        self.error_handler.store(Arc::new(handler));
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Dispatches one request and returns its response.
    pub fn handle(&self, mut request: Request) -> Response {
        let started = Instant::now();
        let matched = self.match_route(&mut request);
        let original = request.clone();

        let result = matched.and_then(|route| {
            panic::catch_unwind(AssertUnwindSafe(|| self.run(&route, request)))
                .unwrap_or_else(|payload| Err(DispatchError::Panicked(panic_message(payload))))
        });

        match result {
            Ok(response) => {
                tracing::debug!(
                    method = %original.method,
                    path = %original.path,
                    status = response.status,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Request handled"
                );
                response
            }
            Err(error) => self.fail(&error, &original),
        }
    }

    fn match_route(&self, request: &mut Request) -> DispatchResult<Route> {
        let mut segments = HashMap::new();
        match self.router.match_request(request, &mut segments)? {
            Some(route) => {
                tracing::debug!(route = %route, artifact = route.artifact(), "Route matched");
                request.segments = segments;
                Ok(route)
            }
            None => Err(ApplicationError::not_found(ROUTE_NOT_FOUND).into()),
        }
    }

    fn run(&self, route: &Route, request: Request) -> DispatchResult<Response> {
        PipelineBuilder::new(&self.container, self.loader.as_ref())
            .build(route)?
            .call(request)
    }

    fn fail(&self, error: &DispatchError, request: &Request) -> Response {
        match error.as_application() {
            Some(e) if e.status < 500 => tracing::warn!(
                method = %request.method,
                path = %request.path,
                status = e.status,
                error = %e,
                "Request rejected"
            ),
            _ => tracing::error!(
                method = %request.method,
                path = %request.path,
                error = %error,
                "Request failed"
            ),
        }

        let handler = self.error_handler.load();
        (**handler)(error, request).into_response()
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("container", &self.container)
            .field("router", &self.router)
            .finish_non_exhaustive()
    }
}

/// Renders a failure by the media type the client asked for.
///
/// An [`ApplicationError`] contributes its status and message; anything else
/// becomes a 500 with a generic message. The media type is taken from
/// `accept`, then `content-type`: JSON and plain text are honoured and every
/// other type gets an HTML page.
pub fn default_error_handler(error: &DispatchError, request: &Request) -> Reply {
    let (status, message) = match error.as_application() {
        Some(e) => (e.status, e.message.clone()),
        None => (500, UNEXPECTED_ERROR.to_string()),
    };

    let media = request
        .header("accept")
        .or_else(|| request.header(CONTENT_TYPE))
        .map(media_type);

    let response = match media.as_deref() {
        Some("application/json") => Response::json(&json!({ "message": message }), status),
        Some("text/plain") => Response::text(status, message),
        _ => {
            let page = html().child(body().child(h1().child("Error")).child(p().child(message)));
            Response::html(status, page.render())
        }
    };
    response.into()
}

/// The media type without parameters, lower-cased.
fn media_type(value: &str) -> String {
    value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::handler_fn;
    use tempfile::TempDir;

    fn site() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.GET.route"), "").unwrap();
        std::fs::write(dir.path().join("boom.route"), "").unwrap();
        std::fs::write(dir.path().join("fail.route"), "").unwrap();
        dir
    }

    fn app(dir: &TempDir) -> Application {
        Application::new()
            .with_routes(dir.path())
            .with_artifacts(
                ArtifactRegistry::new()
                    .handler("/index.GET.route", handler_fn(|_: Request, ()| Ok::<_, DispatchError>("home")))
                    .handler(
                        "/boom.route",
                        handler_fn(|_: Request, ()| -> DispatchResult<&'static str> { panic!("kaboom") }),
                    )
                    .handler(
                        "/fail.route",
                        handler_fn(|_: Request, ()| -> DispatchResult<&'static str> {
                            Err(ApplicationError::new(403, "Forbidden <here>").into())
                        }),
                    ),
            )
    }

    #[test]
    fn test_handle_matched_route() {
        let dir = site();
        let res = app(&dir).handle(Request::new("GET", "/"));
        assert_eq!(res.status, 200);
        assert_eq!(res.body, "home");
        assert_eq!(res.header("content-type"), Some("text/plain"));
    }

    #[test]
    fn test_unconfigured_router_is_not_found() {
        let res = Application::new().handle(Request::new("GET", "/"));
        assert_eq!(res.status, 404);
        assert_eq!(
            res.body,
            "<!DOCTYPE html><html><body><h1>Error</h1><p>Route does not exist.</p></body></html>"
        );
    }

    #[test]
    fn test_default_error_handler_media_types() {
        let dir = site();
        let app = app(&dir);

        let res = app.handle(Request::new("GET", "/missing").with_header("Accept", "application/json"));
        assert_eq!(res.status, 404);
        assert_eq!(res.body, r#"{"message":"Route does not exist."}"#);

        let res = app.handle(
            Request::new("POST", "/fail").with_header("Content-Type", "text/plain; charset=utf-8"),
        );
        assert_eq!(res.status, 403);
        assert_eq!(res.body, "Forbidden <here>");

        let res = app.handle(Request::new("POST", "/fail"));
        assert_eq!(res.header("content-type"), Some("text/html"));
        assert!(res.body.contains("<p>Forbidden &lt;here&gt;</p>"));
    }

    #[test]
    fn test_panic_becomes_server_error() {
        let dir = site();
        let res = app(&dir).handle(Request::new("GET", "/boom").with_header("accept", "text/plain"));
        assert_eq!(res.status, 500);
        assert_eq!(res.body, UNEXPECTED_ERROR);
    }

    #[test]
    fn test_custom_error_handler() {
        let dir = site();
        let app = app(&dir).with_error_handler(|error: &DispatchError, request: &Request| {
            Response::json(&json!({ "error": error.to_string(), "path": request.path }), 418)
        });

        let res = app.handle(Request::new("GET", "/nope"));
        assert_eq!(res.status, 418);
        assert_eq!(res.body, r#"{"error":"Route does not exist.","path":"/nope"}"#);

        app.set_error_handler(|_: &DispatchError, _: &Request| "swapped");
        assert_eq!(app.handle(Request::new("GET", "/nope")).body, "swapped");
    }

    #[test]
    fn test_media_type() {
        assert_eq!(media_type("Application/JSON; charset=utf-8"), "application/json");
        assert_eq!(media_type("text/plain"), "text/plain");
    }
}
