//! Pipeline construction.
//!
//! # Responsibilities
//! - Load a route's handler and wrap it so its result is normalized
//! - Wrap middleware around it, last declared innermost
//! - Expand service-list artifacts into one link per container service
//!
//! # Design Decisions
//! - The pipeline is built per request from the loader, so artifacts can be
//!   swapped without touching routes
//! - Service-list middleware is resolved while building, not per call
//! - Every link sees the matched route among its provided values

use std::fmt;
use std::sync::Arc;

use crate::error::{ContainerError, DispatchError, DispatchResult};
use crate::http::{Reply, Request, Response};
use crate::pipeline::artifact::{Artifact, ArtifactLoader};
use crate::pipeline::middleware::{Middleware, Next};
use crate::routing::Route;
use crate::service::{Container, Provided};

type Link = Arc<dyn Fn(Request) -> DispatchResult<Response> + Send + Sync>;

/// The composed middleware chain and handler for one route.
pub struct Pipeline {
    route: Arc<Route>,
    entry: Link,
    depth: usize,
}

impl Pipeline {
    /// Runs the request through every middleware and the handler.
    pub fn call(&self, request: Request) -> DispatchResult<Response> {
        (self.entry)(request)
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Number of middleware links around the handler.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("route", &self.route.to_string())
            .field("depth", &self.depth)
            .finish()
    }
}

/// Builds pipelines from routes.
pub struct PipelineBuilder<'a> {
    container: &'a Arc<Container>,
    loader: &'a dyn ArtifactLoader,
}

impl<'a> PipelineBuilder<'a> {
    pub fn new(container: &'a Arc<Container>, loader: &'a dyn ArtifactLoader) -> Self {
        Self { container, loader }
    }

    pub fn build(&self, route: &Route) -> DispatchResult<Pipeline> {
        let route = Arc::new(route.clone());
        let provided = Provided::new().with_arc(Arc::clone(&route));

        let handler = match self.loader.load(route.artifact())? {
            Artifact::Handler(handler) => handler,
            other => {
                tracing::warn!(
                    artifact = route.artifact(),
                    kind = other.kind(),
                    "Route artifact is not a handler"
                );
                return Err(ContainerError::UnsupportedCallable(route.artifact().to_string()).into());
            }
        };

        let container = Arc::clone(self.container);
        let handler_provided = provided.clone();
        let mut entry: Link = Arc::new(move |request: Request| {
            handler
                .call(request, &container, &handler_provided)
                .map(Reply::into_response)
        });

        let mut depth = 0;
        for reference in route.middleware().iter().rev() {
            match self.loader.load(reference)? {
                Artifact::Middleware(middleware) => {
                    entry = self.wrap(middleware, entry, &provided);
                    depth += 1;
                }
                Artifact::Services(services) => {
                    for service in services.iter().rev() {
                        let middleware = service.resolve(self.container)?;
                        entry = self.wrap(middleware, entry, &provided);
                        depth += 1;
                    }
                }
                Artifact::Handler(_) => {
                    return Err(DispatchError::InvalidMiddlewareDefinition(reference.clone()));
                }
            }
        }

        tracing::trace!(route = %route, depth, "Pipeline built");
        Ok(Pipeline { route, entry, depth })
    }

    fn wrap(&self, middleware: Arc<dyn Middleware>, inner: Link, provided: &Provided) -> Link {
        let container = Arc::clone(self.container);
        let provided = provided.clone();
        Arc::new(move |request: Request| {
            middleware
                .handle(request, Next::new(&*inner), &container, &provided)
                .map(Reply::into_response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::artifact::{ArtifactRegistry, MiddlewareService};
    use crate::pipeline::middleware::{handler_fn, middleware_fn};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Trace(Mutex<Vec<String>>);

    impl Trace {
        fn push(&self, step: &str) {
            self.0.lock().unwrap().push(step.to_string());
        }

        fn steps(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    macro_rules! tagging_middleware {
        ($($name:ident),*) => {
            $(
                struct $name;

                impl Middleware for $name {
                    fn handle(
                        &self,
                        request: Request,
                        next: Next<'_>,
                        container: &Container,
                        _: &Provided,
                    ) -> DispatchResult<Reply> {
                        container.resolve::<Trace>()?.push(stringify!($name));
                        next.run(request).map(Reply::from)
                    }
                }
            )*
        };
    }

    tagging_middleware!(Session, Csrf);

    fn recording(name: &'static str) -> impl Middleware {
        middleware_fn(move |req: Request, next: Next<'_>, (trace,): (Arc<Trace>,)| {
            trace.push(name);
            next.run(req)
        })
    }

    fn container() -> Arc<Container> {
        let container = Arc::new(Container::new());
        container.factory(Trace::default);
        container
    }

    #[test]
    fn test_order_outer_to_inner() {
        let container = container();
        let registry = ArtifactRegistry::new()
            .middleware("/__middleware.route", recording("root"))
            .middleware("/users/__middleware.route", recording("users"))
            .handler(
                "/users/index.route",
                handler_fn(|_: Request, (trace,): (Arc<Trace>,)| {
                    trace.push("handler");
                    Ok::<_, DispatchError>("done")
                }),
            );
        let route = Route::new(
            "ANY",
            "/users",
            "/users/index.route",
            vec!["/__middleware.route".into(), "/users/__middleware.route".into()],
        );

        let pipeline = PipelineBuilder::new(&container, &registry).build(&route).unwrap();
        assert_eq!(pipeline.depth(), 2);

        let res = pipeline.call(Request::new("GET", "/users")).unwrap();
        assert_eq!(res.body, "done");
        assert_eq!(
            container.resolve::<Trace>().unwrap().steps(),
            ["root", "users", "handler"]
        );
    }

    #[test]
    fn test_service_list_in_declared_order() {
        let container = container();
        container.literal(Session).literal(Csrf);
        let registry = ArtifactRegistry::new()
            .services(
                "/__middleware.route",
                vec![MiddlewareService::of::<Session>(), MiddlewareService::of::<Csrf>()],
            )
            .handler("/index.route", handler_fn(|_: Request, ()| Ok::<_, DispatchError>("ok")));
        let route = Route::new("ANY", "/", "/index.route", vec!["/__middleware.route".into()]);

        let pipeline = PipelineBuilder::new(&container, &registry).build(&route).unwrap();
        assert_eq!(pipeline.depth(), 2);
        pipeline.call(Request::new("GET", "/")).unwrap();
        assert_eq!(container.resolve::<Trace>().unwrap().steps(), ["Session", "Csrf"]);
    }

    #[test]
    fn test_short_circuit() {
        let container = container();
        let registry = ArtifactRegistry::new()
            .middleware(
                "/__middleware.route",
                middleware_fn(|_: Request, _: Next<'_>, ()| {
                    Ok::<_, DispatchError>(Response::redirect("/login"))
                }),
            )
            .handler(
                "/index.route",
                handler_fn(|_: Request, (trace,): (Arc<Trace>,)| {
                    trace.push("handler");
                    Ok::<_, DispatchError>("unreachable")
                }),
            );
        let route = Route::new("ANY", "/", "/index.route", vec!["/__middleware.route".into()]);

        let res = PipelineBuilder::new(&container, &registry)
            .build(&route)
            .unwrap()
            .call(Request::new("GET", "/"))
            .unwrap();
        assert_eq!(res.status, 302);
        assert_eq!(res.header("location"), Some("/login"));
        assert!(container.resolve::<Trace>().unwrap().steps().is_empty());
    }

    #[test]
    fn test_handler_sees_matched_route() {
        let container = container();
        let registry = ArtifactRegistry::new().handler(
            "/index.GET.route",
            handler_fn(|_: Request, (route,): (Arc<Route>,)| {
                Ok::<_, DispatchError>(route.to_string())
            }),
        );
        let route = Route::new("GET", "/", "/index.GET.route", vec![]);

        let res = PipelineBuilder::new(&container, &registry)
            .build(&route)
            .unwrap()
            .call(Request::new("GET", "/"))
            .unwrap();
        assert_eq!(res.body, "GET  /");
    }

    #[test]
    fn test_invalid_definitions() {
        let container = container();
        let handler = handler_fn(|_: Request, ()| Ok::<_, DispatchError>("ok"));
        let registry = ArtifactRegistry::new()
            .handler("/index.route", handler)
            .middleware("/mw.route", recording("mw"));

        let route = Route::new("ANY", "/", "/index.route", vec!["/index.route".into()]);
        let err = PipelineBuilder::new(&container, &registry).build(&route).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidMiddlewareDefinition(r) if r == "/index.route"));

        let route = Route::new("ANY", "/", "/mw.route", vec![]);
        let err = PipelineBuilder::new(&container, &registry).build(&route).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Container(ContainerError::UnsupportedCallable(_))
        ));

        let route = Route::new("ANY", "/", "/index.route", vec!["/nope.route".into()]);
        let err = PipelineBuilder::new(&container, &registry).build(&route).unwrap_err();
        assert!(matches!(err, DispatchError::ArtifactNotFound(_)));
    }
}
