//! End-to-end dispatch over the fixture site in `tests/fixtures/pages`.

use std::path::PathBuf;
use std::sync::Arc;

use kick::pipeline::{Middleware, MiddlewareService};
use kick::service::{Arguments, Dependency, Injectable};
use kick::view::element::strong;
use kick::{
    handler_fn, middleware_fn, Application, ArtifactRegistry, Container, ContainerError,
    DispatchError, DispatchResult, Next, Provided, Reply, Request, Response,
};
use serde_json::json;

struct ServiceB {
    config: String,
}

struct TestValue(&'static str);

/// Adds `x-test-value` to whatever the rest of the chain returns.
struct TestValueHeader {
    value: Arc<TestValue>,
}

impl Injectable for TestValueHeader {
    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::of::<TestValue>("value")]
    }

    fn construct(args: &Arguments) -> Result<Self, ContainerError> {
        Ok(Self {
            value: args.get("value")?,
        })
    }
}

impl Middleware for TestValueHeader {
    fn handle(
        &self,
        request: Request,
        next: Next<'_>,
        _: &Container,
        _: &Provided,
    ) -> DispatchResult<Reply> {
        let response = next.run(request)?.with_header("x-test-value", self.value.0);
        Ok(response.into())
    }
}

fn pages() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/pages")
}

fn artifacts() -> ArtifactRegistry {
    ArtifactRegistry::new()
        .services(
            "/__middleware.route",
            vec![MiddlewareService::of::<TestValueHeader>()],
        )
        .handler(
            "/index.GET.route",
            handler_fn(|_: Request, (service,): (Arc<ServiceB>,)| {
                Ok::<_, DispatchError>(service.config.clone())
            }),
        )
        .handler(
            "/content/text.GET.route",
            handler_fn(|_: Request, ()| Ok::<_, DispatchError>("Hello, world!")),
        )
        .handler(
            "/content/json.GET.route",
            handler_fn(|_: Request, ()| Ok::<_, DispatchError>(json!({ "foo": "bar" }))),
        )
        .handler(
            "/content/html.GET.route",
            handler_fn(|_: Request, ()| Ok::<_, DispatchError>(strong().child("Hello, world!"))),
        )
        .handler(
            "/posts/_pid/index.GET.route",
            handler_fn(|req: Request, ()| {
                Ok::<_, DispatchError>(format!("post {}", req.segment("pid").unwrap_or_default()))
            }),
        )
        .middleware(
            "/users/__middleware.route",
            middleware_fn(|req: Request, next: Next<'_>, ()| {
                if req.header("authorization").is_none() {
                    return Ok::<_, DispatchError>(Response::redirect("/login"));
                }
                next.run(req)
            }),
        )
        .handler(
            "/users/_uid.GET.route",
            handler_fn(|req: Request, ()| {
                Ok::<_, DispatchError>(format!("user {}", req.segment("uid").unwrap_or_default()))
            }),
        )
}

fn application() -> Application {
    Application::new()
        .with_routes(pages())
        .with_artifacts(artifacts())
        .with_provider(|c| {
            c.literal(ServiceB {
                config: "foobar".into(),
            })
            .literal(TestValue("baz"))
            .autowire::<TestValueHeader>();
        })
}

#[test]
fn test_handle_with_text_response() {
    let res = application().handle(Request::new("GET", "/content/text"));
    assert_eq!(res.header("content-type"), Some("text/plain"));
    assert_eq!(res.body, "Hello, world!");
}

#[test]
fn test_handle_with_json_response() {
    let res = application().handle(Request::new("GET", "/content/json"));
    assert_eq!(res.header("content-type"), Some("application/json"));
    assert_eq!(res.body, r#"{"foo":"bar"}"#);
}

#[test]
fn test_handle_with_html_response() {
    let res = application().handle(Request::new("GET", "/content/html"));
    assert_eq!(res.header("content-type"), Some("text/html"));
    assert_eq!(res.body, "<strong>Hello, world!</strong>");
}

#[test]
fn test_default_error_handler() {
    let res = application().handle(Request::new("GET", "/does-not-exist"));
    assert_eq!(res.status, 404);
    assert_eq!(res.header("content-type"), Some("text/html"));
    assert_eq!(
        res.body,
        "<!DOCTYPE html><html><body><h1>Error</h1><p>Route does not exist.</p></body></html>"
    );
}

#[test]
fn test_custom_error_handler() {
    let app = application().with_error_handler(|e: &DispatchError, _: &Request| json!({ "error": e.to_string() }));

    let res = app.handle(Request::new("GET", "/does-not-exist"));
    assert_eq!(res.header("content-type"), Some("application/json"));
    assert_eq!(res.body, r#"{"error":"Route does not exist."}"#);
}

#[test]
fn test_handler_dependency_injection() {
    let res = application().handle(Request::new("GET", "/"));
    assert_eq!(res.header("content-type"), Some("text/plain"));
    assert_eq!(res.body, "foobar");
}

#[test]
fn test_resolved_middleware() {
    let res = application().handle(Request::new("GET", "/"));
    assert_eq!(res.header("x-test-value"), Some("baz"));
}

#[test]
fn test_stacked_middleware() {
    let app = application();

    let res = app.handle(Request::new("GET", "/users/123"));
    assert_eq!(res.status, 302);
    assert_eq!(res.header("location"), Some("/login"));
    assert_eq!(res.header("x-test-value"), Some("baz"));

    let res = app.handle(Request::new("GET", "/users/123").with_header("Authorization", "Bearer t"));
    assert_eq!(res.body, "user 123");
    assert_eq!(res.header("x-test-value"), Some("baz"));
}

#[test]
fn test_segments_reach_handler() {
    let res = application().handle(Request::new("GET", "/posts/42"));
    assert_eq!(res.body, "post 42");

    let res = application().handle(Request::new("POST", "/posts/42"));
    assert_eq!(res.status, 404);
}

#[test]
fn test_missing_service_is_server_error() {
    let app = Application::new()
        .with_routes(pages())
        .with_artifacts(artifacts())
        .with_provider(|c| {
            c.literal(TestValue("baz")).autowire::<TestValueHeader>();
        });

    let res = app.handle(Request::new("GET", "/").with_header("accept", "application/json"));
    assert_eq!(res.status, 500);
    assert_eq!(res.body, r#"{"message":"An unexpected error occurred."}"#);
}

#[test]
fn test_route_table_is_discovered_once() {
    let app = application();
    let first = app.router().routes().unwrap();
    let second = app.router().routes().unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let table: Vec<String> = first.iter().map(ToString::to_string).collect();
    assert_eq!(
        table,
        [
            "GET  /",
            "GET  /content/html",
            "GET  /content/json",
            "GET  /content/text",
            "GET  /posts/:pid",
            "GET  /users/:uid",
        ]
    );
    assert_eq!(first[5].middleware(), ["/__middleware.route", "/users/__middleware.route"]);
}
