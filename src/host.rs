//! HTTP host for an [`Application`].
//!
//! # Responsibilities
//! - Accept connections and read each request into the core's `Request`
//! - Run the synchronous dispatcher off the async workers
//! - Write status, headers and body back to the client
//! - Tag every exchange with a request ID
//!
//! # Design Decisions
//! - A single fallback handler; routing belongs to the application
//! - Bodies are buffered up to a configured limit before dispatch
//! - Non-UTF-8 bodies are decoded lossily
//! - Headers the transport cannot represent are dropped with a warning

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    extract::{Request as HttpRequest, State},
    http::{HeaderName, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response as HttpResponse},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::app::{Application, UNEXPECTED_ERROR};
use crate::config::ServerConfig;
use crate::http::{Request, Response};

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Transport limits applied by the host.
#[derive(Debug, Clone, Copy)]
pub struct HostOptions {
    pub request_timeout: Duration,
    pub max_body_bytes: usize,
}

impl From<&ServerConfig> for HostOptions {
    fn from(config: &ServerConfig) -> Self {
        Self {
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            max_body_bytes: config.max_body_bytes,
        }
    }
}

impl Default for HostOptions {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

#[derive(Clone)]
struct HostState {
    app: Arc<Application>,
    max_body_bytes: usize,
}

/// Builds the axum router that forwards every request to `app`.
pub fn router(app: Arc<Application>, options: HostOptions) -> Router {
    let state = HostState {
        app,
        max_body_bytes: options.max_body_bytes,
    };

    Router::new()
        .fallback(dispatch)
        .with_state(state)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            options.request_timeout,
        ))
        .layer(middleware::from_fn(request_id))
        .layer(TraceLayer::new_for_http())
}

/// Serves `app` on `listener` until Ctrl+C.
pub async fn serve(
    app: Arc<Application>,
    listener: TcpListener,
    options: HostOptions,
) -> std::io::Result<()> {
    serve_with_shutdown(app, listener, options, shutdown_signal()).await
}

/// Serves `app` on `listener` until `shutdown` completes.
pub async fn serve_with_shutdown<F>(
    app: Arc<Application>,
    listener: TcpListener,
    options: HostOptions,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(
        address = %addr,
        request_timeout_secs = options.request_timeout.as_secs(),
        "HTTP server starting"
    );

    axum::serve(listener, router(app, options))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for Ctrl+C");
        return;
    }
    tracing::info!("Shutdown signal received");
}

async fn dispatch(State(state): State<HostState>, request: HttpRequest) -> HttpResponse {
    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(
                limit = state.max_body_bytes,
                error = %err,
                "Rejected request body"
            );
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let uri = parts.uri.path_and_query().map_or("/", |pq| pq.as_str());
    let headers = parts
        .headers
        .iter()
        .filter_map(|(name, value)| Some((name.as_str(), value.to_str().ok()?.to_string())));
    let request = Request::from_parts(
        parts.method.as_str(),
        uri,
        headers,
        String::from_utf8_lossy(&bytes).into_owned(),
    );

    let app = Arc::clone(&state.app);
    match tokio::task::spawn_blocking(move || app.handle(request)).await {
        Ok(response) => into_http(response),
        Err(err) => {
            tracing::error!(error = %err, "Dispatch task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, UNEXPECTED_ERROR).into_response()
        }
    }
}

/// Converts a core response, writing one header line per value.
fn into_http(response: Response) -> HttpResponse {
    let Response {
        status,
        headers,
        body,
    } = response;

    let mut out = HttpResponse::new(Body::from(body));
    *out.status_mut() = StatusCode::from_u16(status).unwrap_or_else(|_| {
        tracing::warn!(status, "Invalid response status");
        StatusCode::INTERNAL_SERVER_ERROR
    });

    for (name, values) in &headers {
        let Ok(header) = HeaderName::try_from(name.as_str()) else {
            tracing::warn!(header = %name, "Dropped invalid response header name");
            continue;
        };
        for value in values.iter() {
            match HeaderValue::from_str(value) {
                Ok(value) => {
                    out.headers_mut().append(header.clone(), value);
                }
                Err(_) => tracing::warn!(header = %name, "Dropped invalid response header value"),
            }
        }
    }
    out
}

async fn request_id(mut request: HttpRequest, next: Next) -> HttpResponse {
    let id = request
        .headers()
        .get(X_REQUEST_ID)
        .cloned()
        .unwrap_or_else(|| {
            HeaderValue::from_str(&Uuid::new_v4().to_string())
                .unwrap_or_else(|_| HeaderValue::from_static("unknown"))
        });
    request.headers_mut().insert(X_REQUEST_ID, id.clone());

    let mut response = next.run(request).await;
    response.headers_mut().insert(X_REQUEST_ID, id);
    response
}
