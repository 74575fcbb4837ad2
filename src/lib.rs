//! Kick: the request-dispatch core of a small file-routed web framework.
//!
//! # Architecture Overview
//!
//! ```text
//!     Request
//!        │
//!        ▼
//!   ┌──────────┐   first lookup   ┌─────────────┐
//!   │  router  │ ───────────────▶ │  discovery  │ ◀── routes directory
//!   └────┬─────┘                  └─────────────┘
//!        │ Route (handler + middleware references)
//!        ▼
//!   ┌──────────┐   load artifacts  ┌──────────────┐
//!   │ pipeline │ ────────────────▶ │ ArtifactLoader│
//!   │ builder  │                   └──────────────┘
//!   └────┬─────┘
//!        │ middleware₁ → … → middlewareₙ → handler
//!        ▼                 (dependencies from the service container)
//!   ┌──────────┐
//!   │   app    │ ── Reply → Response, errors → error handler
//!   └──────────┘
//! ```
//!
//! The core is synchronous and transport-agnostic; [`host`] adapts it to an
//! axum server.

pub mod app;
pub mod config;
pub mod error;
pub mod host;
pub mod http;
pub mod observability;
pub mod pipeline;
pub mod routing;
pub mod service;
pub mod view;

pub use app::Application;
pub use config::KickConfig;
pub use error::{ApplicationError, ContainerError, DispatchError, DispatchResult};
pub use http::{Reply, Request, Response};
pub use pipeline::{handler_fn, middleware_fn, ArtifactRegistry, Next};
pub use routing::{Route, Router};
pub use service::{Container, Provided};
pub use view::Element;
