//! Request pipeline.
//!
//! # Data Flow
//! ```text
//! matched Route
//!     → builder.rs (load handler, wrap middleware last → first)
//!     → artifact.rs (reference → handler / middleware / service list)
//!     → middleware.rs (Next chain, dependency tuples resolved per call)
//!     → Response
//! ```
//!
//! # Design Decisions
//! - The first declared middleware is the outermost link
//! - Any link may short-circuit by not calling `next`
//! - Handler and middleware results are normalized to `Response` at each link

pub mod artifact;
pub mod builder;
pub mod middleware;

pub use artifact::{Artifact, ArtifactLoader, ArtifactRegistry, MiddlewareService};
pub use builder::{Pipeline, PipelineBuilder};
pub use middleware::{handler_fn, middleware_fn, Handler, HandlerFn, Middleware, MiddlewareFn, Next};
