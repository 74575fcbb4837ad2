//! HTTP data model shared by the core and the host.
//!
//! # Data Flow
//! ```text
//! transport request
//!     → request.rs (Request::from_parts: query, headers, body data)
//!     → [app dispatches through the pipeline]
//!     → reply.rs (normalize handler results)
//!     → response.rs (status, headers, body)
//!     → transport response
//! ```

pub mod reply;
pub mod request;
pub mod response;

pub use reply::Reply;
pub use request::Request;
pub use response::{HeaderValue, Response};
