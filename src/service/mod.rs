//! Service container and dependency resolution.
//!
//! # Data Flow
//! ```text
//! provider hooks (at startup)
//!     → container.rs (literal / factory / autowire registrations)
//!
//! handler or middleware invocation
//!     → resolve.rs (parameter tuple: provided values first)
//!     → container.rs (literal → memoized factory → autowired constructor)
//!     → key.rs (TypeId-keyed lookup)
//! ```

pub mod container;
pub mod key;
pub mod resolve;

pub use container::Container;
pub use key::{Service, ServiceKey};
pub use resolve::{Arguments, Dependency, Injectable, Provided, Resolve};

pub use crate::error::ContainerError;
