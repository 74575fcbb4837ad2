//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Discovery (first lookup):
//!     routes directory
//!     → discovery.rs (walk tree, file names → routes, inherit middleware)
//!     → route.rs (compile URI templates once)
//!     → cached, immutable route table
//!
//! Incoming Request (method, path)
//!     → router.rs (scan table in discovery order)
//!     → matcher.rs (method check, anchored pattern, named segments)
//!     → Return: matched Route or no match
//! ```
//!
//! # Design Decisions
//! - Routes discovered once, immutable afterwards
//! - Deterministic: entries sorted, same tree always yields the same table
//! - First match wins

pub mod discovery;
pub mod matcher;
pub mod route;
pub mod router;

pub use route::Route;
pub use router::Router;
