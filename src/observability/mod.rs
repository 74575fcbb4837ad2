//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields
//!       (routing, service, pipeline, app, host)
//!
//! Consumers:
//!     → logging.rs (fmt layer on stdout, filtered by EnvFilter)
//! ```
//!
//! # Design Decisions
//! - The library only emits events; the binary installs the subscriber
//! - `RUST_LOG` overrides the configured level

pub mod logging;
