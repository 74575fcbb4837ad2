//! Markup building.
//!
//! Handlers return an [`Element`] to produce a `text/html` response; the
//! default error handler renders its error page with it.

pub mod element;

pub use element::Element;
