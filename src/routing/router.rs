//! Route lookup.
//!
//! # Responsibilities
//! - Own the routes directory and its discovered route table
//! - Look up the first route matching a request
//! - Return the matched route or an explicit no-match
//!
//! # Design Decisions
//! - The table is discovered on first use and cached for the router's
//!   lifetime; concurrent first calls scan once
//! - A failed scan is not cached, so the next call retries
//! - An unconfigured router has an empty table and never touches disk
//! - First match in discovery order wins

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::DiscoveryError;
use crate::http::Request;
use crate::routing::discovery::discover;
use crate::routing::route::Route;

/// Matches requests against routes discovered from a directory.
#[derive(Debug, Default)]
pub struct Router {
    path: Option<PathBuf>,
    routes: OnceCell<Arc<[Route]>>,
}

impl Router {
    /// A router with no routes directory. Every request is unrouted.
    pub fn new() -> Self {
        Self::default()
    }

    /// A router backed by the routes directory at `path`.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            routes: OnceCell::new(),
        }
    }

    /// The routes directory, if configured.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_configured(&self) -> bool {
        self.path.is_some()
    }

    /// Returns the route table, scanning the directory on first call.
    /// Later calls return the same cached table.
    pub fn routes(&self) -> Result<Arc<[Route]>, DiscoveryError> {
        let Some(path) = &self.path else {
            return Ok(Arc::from(Vec::new()));
        };
        let routes = self
            .routes
            .get_or_try_init(|| discover(path).map(Arc::from))?;
        Ok(Arc::clone(routes))
    }

    /// Returns the first route accepting `request`, writing its named path
    /// segments to `segments`.
    pub fn match_request(
        &self,
        request: &Request,
        segments: &mut HashMap<String, String>,
    ) -> Result<Option<Route>, DiscoveryError> {
        if !self.is_configured() {
            return Ok(None);
        }
        let routes = self.routes()?;
        Ok(routes
            .iter()
            .find(|route| route.matches(request, segments))
            .cloned())
    }
}
