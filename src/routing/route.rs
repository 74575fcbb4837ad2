//! Route table entries.

use std::collections::HashMap;
use std::fmt;

use crate::http::Request;
use crate::routing::matcher::{method_matches, PathPattern};

/// One endpoint: method, URI template, handler artifact and the middleware
/// artifacts wrapping it, outermost first.
///
/// The match pattern is compiled once in [`Route::new`] and never
/// recomputed.
#[derive(Debug, Clone)]
pub struct Route {
    method: String,
    uri: String,
    pattern: PathPattern,
    artifact: String,
    middleware: Vec<String>,
}

impl Route {
    pub fn new(
        method: impl Into<String>,
        uri: impl Into<String>,
        artifact: impl Into<String>,
        middleware: Vec<String>,
    ) -> Self {
        let uri = uri.into();
        let pattern = PathPattern::compile(&uri);
        Self {
            method: method.into(),
            uri,
            pattern,
            artifact: artifact.into(),
            middleware,
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// Reference to the handler artifact.
    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    /// References to middleware artifacts, root-most first.
    pub fn middleware(&self) -> &[String] {
        &self.middleware
    }

    /// Returns true if the route accepts the request. On success the named
    /// path segments are written to `segments`.
    pub fn matches(&self, request: &Request, segments: &mut HashMap<String, String>) -> bool {
        if !method_matches(&self.method, &request.method) {
            return false;
        }
        match self.pattern.captures(&request.path) {
            Some(captured) => {
                *segments = captured;
                true
            }
            None => false,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<4} {}", self.method, self.uri)
    }
}
