//! URI template compilation and matching.
//!
//! # Responsibilities
//! - Compile a URI template (`/posts/:pid`) into an anchored pattern
//! - Match request methods, with `ANY` as the wildcard
//! - Extract named segments from a matching path
//!
//! # Design Decisions
//! - Templates compile once, when the route is constructed
//! - Placeholders capture one or more word characters
//! - Only named captures are reported; positional groups are dropped

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// Method that matches every request method.
pub const ANY_METHOD: &str = "ANY";

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":(\w+)").expect("placeholder pattern is valid"));

/// A compiled URI template.
#[derive(Debug, Clone)]
pub struct PathPattern {
    regex: Regex,
}

impl PathPattern {
    /// Compiles `template`. Literal text is escaped and every `:name`
    /// placeholder becomes a named capture.
    pub fn compile(template: &str) -> Self {
        let mut pattern = String::from("^");
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(template) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            pattern.push_str(&regex::escape(&template[last..whole.start()]));
            pattern.push_str(&format!(r"(?P<{}>\w+)", name.as_str()));
            last = whole.end();
        }
        pattern.push_str(&regex::escape(&template[last..]));
        pattern.push('$');

        // Escaped literals and `\w` placeholder names always form a valid
        // pattern; a duplicate placeholder name is the only way to fail.
        let regex = Regex::new(&pattern).unwrap_or_else(|e| {
            tracing::warn!(template, error = %e, "Invalid route template, route will never match");
            Regex::new(r"[^\s\S]").expect("empty-match pattern is valid")
        });
        Self { regex }
    }

    /// The compiled pattern source.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Matches `path`, returning its named segments on success.
    pub fn captures(&self, path: &str) -> Option<HashMap<String, String>> {
        let caps = self.regex.captures(path)?;
        let segments = self
            .regex
            .capture_names()
            .flatten()
            .filter_map(|name| {
                caps.name(name)
                    .map(|m| (name.to_string(), m.as_str().to_string()))
            })
            .collect();
        Some(segments)
    }
}

/// Returns true if a route declared for `route_method` accepts
/// `request_method`.
pub fn method_matches(route_method: &str, request_method: &str) -> bool {
    route_method == ANY_METHOD || route_method == request_method
}
