//! Request data model.
//!
//! # Responsibilities
//! - Carry method, path, query, headers and body for one inbound call
//! - Parse the body into structured data by content type
//! - Receive named path segments from the router
//!
//! # Design Decisions
//! - Header names are normalized once at construction (lower-case, `-`-joined)
//! - Only `segments` is written after construction, by route matching
//! - `data` follows the body and the content type whichever is set last
//! - Body parsing never fails: undecodable bodies yield empty data

use std::collections::HashMap;

use serde_json::{Map, Value};

/// Header naming the body's media type.
pub const CONTENT_TYPE: &str = "content-type";

/// An inbound request as seen by the dispatch core.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Request {
    pub method: String,
    pub path: String,
    /// Named path segments captured by the matched route.
    pub segments: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    pub body: String,
    /// Structured body data.
    pub data: Map<String, Value>,
}

impl Request {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    /// Builds a request from transport-level parts.
    ///
    /// `uri` may carry a query string, which is form-decoded into `query`.
    /// The body is decoded as JSON when the content type says so and as a
    /// form otherwise.
    pub fn from_parts<I, K, V>(method: &str, uri: &str, headers: I, body: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, query),
            None => (uri, ""),
        };
        let path = if path.is_empty() { "/" } else { path };

        let headers: HashMap<String, String> = headers
            .into_iter()
            .map(|(k, v)| (normalize_header(k.as_ref()), v.into()))
            .collect();

        let body = body.into();
        let data = parse_body(headers.get(CONTENT_TYPE).map(String::as_str), &body);

        Self {
            method: method.to_uppercase(),
            path: path.to_string(),
            segments: HashMap::new(),
            query: parse_form(query).into_iter().collect(),
            headers,
            body,
            data,
        }
    }

    /// Sets a header. Setting the content type re-parses `data` from a body
    /// that is already present.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let name = normalize_header(name);
        let reparse = name == CONTENT_TYPE && !self.body.is_empty();
        self.headers.insert(name, value.into());
        if reparse {
            self.data = parse_body(self.header(CONTENT_TYPE), &self.body);
        }
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Sets the raw body and re-parses `data` from it.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self.data = parse_body(self.header(CONTENT_TYPE), &self.body);
        self
    }

    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = data;
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&normalize_header(name)).map(String::as_str)
    }

    /// Looks a value up in body data, then the query string, then the path
    /// segments.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(v) = self.data.get(name) {
            return Some(v.clone());
        }
        self.query
            .get(name)
            .or_else(|| self.segments.get(name))
            .map(|v| Value::String(v.clone()))
    }

    /// Path segment captured by the matched route.
    pub fn segment(&self, name: &str) -> Option<&str> {
        self.segments.get(name).map(String::as_str)
    }
}

/// Lower-cases a header name and joins words with `-`.
pub fn normalize_header(name: &str) -> String {
    name.trim().to_lowercase().replace('_', "-")
}

fn parse_form(input: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(input.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn parse_body(content_type: Option<&str>, body: &str) -> Map<String, Value> {
    let media_type = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_lowercase());

    match media_type.as_deref() {
        Some("application/json") => match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(map)) => map,
            Ok(_) => Map::new(),
            Err(e) => {
                tracing::debug!(error = %e, "Discarding undecodable JSON body");
                Map::new()
            }
        },
        _ => parse_form(body)
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_parts_splits_query() {
        let req = Request::from_parts(
            "get",
            "/search?q=rust+lang&page=2",
            [("Accept", "text/plain"), ("X_Custom_Header", "1")],
            "",
        );
        assert_eq!(req.method, "GET");
        assert_eq!(req.path, "/search");
        assert_eq!(req.query.get("q").map(String::as_str), Some("rust lang"));
        assert_eq!(req.query.get("page").map(String::as_str), Some("2"));
        assert_eq!(req.header("accept"), Some("text/plain"));
        assert_eq!(req.headers.get("x-custom-header").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_empty_path_defaults_to_root() {
        let req = Request::from_parts("GET", "?a=1", Vec::<(&str, &str)>::new(), "");
        assert_eq!(req.path, "/");
    }

    #[test]
    fn test_json_body() {
        let req = Request::from_parts(
            "POST",
            "/users",
            [("Content-Type", "application/json; charset=utf-8")],
            r#"{"name":"ada","age":36}"#,
        );
        assert_eq!(req.data.get("name"), Some(&json!("ada")));
        assert_eq!(req.data.get("age"), Some(&json!(36)));

        let req = Request::from_parts(
            "POST",
            "/users",
            [("Content-Type", "application/json")],
            "[1,2,3]",
        );
        assert!(req.data.is_empty());
    }

    #[test]
    fn test_form_body() {
        let req = Request::new("POST", "/login").with_body("user=ada&remember=on");
        assert_eq!(req.data.get("user"), Some(&json!("ada")));
        assert_eq!(req.body, "user=ada&remember=on");
    }

    #[test]
    fn test_content_type_after_body() {
        let req = Request::new("POST", "/users")
            .with_body(r#"{"name":"ada"}"#)
            .with_header("Content-Type", "application/json");
        assert_eq!(req.data.get("name"), Some(&json!("ada")));
        assert_eq!(req.data.len(), 1);

        let req = Request::new("POST", "/users")
            .with_data(Map::from_iter([("kept".to_string(), json!(true))]))
            .with_header("content-type", "application/json");
        assert_eq!(req.data.get("kept"), Some(&json!(true)));
    }

    #[test]
    fn test_get_precedence() {
        let mut req = Request::new("GET", "/posts/1")
            .with_query("id", "from-query")
            .with_query("page", "3");
        req.segments.insert("id".into(), "from-segment".into());
        req.segments.insert("pid".into(), "1".into());
        req.data.insert("id".into(), json!("from-data"));

        assert_eq!(req.get("id"), Some(json!("from-data")));
        assert_eq!(req.get("page"), Some(json!("3")));
        assert_eq!(req.get("pid"), Some(json!("1")));
        assert_eq!(req.get("missing"), None);
    }
}
