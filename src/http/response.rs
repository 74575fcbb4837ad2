//! Response data model.
//!
//! A response is produced whole by a handler, middleware or the error
//! handler and handed to the transport as status, headers and body.

use std::collections::BTreeMap;

use serde::Serialize;

/// One or many values for a single header name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    One(String),
    Many(Vec<String>),
}

impl HeaderValue {
    /// Iterates the values in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let values: &[String] = match self {
            HeaderValue::One(v) => std::slice::from_ref(v),
            HeaderValue::Many(vs) => vs,
        };
        values.iter().map(String::as_str)
    }

    /// The first value.
    pub fn first(&self) -> Option<&str> {
        self.iter().next()
    }
}

impl From<&str> for HeaderValue {
    fn from(v: &str) -> Self {
        HeaderValue::One(v.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(v: String) -> Self {
        HeaderValue::One(v)
    }
}

impl From<Vec<String>> for HeaderValue {
    fn from(vs: Vec<String>) -> Self {
        HeaderValue::Many(vs)
    }
}

/// An outbound response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: BTreeMap<String, HeaderValue>,
    pub body: String,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: 200,
            headers: BTreeMap::new(),
            body: String::new(),
        }
    }
}

impl Response {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            ..Default::default()
        }
    }

    /// A response with the given content type.
    pub fn with_content_type(status: u16, content_type: &str, body: impl Into<String>) -> Self {
        Self::new(status, body).with_header("content-type", content_type)
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::with_content_type(status, "text/plain", body)
    }

    pub fn html(status: u16, body: impl Into<String>) -> Self {
        Self::with_content_type(status, "text/html", body)
    }

    /// Serializes `value` as the JSON body. Values that fail to serialize
    /// produce `null`.
    pub fn json<T: Serialize + ?Sized>(value: &T, status: u16) -> Self {
        let body = serde_json::to_string(value).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to serialize JSON response");
            "null".to_string()
        });
        Self::with_content_type(status, "application/json", body)
    }

    /// A `302 Found` pointing at `location`.
    pub fn redirect(location: &str) -> Self {
        Self::new(302, "").with_header("location", location)
    }

    /// Sets a header, replacing any previous value.
    pub fn with_header(mut self, name: &str, value: impl Into<HeaderValue>) -> Self {
        self.headers.insert(name.to_lowercase(), value.into());
        self
    }

    /// Adds a value to a header, keeping existing ones.
    pub fn append_header(&mut self, name: &str, value: impl Into<String>) {
        let name = name.to_lowercase();
        let value = value.into();
        let merged = match self.headers.remove(&name) {
            None => HeaderValue::One(value),
            Some(HeaderValue::One(existing)) => HeaderValue::Many(vec![existing, value]),
            Some(HeaderValue::Many(mut existing)) => {
                existing.push(value);
                HeaderValue::Many(existing)
            }
        };
        self.headers.insert(name, merged);
    }

    /// First value of a header.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_lowercase())
            .and_then(HeaderValue::first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_response() {
        let res = Response::json(&serde_json::json!({"foo": "bar"}), 201);
        assert_eq!(res.status, 201);
        assert_eq!(res.header("Content-Type"), Some("application/json"));
        assert_eq!(res.body, r#"{"foo":"bar"}"#);
    }

    #[test]
    fn test_append_header() {
        let mut res = Response::default();
        assert_eq!(res.status, 200);
        res.append_header("Set-Cookie", "a=1");
        res.append_header("set-cookie", "b=2");
        let values: Vec<&str> = res.headers["set-cookie"].iter().collect();
        assert_eq!(values, vec!["a=1", "b=2"]);
        assert_eq!(res.header("set-cookie"), Some("a=1"));
    }
}
