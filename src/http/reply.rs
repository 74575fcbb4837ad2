//! Handler results and their normalization into responses.

use serde_json::Value;

use crate::http::response::Response;
use crate::view::Element;

/// The value a handler, middleware or error handler produces.
///
/// Anything that is not already a [`Response`] is normalized:
/// markup renders as `text/html`, structured data as `application/json`,
/// and text as `text/plain`.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Response(Response),
    Html(Element),
    Json(Value),
    Text(String),
}

impl Reply {
    pub fn into_response(self) -> Response {
        match self {
            Reply::Response(res) => res,
            Reply::Html(el) => Response::html(200, el.render()),
            Reply::Json(value) => Response::json(&value, 200),
            Reply::Text(text) => Response::text(200, text),
        }
    }
}

impl From<Reply> for Response {
    fn from(reply: Reply) -> Self {
        reply.into_response()
    }
}

impl From<Response> for Reply {
    fn from(res: Response) -> Self {
        Reply::Response(res)
    }
}

impl From<Element> for Reply {
    fn from(el: Element) -> Self {
        Reply::Html(el)
    }
}

/// Arrays and objects are JSON. Scalars are plain text: a string as is,
/// `null` as an empty body, numbers and booleans in their JSON spelling.
impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(_) | Value::Object(_) => Reply::Json(value),
            Value::String(text) => Reply::Text(text),
            Value::Null => Reply::Text(String::new()),
            scalar => Reply::Text(scalar.to_string()),
        }
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Reply::Text(text)
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        Reply::Text(text.to_string())
    }
}
