//! HTML element builder.
//!
//! Elements render to markup through `Display`. Text children and attribute
//! values are escaped; nested elements are rendered as-is.

use std::fmt;

/// Tags that never have children and render self-closed.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrValue {
    Text(String),
    Flag,
}

/// A child of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Element(Element),
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Node::Text(text.to_string())
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Node::Text(text)
    }
}

/// An HTML element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    void: bool,
    attributes: Vec<(String, AttrValue)>,
    children: Vec<Node>,
}

impl Element {
    /// Creates an element; void-ness is derived from the tag name.
    pub fn new(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        let void = VOID_TAGS.contains(&tag.as_str());
        Self {
            tag,
            void,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Sets an attribute. Names are lower-cased with `_` turned into `-`, so
    /// `x_show` renders as `x-show`. Setting a name twice keeps the last value.
    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(normalize_attr(name), AttrValue::Text(value.into()));
        self
    }

    /// Sets an attribute verbatim, for names such as `@click` that must not be
    /// normalized.
    pub fn raw_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name.to_string(), AttrValue::Text(value.into()));
        self
    }

    /// Sets a valueless boolean attribute such as `disabled`.
    pub fn flag(mut self, name: &str) -> Self {
        self.set(normalize_attr(name), AttrValue::Flag);
        self
    }

    /// Appends a child. Children of void elements are never rendered.
    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn children<I, N>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        self.children.extend(nodes.into_iter().map(Into::into));
        self
    }

    /// Renders the element to a string.
    pub fn render(&self) -> String {
        self.to_string()
    }

    fn set(&mut self, name: String, value: AttrValue) {
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }
}

fn normalize_attr(name: &str) -> String {
    name.replace('_', "-").to_lowercase()
}

/// Escapes `&`, `<`, `>`, `"` and `'` for use in text and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tag == "html" {
            f.write_str("<!DOCTYPE html>")?;
        }
        write!(f, "<{}", self.tag)?;
        for (name, value) in &self.attributes {
            match value {
                AttrValue::Flag => write!(f, " {}", name)?,
                AttrValue::Text(v) => write!(f, " {}=\"{}\"", name, escape(v))?,
            }
        }
        if self.void {
            return f.write_str("/>");
        }
        f.write_str(">")?;
        for child in &self.children {
            match child {
                Node::Text(text) => f.write_str(&escape(text))?,
                Node::Element(el) => write!(f, "{}", el)?,
            }
        }
        write!(f, "</{}>", self.tag)
    }
}

macro_rules! tags {
    ($($name:ident),* $(,)?) => {
        $(
            #[doc = concat!("Creates a `<", stringify!($name), ">` element.")]
            pub fn $name() -> Element {
                Element::new(stringify!($name))
            }
        )*
    };
}

tags!(
    a, article, body, br, button, code, div, em, footer, form, h1, h2, h3, head, header, hr, html,
    img, input, label, li, link, main, meta, nav, ol, p, pre, section, span, strong, table, td,
    th, title, tr, ul,
);
