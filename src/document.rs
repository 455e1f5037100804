//! Parsed HTML snapshots queried with `select` predicates.
//!
//! Matches come back in document order, so an `Or` of two predicates behaves
//! like a grouped CSS selector.

use crate::util::squash_whitespace;
use select::document::Document as RawDocument;
use select::node::Node;
use select::predicate::{Name, Predicate};
use std::sync::Arc;
use url::Url;

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figure",
    "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol",
    "p", "pre", "section", "table", "tbody", "td", "th", "thead", "tr", "ul",
];

/// Handle to one element inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scope(usize);

/// How a value is read from a matched element.
#[derive(Debug, Clone, PartialEq)]
pub enum Extract {
    /// Whitespace-squashed text content.
    Text,
    /// A single attribute.
    Attr(String),
    /// First non-empty attribute out of the list, e.g. lazy-load `data-src` before `src`.
    FirstAttr(Vec<String>),
}

impl Extract {
    pub fn attr(name: &str) -> Self {
        Self::Attr(name.to_string())
    }

    pub fn first_attr(names: &[&str]) -> Self {
        Self::FirstAttr(names.iter().map(ToString::to_string).collect())
    }

    fn apply(&self, node: &Node) -> Option<String> {
        let value = match self {
            Self::Text => squash_whitespace(&node.text()),
            Self::Attr(name) => node.attr(name)?.trim().to_string(),
            Self::FirstAttr(names) => names
                .iter()
                .filter_map(|name| node.attr(name))
                .map(str::trim)
                .find(|v| !v.is_empty())?
                .to_string(),
        };
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }
}

/// Query capability the extraction stages need from a page.
pub trait Document {
    /// URL the document was loaded from, after redirects.
    fn url(&self) -> &Url;

    /// Elements matching `selector`, in document order. Searches below `within` when given.
    fn scopes(&self, within: Option<Scope>, selector: &Selector) -> Vec<Scope>;

    /// Non-empty values extracted from each element matching `selector`.
    /// An empty selector addresses `within` itself.
    fn values(&self, within: Option<Scope>, selector: &Selector, extract: &Extract) -> Vec<String>;

    /// Text of one element.
    fn scope_text(&self, scope: Scope) -> String;

    /// Next element sibling of `scope`.
    fn next_sibling(&self, scope: Scope) -> Option<Scope>;

    /// Rendered-ish text of the whole body, one line per block element.
    fn body_text(&self) -> String;
}

/// A parsed HTML page.
pub struct HtmlDocument {
    url: Url,
    raw: RawDocument,
}

impl HtmlDocument {
    pub fn parse(url: Url, html: &str) -> Self {
        Self {
            url,
            raw: RawDocument::from(html),
        }
    }

    fn node(&self, scope: Scope) -> Option<Node> {
        self.raw.nth(scope.0)
    }
}

impl Document for HtmlDocument {
    fn url(&self) -> &Url {
        &self.url
    }

    fn scopes(&self, within: Option<Scope>, selector: &Selector) -> Vec<Scope> {
        match within {
            Some(scope) if selector.is_empty() => vec![scope],
            Some(scope) => match self.node(scope) {
                Some(node) => node.find(selector).map(|n| Scope(n.index())).collect(),
                None => Vec::new(),
            },
            None => self.raw.find(selector).map(|n| Scope(n.index())).collect(),
        }
    }

    fn values(&self, within: Option<Scope>, selector: &Selector, extract: &Extract) -> Vec<String> {
        self.scopes(within, selector)
            .into_iter()
            .filter_map(|scope| self.node(scope))
            .filter_map(|node| extract.apply(&node))
            .collect()
    }

    fn scope_text(&self, scope: Scope) -> String {
        self.node(scope)
            .map(|node| squash_whitespace(&node.text()))
            .unwrap_or_default()
    }

    fn next_sibling(&self, scope: Scope) -> Option<Scope> {
        let mut cur = self.node(scope)?.next();
        while let Some(node) = cur {
            if node.name().is_some() {
                return Some(Scope(node.index()));
            }
            cur = node.next();
        }
        None
    }

    fn body_text(&self) -> String {
        let mut out = String::new();
        match self.raw.find(Name("body")).next() {
            Some(body) => push_block_text(&body, &mut out),
            None => {
                for node in self.raw.find(Name("html")).take(1) {
                    push_block_text(&node, &mut out);
                }
            }
        }
        out.lines()
            .map(squash_whitespace)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn push_block_text(node: &Node, out: &mut String) {
    for child in node.children() {
        if let Some(text) = child.as_text() {
            out.push_str(text);
            continue;
        }
        match child.name() {
            Some("script") | Some("style") | Some("noscript") => {}
            Some(name) if BLOCK_ELEMENTS.contains(&name) => {
                out.push('\n');
                push_block_text(&child, out);
                out.push('\n');
            }
            Some(_) => push_block_text(&child, out),
            None => {}
        }
    }
}

/// Matches an element with no element sibling before it, like `:first-child`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FirstChild;

impl Predicate for FirstChild {
    fn matches(&self, node: &Node) -> bool {
        node.name().is_some() && !has_element_sibling(node, Node::prev)
    }
}

/// Matches an element with no element sibling after it, like `:last-child`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LastChild;

impl Predicate for LastChild {
    fn matches(&self, node: &Node) -> bool {
        node.name().is_some() && !has_element_sibling(node, Node::next)
    }
}

fn has_element_sibling<'a>(node: &Node<'a>, step: fn(&Node<'a>) -> Option<Node<'a>>) -> bool {
    let mut cur = step(node);
    while let Some(sibling) = cur {
        if sibling.name().is_some() {
            return true;
        }
        cur = step(&sibling);
    }
    false
}

/// A `select` predicate behind a shared handle, so one cascade can hold
/// differently-typed predicates. The empty selector addresses the current scope itself.
#[derive(Clone, Default)]
pub struct Selector(Option<Arc<dyn Predicate + Send + Sync>>);

impl Selector {
    pub fn new<P: Predicate + Send + Sync + 'static>(predicate: P) -> Self {
        Self(Some(Arc::new(predicate)))
    }

    pub fn this() -> Self {
        Self(None)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

impl std::fmt::Debug for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.0 {
            Some(_) => f.write_str("Selector(..)"),
            None => f.write_str("Selector(this)"),
        }
    }
}

impl<'s> Predicate for &'s Selector {
    fn matches(&self, node: &Node) -> bool {
        self.0.as_ref().map_or(false, |p| p.matches(node))
    }
}
