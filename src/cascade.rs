//! Selector cascades: ordered extraction strategies, most site-specific first.
//! A cascade that finds nothing is a valid "field absent" outcome, never an error.

use crate::document::{Document, Extract, Scope, Selector};
use select::predicate::Predicate;

/// One extraction attempt: where to look and what to read.
#[derive(Debug, Clone)]
pub struct Strategy {
    pub selector: Selector,
    pub extract: Extract,
}

impl Strategy {
    pub fn new<P: Predicate + Send + Sync + 'static>(predicate: P, extract: Extract) -> Self {
        Self {
            selector: Selector::new(predicate),
            extract,
        }
    }

    pub fn text<P: Predicate + Send + Sync + 'static>(predicate: P) -> Self {
        Self::new(predicate, Extract::Text)
    }

    pub fn attr<P: Predicate + Send + Sync + 'static>(predicate: P, attr: &str) -> Self {
        Self::new(predicate, Extract::attr(attr))
    }

    /// Reads the scope element itself.
    pub fn this(extract: Extract) -> Self {
        Self {
            selector: Selector::this(),
            extract,
        }
    }
}

/// Ordered list of strategies for one field.
#[derive(Debug, Clone, Default)]
pub struct Cascade {
    strategies: Vec<Strategy>,
}

impl Cascade {
    pub fn new(strategies: Vec<Strategy>) -> Self {
        Self { strategies }
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    /// Every value produced by the first strategy that produces any.
    pub fn resolve<D: Document + ?Sized>(&self, doc: &D, within: Option<Scope>) -> Vec<String> {
        for (i, strategy) in self.strategies.iter().enumerate() {
            let values = doc.values(within, &strategy.selector, &strategy.extract);
            if !values.is_empty() {
                log::trace!("cascade hit on strategy {} ({} values)", i, values.len());
                return values;
            }
        }
        Vec::new()
    }

    /// First value of [`Cascade::resolve`].
    pub fn resolve_one<D: Document + ?Sized>(&self, doc: &D, within: Option<Scope>) -> Option<String> {
        self.resolve(doc, within).into_iter().next()
    }
}

impl std::iter::FromIterator<Strategy> for Cascade {
    fn from_iter<I: IntoIterator<Item = Strategy>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Ordered list of container locators, e.g. alternative chapter-list markups.
#[derive(Debug, Clone, Default)]
pub struct ScopeCascade {
    selectors: Vec<Selector>,
}

impl ScopeCascade {
    pub fn new(selectors: Vec<Selector>) -> Self {
        Self { selectors }
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    /// Elements matched by the first selector that matches anything.
    pub fn resolve<D: Document + ?Sized>(&self, doc: &D, within: Option<Scope>) -> Vec<Scope> {
        for (i, selector) in self.selectors.iter().enumerate() {
            let scopes = doc.scopes(within, selector);
            if !scopes.is_empty() {
                log::trace!("scope cascade hit on selector {} ({} elements)", i, scopes.len());
                return scopes;
            }
        }
        Vec::new()
    }
}
