//! Ordered fallback element locator.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::traits::Dom;
use crate::types::ElementHandle;

/// One lookup strategy of the locator chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocateStrategy {
    Id,
    Name,
    ClassName,
    TagName,
    Selector,
}

impl std::fmt::Display for LocateStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocateStrategy::Id => write!(f, "id"),
            LocateStrategy::Name => write!(f, "name"),
            LocateStrategy::ClassName => write!(f, "class"),
            LocateStrategy::TagName => write!(f, "tag"),
            LocateStrategy::Selector => write!(f, "selector"),
        }
    }
}

/// An element found by the locator and the strategy that found it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Located {
    pub element: ElementHandle,
    pub strategy: LocateStrategy,
}

/// Resolves a selector string to a single element.
///
/// Strategies run from most to least specific and the first hit wins, so an
/// element with a matching `id` is preferred over a CSS match elsewhere.
pub struct ElementLocator;

impl ElementLocator {
    /// Strategies in the order they are tried.
    pub const ORDER: [LocateStrategy; 5] = [
        LocateStrategy::Id,
        LocateStrategy::Name,
        LocateStrategy::ClassName,
        LocateStrategy::TagName,
        LocateStrategy::Selector,
    ];

    /// Locate `selector` in `dom`. `None` only when every strategy misses.
    pub fn locate(dom: &dyn Dom, selector: &str) -> Option<Located> {
        let selector = selector.trim();
        if selector.is_empty() {
            return None;
        }

        let found = Self::ORDER.iter().find_map(|&strategy| {
            Self::try_strategy(dom, strategy, selector).map(|element| Located { element, strategy })
        });

        match found {
            Some(located) => debug!("Located '{}' by {}", selector, located.strategy),
            None => debug!("No element matches '{}'", selector),
        }
        found
    }

    /// Run a single strategy.
    pub fn try_strategy(dom: &dyn Dom, strategy: LocateStrategy, selector: &str) -> Option<ElementHandle> {
        match strategy {
            LocateStrategy::Id => dom.element_by_id(selector),
            LocateStrategy::Name => dom.element_by_name(selector),
            LocateStrategy::ClassName => dom.element_by_class(selector),
            LocateStrategy::TagName => dom.element_by_tag(selector),
            LocateStrategy::Selector => match dom.query_selector(selector) {
                Ok(found) => found,
                Err(e) => {
                    trace!("Selector strategy skipped: {}", e);
                    None
                }
            },
        }
    }
}
