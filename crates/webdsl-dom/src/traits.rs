//! The DOM seam.

use crate::error::DomError;
use crate::types::{ElementHandle, Point};

/// Access to the live page, as the relay context sees it.
///
/// Lookups return the first match in document order. Mutations are the only
/// way the page changes on behalf of a script.
pub trait Dom: Send + Sync {
    /// Element whose `id` equals `id` exactly.
    fn element_by_id(&self, id: &str) -> Option<ElementHandle>;

    /// First element whose `name` attribute equals `name`.
    fn element_by_name(&self, name: &str) -> Option<ElementHandle>;

    /// First element carrying every class in the whitespace separated `class`.
    fn element_by_class(&self, class: &str) -> Option<ElementHandle>;

    /// First element with tag `tag` (case-insensitive, `*` matches any).
    fn element_by_tag(&self, tag: &str) -> Option<ElementHandle>;

    /// First element matching the CSS selector.
    fn query_selector(&self, selector: &str) -> Result<Option<ElementHandle>, DomError>;

    /// Topmost element under a viewport point.
    fn element_at(&self, point: Point) -> Option<ElementHandle>;

    fn click(&mut self, element: ElementHandle) -> Result<(), DomError>;

    fn set_value(&mut self, element: ElementHandle, value: &str) -> Result<(), DomError>;

    /// Current inline outline style, `None` when unset.
    fn outline(&self, element: ElementHandle) -> Result<Option<String>, DomError>;

    fn set_outline(&mut self, element: ElementHandle, outline: Option<String>) -> Result<(), DomError>;

    /// Serialized markup of the element.
    fn outer_html(&self, element: ElementHandle) -> Result<String, DomError>;
}
