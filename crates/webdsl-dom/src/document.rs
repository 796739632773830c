//! In-memory document backed by parsed HTML.

use std::path::Path;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::error::DomError;
use crate::traits::Dom;
use crate::types::{BoundingBox, ElementHandle, Point};

/// Tags whose value can be set by `type`.
const EDITABLE_TAGS: [&str; 3] = ["input", "textarea", "select"];

/// Mutable state of one element.
#[derive(Debug, Clone, Default)]
struct ElementState {
    value: Option<String>,
    outline: Option<String>,
    clicks: u32,
    bounds: Option<BoundingBox>,
}

/// Static attributes of one element, captured at parse time.
#[derive(Debug, Clone)]
struct ElementNode {
    tag: String,
    id: Option<String>,
    name: Option<String>,
    classes: Vec<String>,
    editable: bool,
    markup: String,
    state: ElementState,
}

impl ElementNode {
    fn from_ref(element: ElementRef<'_>) -> Self {
        let value = element.value();
        let tag = value.name().to_ascii_lowercase();
        let editable = EDITABLE_TAGS.contains(&tag.as_str())
            || value.attr("contenteditable").is_some_and(|v| v != "false");

        Self {
            id: value.id().map(str::to_string),
            name: value.attr("name").map(str::to_string),
            classes: value.classes().map(str::to_string).collect(),
            editable,
            markup: element.html(),
            state: ElementState {
                value: value.attr("value").map(str::to_string),
                ..ElementState::default()
            },
            tag,
        }
    }
}

/// A [`Dom`] over an HTML document.
///
/// Structure is fixed at parse time; values, outlines, click counts and
/// layout boxes are tracked per element. There is no layout engine, so
/// hit testing only sees elements given a box with [`set_bounds`].
///
/// [`set_bounds`]: StaticDocument::set_bounds
#[derive(Debug, Clone)]
pub struct StaticDocument {
    source: String,
    elements: Vec<ElementNode>,
}

impl StaticDocument {
    /// Parse an HTML document.
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);
        let elements = elements_in_order(&document)
            .map(ElementNode::from_ref)
            .collect::<Vec<_>>();

        debug!("Parsed document with {} elements", elements.len());

        Self {
            source: html.to_string(),
            elements,
        }
    }

    /// Read and parse an HTML file.
    pub fn from_file(path: &Path) -> Result<Self, DomError> {
        let html = std::fs::read_to_string(path)?;
        Ok(Self::parse(&html))
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Lowercase tag name of an element.
    pub fn tag_name(&self, element: ElementHandle) -> Option<&str> {
        self.node(element).ok().map(|n| n.tag.as_str())
    }

    /// Current value of a form element.
    pub fn value(&self, element: ElementHandle) -> Option<&str> {
        self.node(element).ok().and_then(|n| n.state.value.as_deref())
    }

    pub fn click_count(&self, element: ElementHandle) -> u32 {
        self.node(element).map(|n| n.state.clicks).unwrap_or(0)
    }

    /// Give an element a layout box so [`Dom::element_at`] can find it.
    pub fn set_bounds(&mut self, element: ElementHandle, bounds: BoundingBox) -> Result<(), DomError> {
        self.node_mut(element)?.state.bounds = Some(bounds);
        Ok(())
    }

    fn node(&self, element: ElementHandle) -> Result<&ElementNode, DomError> {
        usize::try_from(element.raw())
            .ok()
            .and_then(|i| self.elements.get(i))
            .ok_or(DomError::StaleHandle(element.raw()))
    }

    fn node_mut(&mut self, element: ElementHandle) -> Result<&mut ElementNode, DomError> {
        usize::try_from(element.raw())
            .ok()
            .and_then(|i| self.elements.get_mut(i))
            .ok_or(DomError::StaleHandle(element.raw()))
    }

    fn first(&self, pred: impl Fn(&ElementNode) -> bool) -> Option<ElementHandle> {
        self.elements
            .iter()
            .position(pred)
            .map(|i| ElementHandle::new(i as u64))
    }
}

/// Elements of a parsed document in tree order, `<html>` first.
fn elements_in_order(document: &Html) -> impl Iterator<Item = ElementRef<'_>> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
}

impl Dom for StaticDocument {
    fn element_by_id(&self, id: &str) -> Option<ElementHandle> {
        self.first(|n| n.id.as_deref() == Some(id))
    }

    fn element_by_name(&self, name: &str) -> Option<ElementHandle> {
        self.first(|n| n.name.as_deref() == Some(name))
    }

    fn element_by_class(&self, class: &str) -> Option<ElementHandle> {
        let wanted: Vec<&str> = class.split_whitespace().collect();
        if wanted.is_empty() {
            return None;
        }
        self.first(|n| wanted.iter().all(|w| n.classes.iter().any(|c| c == w)))
    }

    fn element_by_tag(&self, tag: &str) -> Option<ElementHandle> {
        if tag == "*" {
            return self.first(|_| true);
        }
        self.first(|n| n.tag.eq_ignore_ascii_case(tag))
    }

    fn query_selector(&self, selector: &str) -> Result<Option<ElementHandle>, DomError> {
        let parsed = Selector::parse(selector)
            .map_err(|e| DomError::InvalidSelector(format!("{}: {:?}", selector, e)))?;

        // Structure never changes after parsing, so a fresh parse yields the
        // same tree order as `elements`.
        let document = Html::parse_document(&self.source);
        let Some(target) = document.select(&parsed).next() else {
            return Ok(None);
        };

        Ok(elements_in_order(&document)
            .position(|e| e.id() == target.id())
            .map(|i| ElementHandle::new(i as u64)))
    }

    fn element_at(&self, point: Point) -> Option<ElementHandle> {
        // Later elements in tree order are nested deeper or painted later.
        self.elements
            .iter()
            .rposition(|n| n.state.bounds.is_some_and(|b| b.contains(point)))
            .map(|i| ElementHandle::new(i as u64))
    }

    fn click(&mut self, element: ElementHandle) -> Result<(), DomError> {
        let node = self.node_mut(element)?;
        node.state.clicks += 1;
        debug!("Clicked <{}> ({} clicks)", node.tag, node.state.clicks);
        Ok(())
    }

    fn set_value(&mut self, element: ElementHandle, value: &str) -> Result<(), DomError> {
        let node = self.node_mut(element)?;
        if !node.editable {
            return Err(DomError::Unsupported {
                tag: node.tag.clone(),
                action: "set value".to_string(),
            });
        }
        node.state.value = Some(value.to_string());
        Ok(())
    }

    fn outline(&self, element: ElementHandle) -> Result<Option<String>, DomError> {
        Ok(self.node(element)?.state.outline.clone())
    }

    fn set_outline(&mut self, element: ElementHandle, outline: Option<String>) -> Result<(), DomError> {
        self.node_mut(element)?.state.outline = outline;
        Ok(())
    }

    fn outer_html(&self, element: ElementHandle) -> Result<String, DomError> {
        Ok(self.node(element)?.markup.clone())
    }
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
