//! DOM access for webdsl.
//!
//! The [`Dom`] trait is the seam between the relay and the live page. The
//! [`ElementLocator`] resolves a selector string to one element through an
//! ordered fallback chain, and [`StaticDocument`] implements [`Dom`] over a
//! parsed HTML document.
//!
//! ## Locator order
//!
//! 1. exact `id`
//! 2. `name` attribute
//! 3. class name (first match)
//! 4. tag name (first match)
//! 5. CSS selector (first match)

mod document;
mod error;
mod locator;
mod traits;
mod types;

pub use document::StaticDocument;
pub use error::DomError;
pub use locator::{ElementLocator, LocateStrategy, Located};
pub use traits::Dom;
pub use types::{BoundingBox, ElementHandle, Point};
