//! Transient element highlighting.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};
use webdsl_dom::{DomError, ElementHandle};

use crate::dispatcher::SharedDom;

/// Outline put on an element while a command acts on it.
pub const HIGHLIGHT_OUTLINE: &str = "2px solid red";

struct Lit {
    original: Option<String>,
    holders: usize,
    generation: u64,
}

/// Outlines elements for a short time and puts their style back.
///
/// Overlapping highlights of one element share a single saved outline, so the
/// element ends with the style it had before the first of them.
pub struct Highlighter {
    dom: SharedDom,
    linger: Duration,
    lit: Mutex<HashMap<ElementHandle, Lit>>,
    generation: AtomicU64,
}

impl Highlighter {
    pub fn new(dom: SharedDom, linger: Duration) -> Self {
        Self {
            dom,
            linger,
            lit: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn linger(&self) -> Duration {
        self.linger
    }

    /// Highlight `element` and schedule its release after the linger time,
    /// or as soon as `session` is cancelled.
    pub fn flash(self: &Arc<Self>, element: ElementHandle, session: CancellationToken) -> Result<(), DomError> {
        let generation = self.apply(element)?;
        if self.linger.is_zero() {
            self.release(element, generation);
            return Ok(());
        }

        let this = Arc::clone(self);
        let linger = self.linger;
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(linger) => {}
                _ = session.cancelled() => {}
            }
            this.release(element, generation);
        });
        Ok(())
    }

    /// Put the original style back on every highlighted element now.
    /// Releases scheduled before this call become no-ops.
    pub fn restore_all(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut lit = self.lit.lock();
        for (element, entry) in lit.drain() {
            self.restore(element, entry.original);
        }
    }

    pub fn is_lit(&self, element: ElementHandle) -> bool {
        self.lit.lock().contains_key(&element)
    }

    pub fn lit_count(&self) -> usize {
        self.lit.lock().len()
    }

    fn apply(&self, element: ElementHandle) -> Result<u64, DomError> {
        let generation = self.generation.load(Ordering::SeqCst);
        let mut lit = self.lit.lock();
        if let Some(entry) = lit.get_mut(&element) {
            entry.holders += 1;
            return Ok(entry.generation);
        }

        let mut dom = self.dom.lock();
        let original = dom.outline(element)?;
        dom.set_outline(element, Some(HIGHLIGHT_OUTLINE.to_string()))?;
        trace!("Highlighted element {}", element.raw());
        lit.insert(
            element,
            Lit {
                original,
                holders: 1,
                generation,
            },
        );
        Ok(generation)
    }

    fn release(&self, element: ElementHandle, generation: u64) {
        let mut lit = self.lit.lock();
        let Some(entry) = lit.get_mut(&element) else {
            return;
        };
        if entry.generation != generation {
            return;
        }
        entry.holders -= 1;
        if entry.holders > 0 {
            return;
        }
        if let Some(entry) = lit.remove(&element) {
            self.restore(element, entry.original);
        }
    }

    fn restore(&self, element: ElementHandle, original: Option<String>) {
        if let Err(e) = self.dom.lock().set_outline(element, original) {
            warn!("Failed to restore outline of element {}: {}", element.raw(), e);
        }
    }
}
