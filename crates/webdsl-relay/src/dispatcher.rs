//! Command dispatch inside the relay context.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use webdsl_dom::{Dom, ElementHandle, ElementLocator, Point};
use webdsl_protocols::{DispatchReply, FailureKind, RelayError, StepError};

use crate::highlight::Highlighter;
use crate::prompt::LabelPrompt;

/// The page's DOM as the relay shares it with the highlighter.
pub type SharedDom = Arc<Mutex<dyn Dom>>;

/// Commands the relay executes itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Click,
    Type,
    Wait,
    GrabElement,
}

impl Primitive {
    pub const ALL: [Primitive; 4] = [
        Primitive::Click,
        Primitive::Type,
        Primitive::Wait,
        Primitive::GrabElement,
    ];

    /// Case-insensitive lookup.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Primitive::Click => "click",
            Primitive::Type => "type",
            Primitive::Wait => "wait",
            Primitive::GrabElement => "grabElement",
        }
    }
}

/// Markup and label of a grabbed element, the selection endpoint's body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrabbedElement {
    pub element_html: String,
    pub element_name: String,
}

/// Where grabbed elements are reported.
#[async_trait]
pub trait SelectionReporter: Send + Sync {
    async fn report(&self, grabbed: &GrabbedElement) -> Result<(), RelayError>;
}

/// Executes `{ command, params }` against the DOM.
pub struct CommandDispatcher {
    dom: SharedDom,
    highlighter: Arc<Highlighter>,
    pointer: Mutex<Option<Point>>,
    session: Mutex<CancellationToken>,
    prompt: Option<Arc<dyn LabelPrompt>>,
    reporter: Option<Arc<dyn SelectionReporter>>,
}

impl CommandDispatcher {
    pub fn new(dom: SharedDom, highlight: Duration) -> Self {
        let highlighter = Arc::new(Highlighter::new(dom.clone(), highlight));
        Self {
            dom,
            highlighter,
            pointer: Mutex::new(None),
            session: Mutex::new(CancellationToken::new()),
            prompt: None,
            reporter: None,
        }
    }

    pub fn with_prompt(mut self, prompt: Arc<dyn LabelPrompt>) -> Self {
        self.prompt = Some(prompt);
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn SelectionReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn highlighter(&self) -> &Arc<Highlighter> {
        &self.highlighter
    }

    /// Whether `name` is one of the relay's own commands.
    pub fn supports(name: &str) -> bool {
        Primitive::parse(name).is_some()
    }

    /// Remember the last pointer-down position for `grabElement`.
    pub fn record_pointer(&self, point: Point) {
        *self.pointer.lock() = Some(point);
    }

    pub fn last_pointer(&self) -> Option<Point> {
        *self.pointer.lock()
    }

    /// Cancel pending waits and highlights of the current session and put
    /// every highlighted element back to its original style.
    pub fn reset_session(&self) {
        let old = std::mem::replace(&mut *self.session.lock(), CancellationToken::new());
        old.cancel();
        self.highlighter.restore_all();
        debug!("Relay session reset");
    }

    pub async fn dispatch(&self, command: &str, params: &[String]) -> DispatchReply {
        debug!("Dispatching {} {:?}", command, params);
        let reply = match Primitive::parse(command) {
            Some(Primitive::Click) => self.click(params),
            Some(Primitive::Type) => self.type_text(params),
            Some(Primitive::Wait) => self.wait(params).await,
            Some(Primitive::GrabElement) => match self.grab_element().await {
                Ok(grabbed) => {
                    DispatchReply::success(format!("Grabbed element '{}'", grabbed.element_name))
                }
                Err(e) => failure(e),
            },
            None => DispatchReply::failure(
                FailureKind::DispatchFailure,
                format!("Unknown command: {}", command),
            ),
        };
        if !reply.success {
            info!("{} failed: {}", command, reply.message);
        }
        reply
    }

    /// Grab the element under the last pointer-down position, ask for a label
    /// and report it.
    pub async fn grab_element(&self) -> Result<GrabbedElement, StepError> {
        let point = self
            .last_pointer()
            .ok_or_else(|| StepError::DispatchFailure("No pointer position recorded".to_string()))?;

        // Serialize before the prompt: the page may change while it is open.
        let element_html = {
            let dom = self.dom.lock();
            let element = dom.element_at(point).ok_or_else(|| {
                StepError::LocatorMiss(format!("No element at ({}, {})", point.x, point.y))
            })?;
            dom.outer_html(element)
                .map_err(|e| StepError::DispatchFailure(e.to_string()))?
        };

        let element_name = match &self.prompt {
            Some(prompt) => prompt
                .ask_label(&element_html)
                .await
                .map_err(|e| StepError::UserCancelled(e.to_string()))?,
            None => String::new(),
        };

        let grabbed = GrabbedElement {
            element_html,
            element_name,
        };
        if let Some(reporter) = &self.reporter {
            reporter
                .report(&grabbed)
                .await
                .map_err(|e| StepError::RelayFailure(e.to_string()))?;
        }
        info!("Grabbed element '{}'", grabbed.element_name);
        Ok(grabbed)
    }

    fn click(&self, params: &[String]) -> DispatchReply {
        let Some(selector) = params.first() else {
            return DispatchReply::failure(FailureKind::DispatchFailure, "click requires a selector");
        };
        let element = match self.locate(selector) {
            Ok(element) => element,
            Err(reply) => return reply,
        };
        self.highlight(element);

        match self.dom.lock().click(element) {
            Ok(()) => DispatchReply::success(format!("Clicked element: {}", selector)),
            Err(e) => DispatchReply::failure(FailureKind::DispatchFailure, e.to_string()),
        }
    }

    fn type_text(&self, params: &[String]) -> DispatchReply {
        let Some((selector, words)) = params.split_first() else {
            return DispatchReply::failure(FailureKind::DispatchFailure, "type requires a selector");
        };
        let text = words.join(" ");
        let element = match self.locate(selector) {
            Ok(element) => element,
            Err(reply) => return reply,
        };
        self.highlight(element);

        match self.dom.lock().set_value(element, &text) {
            Ok(()) => DispatchReply::success(format!("Typed '{}' into {}", text, selector)),
            Err(e) => DispatchReply::failure(FailureKind::DispatchFailure, e.to_string()),
        }
    }

    /// Missing or unparsable seconds count as zero. Spans too long for a
    /// `Duration` saturate.
    async fn wait(&self, params: &[String]) -> DispatchReply {
        let seconds = params
            .first()
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or(0.0);

        let session = self.session.lock().clone();
        tokio::select! {
            _ = tokio::time::sleep(Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)) => {}
            _ = session.cancelled() => debug!("wait cut short by session reset"),
        }
        DispatchReply::success(format!("Waited {} seconds", seconds))
    }

    fn locate(&self, selector: &str) -> Result<ElementHandle, DispatchReply> {
        let dom = self.dom.lock();
        ElementLocator::locate(&*dom, selector)
            .map(|located| located.element)
            .ok_or_else(|| {
                DispatchReply::failure(
                    FailureKind::LocatorMiss,
                    format!("Element not found: {}", selector),
                )
            })
    }

    fn highlight(&self, element: ElementHandle) {
        let session = self.session.lock().clone();
        if let Err(e) = self.highlighter.flash(element, session) {
            warn!("Highlight failed: {}", e);
        }
    }
}

fn failure(error: StepError) -> DispatchReply {
    let kind = error.kind();
    let message = match error {
        StepError::LocatorMiss(m)
        | StepError::DispatchFailure(m)
        | StepError::RelayFailure(m)
        | StepError::UserCancelled(m) => m,
    };
    DispatchReply::failure(kind, message)
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
