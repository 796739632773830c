//! Wiring of the relay and broker contexts for one page.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;
use webdsl_config::Config;

use crate::backend::Backend;
use crate::bridge::PageBridge;
use crate::broker::{Broker, BrokerHandle};
use crate::bus::WindowBus;
use crate::dispatcher::{CommandDispatcher, SharedDom};
use crate::prompt::LabelPrompt;
use crate::relay::{RelayContext, RelayHandle};

const DEFAULT_HIGHLIGHT_MS: u64 = 500;
const DEFAULT_SELECTION_ENDPOINT: &str = "/v1/connectors/browser/update_selected_element/";

/// Builder for the extension side of a page.
///
/// # Example
///
/// ```rust,ignore
/// let contexts = BrowserExtension::new(dom, Arc::new(MemoryBackend::new()))
///     .highlight(Duration::from_millis(200))
///     .launch();
/// let bridge = contexts.page_bridge();
/// ```
pub struct BrowserExtension {
    dom: SharedDom,
    backend: Arc<dyn Backend>,
    bus: WindowBus,
    highlight: Duration,
    request_timeout: Option<Duration>,
    selection_endpoint: String,
    prompt: Option<Arc<dyn LabelPrompt>>,
    prompt_for_label: bool,
}

impl BrowserExtension {
    pub fn new(dom: SharedDom, backend: Arc<dyn Backend>) -> Self {
        Self {
            dom,
            backend,
            bus: WindowBus::new(),
            highlight: Duration::from_millis(DEFAULT_HIGHLIGHT_MS),
            request_timeout: None,
            selection_endpoint: DEFAULT_SELECTION_ENDPOINT.to_string(),
            prompt: None,
            prompt_for_label: true,
        }
    }

    /// Apply the `[relay]` and `[backend]` settings. With
    /// `relay.prompt_for_label` off, grabbed elements are reported unlabelled.
    pub fn configure(mut self, config: &Config) -> Self {
        self.highlight = config.relay.highlight();
        self.request_timeout = config.relay.request_timeout();
        self.selection_endpoint = config.backend.selection_endpoint.clone();
        self.prompt_for_label = config.relay.prompt_for_label;
        self
    }

    pub fn bus(mut self, bus: WindowBus) -> Self {
        self.bus = bus;
        self
    }

    pub fn highlight(mut self, linger: Duration) -> Self {
        self.highlight = linger;
        self
    }

    pub fn request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn selection_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.selection_endpoint = endpoint.into();
        self
    }

    pub fn label_prompt(mut self, prompt: Arc<dyn LabelPrompt>) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// Spawn the broker and relay tasks. Must be called inside a tokio runtime.
    pub fn launch(self) -> ExtensionContexts {
        let shutdown = CancellationToken::new();

        let (broker, client) = Broker::channel(self.backend);
        let mut dispatcher = CommandDispatcher::new(self.dom, self.highlight)
            .with_reporter(Arc::new(client.reporter(self.selection_endpoint)));
        if let (Some(prompt), true) = (self.prompt, self.prompt_for_label) {
            dispatcher = dispatcher.with_prompt(prompt);
        }
        let dispatcher = Arc::new(dispatcher);

        let (relay, relay_handle) = RelayContext::new(self.bus.clone(), dispatcher.clone(), client.clone());
        let broker_task = tokio::spawn(broker.run(shutdown.clone()));
        let relay_task = tokio::spawn(relay.run(shutdown.clone()));
        info!("Extension contexts launched");

        ExtensionContexts {
            bus: self.bus,
            broker: BrokerHandle::new(client, relay_handle.clone()),
            relay: relay_handle,
            dispatcher,
            request_timeout: self.request_timeout,
            shutdown,
            tasks: vec![broker_task, relay_task],
        }
    }
}

/// Running relay and broker contexts. Dropping this stops them.
pub struct ExtensionContexts {
    bus: WindowBus,
    broker: BrokerHandle,
    relay: RelayHandle,
    dispatcher: Arc<CommandDispatcher>,
    request_timeout: Option<Duration>,
    shutdown: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl ExtensionContexts {
    /// A new page-side bridge attached to this page's bus.
    pub fn page_bridge(&self) -> PageBridge {
        PageBridge::connect(self.bus.clone()).with_timeout(self.request_timeout)
    }

    pub fn bus(&self) -> &WindowBus {
        &self.bus
    }

    pub fn broker(&self) -> &BrokerHandle {
        &self.broker
    }

    pub fn relay(&self) -> &RelayHandle {
        &self.relay
    }

    pub fn dispatcher(&self) -> &Arc<CommandDispatcher> {
        &self.dispatcher
    }

    /// Stop both contexts and wait for them to finish.
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }
        info!("Extension contexts stopped");
    }
}

impl Drop for ExtensionContexts {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
#[path = "extension_tests.rs"]
mod tests;
