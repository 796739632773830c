//! Relay and broker contexts for webdsl.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   WindowBus    ┌──────────────────┐    mpsc     ┌──────────────┐    HTTP    ┌─────────┐
//! │  PageBridge  │ ◄────────────► │  RelayContext    │ ◄─────────► │    Broker    │ ─────────► │ Backend │
//! │ (page side)  │  FROM_PAGE /   │ CommandDispatcher│  fetchAPI / │              │            │         │
//! └──────────────┘  FROM_EXTENSION│ + DOM            │  grabElement└──────────────┘            └─────────┘
//!                                 └──────────────────┘
//! ```
//!
//! Each context runs as its own tokio task and owns its state. The page
//! reaches the DOM and the network only through [`PageBridge`] calls, which
//! are correlated by request id.

mod backend;
mod bridge;
mod broker;
mod bus;
mod dispatcher;
mod error;
mod extension;
mod highlight;
mod memory_backend;
mod prompt;
mod relay;

pub use backend::{Backend, HttpBackend};
pub use bridge::{PageBridge, PageChannel};
pub use broker::{Broker, BrokerClient, BrokerHandle, BrokerReporter};
pub use bus::WindowBus;
pub use dispatcher::{CommandDispatcher, GrabbedElement, Primitive, SelectionReporter, SharedDom};
pub use error::BackendError;
pub use extension::{BrowserExtension, ExtensionContexts};
pub use highlight::{Highlighter, HIGHLIGHT_OUTLINE};
pub use memory_backend::{MemoryBackend, SelectedElement};
pub use prompt::{CancelPrompt, FixedLabel, LabelPrompt, PromptCancelled};
pub use relay::{RelayContext, RelayHandle, RelayInbound};
