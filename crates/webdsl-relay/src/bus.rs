//! The page's window message bus.

use tokio::sync::broadcast;
use tracing::trace;
use webdsl_protocols::WindowMessage;

const DEFAULT_CAPACITY: usize = 256;

/// Broadcast bus shared by everything attached to one page.
///
/// Every subscriber sees every message, including the ones it posted itself,
/// so receivers filter by message type, origin and request id.
#[derive(Clone)]
pub struct WindowBus {
    tx: broadcast::Sender<WindowMessage>,
}

impl WindowBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Post a message. Returns the number of subscribers that will see it.
    pub fn post(&self, message: WindowMessage) -> usize {
        trace!("window post: {:?}", message);
        self.tx.send(message).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WindowMessage> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for WindowBus {
    fn default() -> Self {
        Self::new()
    }
}
