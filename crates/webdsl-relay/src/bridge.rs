//! Page side of the relay bridge.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, trace, warn};
use webdsl_protocols::{
    ExtensionEnvelope, FetchOptions, Origin, PageCall, PageEnvelope, RelayError, RequestId,
    WindowMessage,
};

use crate::bus::WindowBus;

/// How the page reaches the relay.
#[async_trait]
pub trait PageChannel: Send + Sync {
    /// Send a call and wait for its reply.
    async fn call(&self, call: PageCall) -> Result<Value, RelayError>;

    /// Send a call that is never answered.
    fn post(&self, call: PageCall);
}

type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value, RelayError>>>>>;

/// Request/response correlation over the [`WindowBus`].
///
/// Each call gets a fresh request id and waits on its own oneshot, so
/// overlapping calls resolve independently. Replies for another origin, for
/// an unknown id or of a non-reply type are ignored.
pub struct PageBridge {
    bus: WindowBus,
    origin: Origin,
    request_id: AtomicU64,
    pending: Pending,
    timeout: Option<Duration>,
    listener: tokio::task::JoinHandle<()>,
}

impl PageBridge {
    /// Attach a bridge to `bus`. Must be called inside a tokio runtime.
    pub fn connect(bus: WindowBus) -> Self {
        Self::connect_as(bus, Origin::new())
    }

    pub fn connect_as(bus: WindowBus, origin: Origin) -> Self {
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let listener = {
            let rx = bus.subscribe();
            let pending = pending.clone();
            let origin = origin.clone();
            tokio::spawn(async move {
                Self::receive_loop(rx, origin, pending).await;
            })
        };
        debug!("Page bridge {} connected", origin.as_str());

        Self {
            bus,
            origin,
            request_id: AtomicU64::new(1),
            pending,
            timeout: None,
            listener,
        }
    }

    /// Reject calls left unanswered for longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Calls still waiting for a reply.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    pub async fn fetch_api(&self, endpoint: &str, options: FetchOptions) -> Result<Value, RelayError> {
        self.call(PageCall::FetchApi {
            endpoint: endpoint.to_string(),
            options,
        })
        .await
    }

    pub async fn execute_command(&self, command: &str, params: Vec<String>) -> Result<Value, RelayError> {
        self.call(PageCall::ExecuteCommand {
            command: command.to_string(),
            params,
        })
        .await
    }

    async fn receive_loop(mut rx: broadcast::Receiver<WindowMessage>, origin: Origin, pending: Pending) {
        loop {
            match rx.recv().await {
                Ok(WindowMessage::FromExtension(ExtensionEnvelope {
                    request_id,
                    origin: to,
                    content,
                })) => {
                    if to != origin {
                        trace!("Ignoring reply for {}", to.as_str());
                        continue;
                    }
                    let waiter = pending.lock().remove(&request_id.0);
                    match waiter {
                        Some(tx) => {
                            let _ = tx.send(content.into_result());
                        }
                        None => trace!("Ignoring reply for unknown request {}", request_id),
                    }
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Page bridge lagged, {} messages skipped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Window bus closed");
                    break;
                }
            }
        }
        // Dropping the senders rejects everything still waiting.
        pending.lock().clear();
    }

    fn next_id(&self) -> RequestId {
        RequestId(self.request_id.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl PageChannel for PageBridge {
    async fn call(&self, call: PageCall) -> Result<Value, RelayError> {
        let id = self.next_id();
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id.0, tx);
        let _entry = PendingEntry {
            pending: &self.pending,
            id: id.0,
        };

        debug!("Page call {} -> {:?}", id, call);
        self.bus.post(WindowMessage::FromPage(PageEnvelope {
            request_id: id,
            origin: self.origin.clone(),
            call,
        }));

        let Some(limit) = self.timeout else {
            return rx.await.map_err(|_| RelayError::ChannelClosed)?;
        };
        match tokio::time::timeout(limit, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(RelayError::ChannelClosed),
            Err(_) => Err(timed_out(id, limit)),
        }
    }

    fn post(&self, call: PageCall) {
        let id = self.next_id();
        self.bus.post(WindowMessage::FromPage(PageEnvelope {
            request_id: id,
            origin: self.origin.clone(),
            call,
        }));
    }
}

fn timed_out(id: RequestId, limit: Duration) -> RelayError {
    RelayError::Timeout {
        request_id: id.0,
        after_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
    }
}

/// Removes a call's pending entry once the call finishes or is dropped.
struct PendingEntry<'a> {
    pending: &'a Pending,
    id: u64,
}

impl Drop for PendingEntry<'_> {
    fn drop(&mut self) {
        self.pending.lock().remove(&self.id);
    }
}

impl Drop for PageBridge {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

#[cfg(test)]
#[path = "bridge_tests.rs"]
mod tests;
