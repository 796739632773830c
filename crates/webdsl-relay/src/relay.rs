//! Relay context: answers page calls and runtime messages.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use webdsl_dom::Point;
use webdsl_protocols::{
    ExtensionEnvelope, FailureKind, PageCall, PageEnvelope, RelayError, ReplyContent,
    RuntimeMessage, WindowMessage,
};

use crate::broker::BrokerClient;
use crate::bus::WindowBus;
use crate::dispatcher::CommandDispatcher;

const INBOX_CAPACITY: usize = 64;

/// Messages delivered to the relay outside the window bus.
#[derive(Debug)]
pub enum RelayInbound {
    /// A runtime message from the broker side.
    Runtime {
        message: RuntimeMessage,
        reply: oneshot::Sender<ReplyContent>,
    },
    /// The user pressed the pointer on the page.
    PointerDown(Point),
}

/// Sender half of the relay inbox.
#[derive(Clone)]
pub struct RelayHandle {
    tx: mpsc::Sender<RelayInbound>,
}

impl RelayHandle {
    pub async fn send(&self, message: RuntimeMessage) -> Result<ReplyContent, RelayError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(RelayInbound::Runtime { message, reply })
            .await
            .map_err(|_| RelayError::ChannelClosed)?;
        rx.await.map_err(|_| RelayError::ChannelClosed)
    }

    pub async fn pointer_down(&self, point: Point) -> Result<(), RelayError> {
        self.tx
            .send(RelayInbound::PointerDown(point))
            .await
            .map_err(|_| RelayError::ChannelClosed)
    }
}

/// Relay actor.
///
/// `executeCommand` calls go to the [`CommandDispatcher`], `fetchAPI` calls
/// to the broker and `resetSession` cancels the session's pending cosmetic
/// work. Every answered call is handled on its own task and answered on the
/// bus with the caller's request id and origin.
pub struct RelayContext {
    bus: WindowBus,
    window: broadcast::Receiver<WindowMessage>,
    inbox: mpsc::Receiver<RelayInbound>,
    dispatcher: Arc<CommandDispatcher>,
    broker: BrokerClient,
}

impl RelayContext {
    pub fn new(bus: WindowBus, dispatcher: Arc<CommandDispatcher>, broker: BrokerClient) -> (Self, RelayHandle) {
        let (tx, inbox) = mpsc::channel(INBOX_CAPACITY);
        let window = bus.subscribe();
        let relay = Self {
            bus,
            window,
            inbox,
            dispatcher,
            broker,
        };
        (relay, RelayHandle { tx })
    }

    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("Relay started");
        self.bus.post(WindowMessage::InitUi);

        let mut inbox_open = true;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                message = self.window.recv() => match message {
                    Ok(WindowMessage::FromPage(envelope)) => self.handle_page(envelope),
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Relay lagged, {} window messages skipped", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                inbound = self.inbox.recv(), if inbox_open => match inbound {
                    Some(RelayInbound::Runtime { message, reply }) => self.handle_runtime(message, reply),
                    Some(RelayInbound::PointerDown(point)) => self.dispatcher.record_pointer(point),
                    None => inbox_open = false,
                },
            }
        }
        self.dispatcher.reset_session();
        info!("Relay stopped");
    }

    fn handle_page(&self, envelope: PageEnvelope) {
        let PageEnvelope {
            request_id,
            origin,
            call,
        } = envelope;
        debug!("Relay received {} from {}", request_id, origin.as_str());

        let dispatcher = self.dispatcher.clone();
        let broker = self.broker.clone();
        let bus = self.bus.clone();
        match call {
            PageCall::ResetSession => dispatcher.reset_session(),
            PageCall::ExecuteCommand { command, params } => {
                tokio::spawn(async move {
                    let reply = dispatcher.dispatch(&command, &params).await;
                    bus.post(WindowMessage::FromExtension(ExtensionEnvelope {
                        request_id,
                        origin,
                        content: reply.into(),
                    }));
                });
            }
            PageCall::FetchApi { endpoint, options } => {
                tokio::spawn(async move {
                    let result = broker.fetch_api(&endpoint, options).await;
                    bus.post(WindowMessage::FromExtension(ExtensionEnvelope {
                        request_id,
                        origin,
                        content: result.into(),
                    }));
                });
            }
        }
    }

    fn handle_runtime(&self, message: RuntimeMessage, reply: oneshot::Sender<ReplyContent>) {
        let dispatcher = self.dispatcher.clone();
        let broker = self.broker.clone();
        tokio::spawn(async move {
            let content = match message {
                RuntimeMessage::GrabElement => match dispatcher.grab_element().await {
                    Ok(grabbed) => match serde_json::to_value(&grabbed) {
                        Ok(data) => ReplyContent::ok(data),
                        Err(e) => ReplyContent::failed(FailureKind::DispatchFailure, e.to_string()),
                    },
                    Err(e) => ReplyContent::failed(e.kind(), e.to_string()),
                },
                RuntimeMessage::ExecuteCommand { command, params } => {
                    dispatcher.dispatch(&command, &params).await.into()
                }
                RuntimeMessage::FetchApi { endpoint, options } => {
                    broker.fetch_api(&endpoint, options).await.into()
                }
            };
            let _ = reply.send(content);
        });
    }
}
