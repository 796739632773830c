//! Broker context: the only place that reaches the backend.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use webdsl_protocols::{FailureKind, FetchOptions, RelayError, ReplyContent, RuntimeMessage};

use crate::backend::Backend;
use crate::dispatcher::{GrabbedElement, SelectionReporter};
use crate::relay::RelayHandle;

const CHANNEL_CAPACITY: usize = 64;

pub(crate) struct FetchRequest {
    endpoint: String,
    options: FetchOptions,
    reply: oneshot::Sender<ReplyContent>,
}

/// Broker actor. Each `fetchAPI` request is served on its own task so a slow
/// call never delays the others.
pub struct Broker {
    backend: Arc<dyn Backend>,
    rx: mpsc::Receiver<FetchRequest>,
}

impl Broker {
    /// Create the broker and the client the relay uses to reach it.
    pub fn channel(backend: Arc<dyn Backend>) -> (Self, BrokerClient) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        (Self { backend, rx }, BrokerClient { tx })
    }

    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("Broker started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                request = self.rx.recv() => {
                    let Some(request) = request else { break };
                    let backend = self.backend.clone();
                    tokio::spawn(async move {
                        let content = match backend.fetch(&request.endpoint, &request.options).await {
                            Ok(data) => ReplyContent::ok(data),
                            Err(e) => {
                                warn!("fetchAPI {} failed: {}", request.endpoint, e);
                                ReplyContent::failed(FailureKind::RelayFailure, e.to_string())
                            }
                        };
                        let _ = request.reply.send(content);
                    });
                }
            }
        }
        info!("Broker stopped");
    }
}

/// Relay side of the broker channel.
#[derive(Clone)]
pub struct BrokerClient {
    tx: mpsc::Sender<FetchRequest>,
}

impl BrokerClient {
    pub async fn fetch_api(&self, endpoint: &str, options: FetchOptions) -> Result<Value, RelayError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(FetchRequest {
                endpoint: endpoint.to_string(),
                options,
                reply,
            })
            .await
            .map_err(|_| RelayError::ChannelClosed)?;
        rx.await.map_err(|_| RelayError::ChannelClosed)?.into_result()
    }

    /// Reporter posting grabbed elements to `endpoint`.
    pub fn reporter(&self, endpoint: impl Into<String>) -> BrokerReporter {
        BrokerReporter {
            client: self.clone(),
            endpoint: endpoint.into(),
        }
    }
}

/// [`SelectionReporter`] that goes through the broker.
pub struct BrokerReporter {
    client: BrokerClient,
    endpoint: String,
}

#[async_trait]
impl SelectionReporter for BrokerReporter {
    async fn report(&self, grabbed: &GrabbedElement) -> Result<(), RelayError> {
        let body = serde_json::to_value(grabbed)?;
        self.client
            .fetch_api(&self.endpoint, FetchOptions::post_json(body))
            .await?;
        debug!("Reported grabbed element to {}", self.endpoint);
        Ok(())
    }
}

/// What the extension's background surface can ask of the running contexts.
#[derive(Clone)]
pub struct BrokerHandle {
    client: BrokerClient,
    relay: RelayHandle,
}

impl BrokerHandle {
    pub(crate) fn new(client: BrokerClient, relay: RelayHandle) -> Self {
        Self { client, relay }
    }

    pub async fn fetch_api(&self, endpoint: &str, options: FetchOptions) -> Result<Value, RelayError> {
        self.client.fetch_api(endpoint, options).await
    }

    /// Ask the relay to grab the element under the last pointer position.
    pub async fn grab_element(&self) -> Result<GrabbedElement, RelayError> {
        let data = self.relay.send(RuntimeMessage::GrabElement).await?.into_result()?;
        Ok(serde_json::from_value(data)?)
    }

    /// Run one command in the relay, outside of any script.
    pub async fn execute_command(&self, command: &str, params: Vec<String>) -> Result<Value, RelayError> {
        self.relay
            .send(RuntimeMessage::ExecuteCommand {
                command: command.to_string(),
                params,
            })
            .await?
            .into_result()
    }
}
