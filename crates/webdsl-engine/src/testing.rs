//! In-process stand-in for the relay used by unit tests.

use std::collections::{HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::oneshot;
use webdsl_protocols::{FailureKind, PageCall, RelayError};
use webdsl_relay::{Backend, CommandDispatcher, MemoryBackend, PageChannel};

/// Answers `fetchAPI` from a [`MemoryBackend`] and relay commands with
/// `"ok <command> <params>"`. Commands can be made to fail with a locator
/// miss, or held until the test releases them.
#[derive(Default)]
pub struct FakeChannel {
    pub backend: MemoryBackend,
    calls: Mutex<Vec<PageCall>>,
    posted: Mutex<Vec<PageCall>>,
    failing: Mutex<HashSet<String>>,
    held: Mutex<HashMap<String, VecDeque<oneshot::Receiver<()>>>>,
}

impl FakeChannel {
    pub fn with_backend(backend: MemoryBackend) -> Self {
        Self {
            backend,
            ..Self::default()
        }
    }

    pub fn fail(&self, command: &str) {
        self.failing.lock().insert(command.to_string());
    }

    /// Hold the next call of `command` until the returned sender fires.
    pub fn hold(&self, command: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.held
            .lock()
            .entry(command.to_string())
            .or_default()
            .push_back(rx);
        tx
    }

    /// `command params…` of every relay command received, in order.
    pub fn commands(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                PageCall::ExecuteCommand { command, params } => {
                    Some(format!("{} {}", command, params.join(" ")).trim().to_string())
                }
                _ => None,
            })
            .collect()
    }

    pub fn posted(&self) -> Vec<PageCall> {
        self.posted.lock().clone()
    }
}

#[async_trait]
impl PageChannel for FakeChannel {
    async fn call(&self, call: PageCall) -> Result<Value, RelayError> {
        self.calls.lock().push(call.clone());
        match call {
            PageCall::FetchApi { endpoint, options } => self
                .backend
                .fetch(&endpoint, &options)
                .await
                .map_err(|e| RelayError::rejected(FailureKind::RelayFailure, e.to_string())),
            PageCall::ExecuteCommand { command, params } => {
                let gate = self
                    .held
                    .lock()
                    .get_mut(&command)
                    .and_then(VecDeque::pop_front);
                if let Some(gate) = gate {
                    let _ = gate.await;
                }
                if self.failing.lock().contains(&command) {
                    return Err(RelayError::rejected(
                        FailureKind::LocatorMiss,
                        format!("Element not found: {}", params.join(" ")),
                    ));
                }
                if !CommandDispatcher::supports(&command) {
                    return Err(RelayError::rejected(
                        FailureKind::DispatchFailure,
                        format!("Unknown command: {}", command),
                    ));
                }
                Ok(json!(format!("ok {} {}", command, params.join(" ")).trim()))
            }
            PageCall::ResetSession => Ok(Value::Null),
        }
    }

    fn post(&self, call: PageCall) {
        self.posted.lock().push(call);
    }
}
