//! Message envelopes exchanged between the page, relay and broker contexts.
//!
//! ```text
//! ┌──────────────┐  WindowMessage   ┌──────────────┐  RuntimeMessage  ┌──────────────┐
//! │ Page Context │ ◄──────────────► │ Relay Context│ ◄──────────────► │    Broker    │
//! │   (engine)   │  FROM_PAGE /     │ (dispatcher) │  fetchAPI /      │    (HTTP)    │
//! └──────────────┘  FROM_EXTENSION  └──────────────┘  grabElement     └──────────────┘
//! ```
//!
//! Every page call carries a [`RequestId`] so concurrent calls are correlated
//! by id rather than by arrival order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FailureKind, RelayError};

/// Correlation id of one page call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a page-side bridge. Replies are addressed to it; the bridge
/// ignores anything addressed elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Origin(String);

impl Origin {
    /// A fresh, unique origin.
    pub fn new() -> Self {
        Self(format!("page-{}", uuid::Uuid::new_v4()))
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Origin {
    fn default() -> Self {
        Self::new()
    }
}

/// Messages posted on the page's window bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WindowMessage {
    #[serde(rename = "FROM_PAGE")]
    FromPage(PageEnvelope),
    #[serde(rename = "FROM_EXTENSION")]
    FromExtension(ExtensionEnvelope),
    #[serde(rename = "INIT_UI")]
    InitUi,
}

/// A call from the page to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageEnvelope {
    pub request_id: RequestId,
    pub origin: Origin,
    pub call: PageCall,
}

/// A reply from the relay to one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionEnvelope {
    pub request_id: RequestId,
    pub origin: Origin,
    pub content: ReplyContent,
}

/// Operations the page may ask the relay for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum PageCall {
    /// Forward an HTTP call to the broker.
    #[serde(rename = "fetchAPI")]
    FetchApi {
        endpoint: String,
        #[serde(default)]
        options: FetchOptions,
    },
    /// Run one command against the DOM.
    ExecuteCommand {
        command: String,
        #[serde(default)]
        params: Vec<String>,
    },
    /// Cancel pending cosmetic work for the page's session. Not answered.
    ResetSession,
}

impl PageCall {
    /// Whether the relay answers this call.
    pub fn expects_reply(&self) -> bool {
        !matches!(self, PageCall::ResetSession)
    }
}

/// HTTP method of a forwarded call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

/// Request options of a forwarded call, shaped like `fetch` options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchOptions {
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl FetchOptions {
    pub fn get() -> Self {
        Self::default()
    }

    /// POST with a JSON body.
    pub fn post_json(body: Value) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            method: HttpMethod::Post,
            headers,
            body: Some(body),
        }
    }

    /// POST without a body.
    pub fn post() -> Self {
        Self {
            method: HttpMethod::Post,
            ..Self::default()
        }
    }
}

/// `{ success, data | error }` reply body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyContent {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
}

impl ReplyContent {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            kind: None,
        }
    }

    pub fn failed(kind: FailureKind, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            kind: Some(kind),
        }
    }

    /// Resolve on success with `data` (or `null`), reject otherwise.
    pub fn into_result(self) -> Result<Value, RelayError> {
        if self.success {
            Ok(self.data.unwrap_or(Value::Null))
        } else {
            Err(RelayError::Rejected {
                kind: self.kind.unwrap_or(FailureKind::RelayFailure),
                message: self.error.unwrap_or_else(|| "unknown error".to_string()),
            })
        }
    }
}

impl From<Result<Value, RelayError>> for ReplyContent {
    fn from(result: Result<Value, RelayError>) -> Self {
        match result {
            Ok(data) => ReplyContent::ok(data),
            Err(RelayError::Rejected { kind, message }) => ReplyContent::failed(kind, message),
            Err(other) => ReplyContent::failed(FailureKind::RelayFailure, other.to_string()),
        }
    }
}

/// Runtime messages between the relay and the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum RuntimeMessage {
    /// Relay -> broker: perform an HTTP call.
    #[serde(rename = "fetchAPI")]
    FetchApi {
        endpoint: String,
        #[serde(default)]
        options: FetchOptions,
    },
    /// Broker -> relay: grab the element under the last pointer position.
    GrabElement,
    /// Broker -> relay: run one command against the DOM.
    ExecuteCommand {
        command: String,
        #[serde(default)]
        params: Vec<String>,
    },
}

/// `{ success, message }` result of one dispatched command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReply {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
}

impl DispatchReply {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            kind: None,
        }
    }

    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            kind: Some(kind),
        }
    }
}

impl From<DispatchReply> for ReplyContent {
    fn from(reply: DispatchReply) -> Self {
        if reply.success {
            ReplyContent::ok(Value::String(reply.message))
        } else {
            ReplyContent::failed(
                reply.kind.unwrap_or(FailureKind::DispatchFailure),
                reply.message,
            )
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
