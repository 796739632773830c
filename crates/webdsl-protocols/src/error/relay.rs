//! Relay bridge errors.

use thiserror::Error;

use super::step::FailureKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// The far side answered with `success: false`.
    #[error("{message}")]
    Rejected { kind: FailureKind, message: String },

    /// The channel to the next context is gone.
    #[error("Relay channel closed")]
    ChannelClosed,

    /// No reply within the configured timeout.
    #[error("Relay request {request_id} timed out after {after_ms}ms")]
    Timeout { request_id: u64, after_ms: u64 },

    /// A reply arrived but its payload has the wrong shape.
    #[error("Invalid relay payload: {0}")]
    InvalidPayload(String),
}

impl RelayError {
    pub fn rejected(kind: FailureKind, message: impl Into<String>) -> Self {
        RelayError::Rejected {
            kind,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(e: serde_json::Error) -> Self {
        RelayError::InvalidPayload(e.to_string())
    }
}
