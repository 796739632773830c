//! Per-step failures recorded in the output log.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::relay::RelayError;
use super::script::ScriptError;

/// Category of a failed dispatch, carried on failed replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Selector resolved to nothing.
    LocatorMiss,
    /// Unknown command or bad arguments.
    DispatchFailure,
    /// Transport or backend error.
    RelayFailure,
    /// The user dismissed a prompt.
    UserCancelled,
}

/// Why a script step failed. Every variant halts the run; none escapes the
/// engine.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum StepError {
    #[error("Element not found: {0}")]
    LocatorMiss(String),

    #[error("Dispatch failed: {0}")]
    DispatchFailure(String),

    #[error("Relay failure: {0}")]
    RelayFailure(String),

    #[error("Cancelled by user: {0}")]
    UserCancelled(String),
}

impl StepError {
    pub fn kind(&self) -> FailureKind {
        match self {
            StepError::LocatorMiss(_) => FailureKind::LocatorMiss,
            StepError::DispatchFailure(_) => FailureKind::DispatchFailure,
            StepError::RelayFailure(_) => FailureKind::RelayFailure,
            StepError::UserCancelled(_) => FailureKind::UserCancelled,
        }
    }

    pub fn from_kind(kind: FailureKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            FailureKind::LocatorMiss => StepError::LocatorMiss(message),
            FailureKind::DispatchFailure => StepError::DispatchFailure(message),
            FailureKind::RelayFailure => StepError::RelayFailure(message),
            FailureKind::UserCancelled => StepError::UserCancelled(message),
        }
    }
}

impl From<RelayError> for StepError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::Rejected { kind, message } => StepError::from_kind(kind, message),
            other => StepError::RelayFailure(other.to_string()),
        }
    }
}

impl From<ScriptError> for StepError {
    fn from(err: ScriptError) -> Self {
        StepError::DispatchFailure(err.to_string())
    }
}
