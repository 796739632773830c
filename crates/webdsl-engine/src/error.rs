//! Engine errors.

use thiserror::Error;
use webdsl_protocols::error::ScriptError;
use webdsl_protocols::{RelayError, RunState, StepError};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error(transparent)]
    Script(#[from] ScriptError),

    /// The backend answered with something the engine cannot use.
    #[error("Unexpected response from {endpoint}: {message}")]
    UnexpectedResponse { endpoint: String, message: String },

    /// The script cannot be replaced while a run is in progress.
    #[error("Engine is {0}")]
    Busy(RunState),
}

impl EngineError {
    pub(crate) fn unexpected(endpoint: &str, message: impl Into<String>) -> Self {
        EngineError::UnexpectedResponse {
            endpoint: endpoint.to_string(),
            message: message.into(),
        }
    }
}

impl From<EngineError> for StepError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Relay(e) => e.into(),
            EngineError::Script(e) => e.into(),
            other => StepError::RelayFailure(other.to_string()),
        }
    }
}
