//! Backend errors.

use thiserror::Error;

/// Errors from the backend the broker talks to.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The request could not be sent or the connection failed.
    #[error("Request failed: {0}")]
    Request(String),

    /// The backend answered with a non-success status.
    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body is not valid JSON.
    #[error("Invalid response body: {0}")]
    Decode(String),

    /// The endpoint could not be turned into a URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// No route for the endpoint.
    #[error("No such endpoint: {0}")]
    NotFound(String),

    /// The request body is missing or has the wrong shape.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        BackendError::Request(e.to_string())
    }
}

impl From<url::ParseError> for BackendError {
    fn from(e: url::ParseError) -> Self {
        BackendError::InvalidUrl(e.to_string())
    }
}
