//! DOM errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    /// The handle does not refer to an element of this document.
    #[error("Stale element handle: {0}")]
    StaleHandle(u64),

    /// The CSS selector could not be parsed.
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// The element cannot take the requested action.
    #[error("Action not supported on <{tag}>: {action}")]
    Unsupported { tag: String, action: String },

    /// The document could not be read.
    #[error("Failed to load document: {0}")]
    Load(String),
}

impl From<std::io::Error> for DomError {
    fn from(e: std::io::Error) -> Self {
        DomError::Load(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_display() {
        let err = DomError::Unsupported {
            tag: "img".to_string(),
            action: "set value".to_string(),
        };
        assert_eq!(err.to_string(), "Action not supported on <img>: set value");
    }

    #[test]
    fn test_from_io() {
        let err: DomError = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.html").into();
        assert!(err.to_string().contains("missing.html"));
    }
}
