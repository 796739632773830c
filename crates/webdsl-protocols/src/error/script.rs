//! Script parsing and authoring errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("Unterminated quoted argument in line: {0}")]
    UnterminatedQuote(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Command {command} expects {expected} argument(s), got {actual}")]
    ArityMismatch {
        command: String,
        expected: usize,
        actual: usize,
    },
}
