//! # webdsl Config
//!
//! Configuration for the three execution contexts: where the backend lives,
//! how the engine paces a run, and how the relay highlights and times out.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
