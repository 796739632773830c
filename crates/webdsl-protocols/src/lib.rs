//! # webdsl Protocols
//!
//! Types shared by the three execution contexts of webdsl:
//!
//! - [`Script`] and [`CommandInvocation`] - the parsed automation script
//! - [`CommandDescriptor`] / [`CommandCatalog`] - command metadata from the backend
//! - [`ExecutionCursor`], [`RunState`], [`StepRecord`] - engine session state
//! - [`WindowMessage`], [`RuntimeMessage`] - envelopes exchanged between contexts
//! - [`StepError`], [`RelayError`] - the error taxonomy
//!
//! Contains no behaviour beyond parsing and conversions.

pub mod command;
pub mod cursor;
pub mod error;
pub mod message;
pub mod script;

pub use command::{CommandCatalog, CommandDescriptor};
pub use cursor::{ExecutionCursor, RunState, StepRecord};
pub use error::{FailureKind, RelayError, StepError};
pub use message::{
    DispatchReply, ExtensionEnvelope, FetchOptions, HttpMethod, Origin, PageCall, PageEnvelope,
    ReplyContent, RequestId, RuntimeMessage, WindowMessage,
};
pub use script::{CommandInvocation, Script};
