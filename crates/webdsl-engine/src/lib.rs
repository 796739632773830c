//! Script execution engine for webdsl.
//!
//! The engine lives in the page context. It walks a [`Script`] line by line,
//! sends each command through a [`PageChannel`] and keeps the output log.
//!
//! ```text
//!            start()                 line ok (after step delay)
//!   Idle ───────────────► Running ◄──────────────┐
//!    ▲                    │  │  │                │
//!    │ reset()            │  │  └────────────────┘
//!    │ (from any state)   │  │ ASK_USER
//!    │                    │  ▼
//!    │                    │ WaitingForUser ── confirm() ──► Running
//!    │                    │
//!    │        end of script│ line failed
//!    │                    ▼
//!    └──────── Completed / Errored
//! ```
//!
//! [`Script`]: webdsl_protocols::Script
//! [`PageChannel`]: webdsl_relay::PageChannel

mod engine;
mod error;
mod session;
mod store;

#[cfg(test)]
mod testing;

pub use engine::{EngineEvent, EngineOptions, ExecutionEngine, StepOutcome};
pub use error::EngineError;
pub use session::EngineSnapshot;
pub use store::{ScriptStore, endpoints};
