//! Error types shared across execution contexts.

mod relay;
mod script;
mod step;

pub use relay::*;
pub use script::*;
pub use step::*;
