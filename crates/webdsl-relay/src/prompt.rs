//! Label prompt shown when an element is grabbed.

use async_trait::async_trait;
use thiserror::Error;

/// The user dismissed the label prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Label prompt cancelled")]
pub struct PromptCancelled;

/// Asks the user to name a grabbed element.
#[async_trait]
pub trait LabelPrompt: Send + Sync {
    /// `element_html` is the grabbed element's markup, already serialized.
    async fn ask_label(&self, element_html: &str) -> Result<String, PromptCancelled>;
}

/// Always answers with the same label.
pub struct FixedLabel(pub String);

#[async_trait]
impl LabelPrompt for FixedLabel {
    async fn ask_label(&self, _element_html: &str) -> Result<String, PromptCancelled> {
        Ok(self.0.clone())
    }
}

/// Always cancels.
pub struct CancelPrompt;

#[async_trait]
impl LabelPrompt for CancelPrompt {
    async fn ask_label(&self, _element_html: &str) -> Result<String, PromptCancelled> {
        Err(PromptCancelled)
    }
}
