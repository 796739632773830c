//! Interactive terminal input shared by the run loop and the label prompt.

use std::io::Write;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use webdsl_relay::{LabelPrompt, PromptCancelled};

const MARKUP_PREVIEW: usize = 120;

/// Line-oriented stdin. One reader so that buffered input is never lost
/// between prompts.
pub(crate) struct Console {
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl Console {
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }

    /// Print `prompt` and read one line. `None` at end of input.
    pub async fn ask(&self, prompt: &str) -> std::io::Result<Option<String>> {
        print!("{} ", prompt);
        std::io::stdout().flush()?;
        let line = self.lines.lock().await.next_line().await?;
        Ok(line.map(|l| l.trim().to_string()))
    }
}

#[async_trait]
impl LabelPrompt for Console {
    async fn ask_label(&self, element_html: &str) -> Result<String, PromptCancelled> {
        let preview: String = element_html.chars().take(MARKUP_PREVIEW).collect();
        println!("Grabbed: {}", preview);
        match self.ask("Label for this element (empty to cancel):").await {
            Ok(Some(label)) if !label.is_empty() => Ok(label),
            _ => Err(PromptCancelled),
        }
    }
}
