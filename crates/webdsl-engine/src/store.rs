//! Script store binding: backend calls made through the page bridge.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, info};
use webdsl_protocols::{CommandCatalog, ExecutionCursor, FetchOptions, PageCall, Script};
use webdsl_relay::PageChannel;

use crate::error::EngineError;

/// Backend endpoints used by the page.
pub mod endpoints {
    pub const GET_SCRIPT: &str = "/get_script";
    pub const UPDATE_SCRIPT: &str = "/update_script";
    pub const CLEAR_SCRIPT: &str = "/clear_script";
    pub const COMMAND_STRUCTURE: &str = "/get_command_structure";
    pub const EXECUTE_COMMAND: &str = "/execute_command";
    pub const ADD_COMMAND: &str = "/add_command";
    pub const SET_EXECUTION_STATUS: &str = "/set_execution_status";
    pub const GET_EXECUTION_STATUS: &str = "/get_execution_status";
}

/// Script storage, command catalog and remote execution. The page has no
/// network access, so every call is a `fetchAPI` through the channel.
#[derive(Clone)]
pub struct ScriptStore {
    channel: Arc<dyn PageChannel>,
}

impl ScriptStore {
    pub fn new(channel: Arc<dyn PageChannel>) -> Self {
        Self { channel }
    }

    async fn fetch(&self, endpoint: &str, options: FetchOptions) -> Result<Value, EngineError> {
        let value = self
            .channel
            .call(PageCall::FetchApi {
                endpoint: endpoint.to_string(),
                options,
            })
            .await?;
        Ok(value)
    }

    pub async fn load_script(&self) -> Result<Script, EngineError> {
        let value = self.fetch(endpoints::GET_SCRIPT, FetchOptions::get()).await?;
        let text = value
            .get("script")
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::unexpected(endpoints::GET_SCRIPT, "missing `script`"))?;
        debug!("Loaded script ({} bytes)", text.len());
        Ok(Script::new(text))
    }

    /// Store `script` exactly as written.
    pub async fn save_script(&self, script: &Script) -> Result<(), EngineError> {
        self.fetch(
            endpoints::UPDATE_SCRIPT,
            FetchOptions::post_json(json!({ "script": script.text() })),
        )
        .await?;
        Ok(())
    }

    pub async fn clear_script(&self) -> Result<(), EngineError> {
        self.fetch(endpoints::CLEAR_SCRIPT, FetchOptions::post()).await?;
        info!("Script cleared");
        Ok(())
    }

    pub async fn command_catalog(&self) -> Result<CommandCatalog, EngineError> {
        let value = self
            .fetch(endpoints::COMMAND_STRUCTURE, FetchOptions::get())
            .await?;
        serde_json::from_value(value)
            .map_err(|e| EngineError::unexpected(endpoints::COMMAND_STRUCTURE, e.to_string()))
    }

    /// Append `name args…` to the stored script and return the script as the
    /// backend now has it.
    ///
    /// The command must be in the catalog with a matching number of
    /// arguments. Arguments are stored as JSON strings.
    pub async fn add_command(&self, name: &str, args: &[String]) -> Result<Script, EngineError> {
        let catalog = self.command_catalog().await?;
        let line = catalog.validate(name, args)?.render(args)?;
        self.fetch(
            endpoints::ADD_COMMAND,
            FetchOptions::post_json(json!({ "command": line, "args": "" })),
        )
        .await?;
        info!("Added command: {}", line);
        self.load_script().await
    }

    pub async fn push_status(&self, cursor: ExecutionCursor) -> Result<(), EngineError> {
        let body = serde_json::to_value(cursor)
            .map_err(|e| EngineError::unexpected(endpoints::SET_EXECUTION_STATUS, e.to_string()))?;
        self.fetch(endpoints::SET_EXECUTION_STATUS, FetchOptions::post_json(body))
            .await?;
        Ok(())
    }

    pub async fn fetch_status(&self) -> Result<ExecutionCursor, EngineError> {
        let value = self
            .fetch(endpoints::GET_EXECUTION_STATUS, FetchOptions::get())
            .await?;
        serde_json::from_value(value)
            .map_err(|e| EngineError::unexpected(endpoints::GET_EXECUTION_STATUS, e.to_string()))
    }

    /// Run a command on the backend. `args` is sent verbatim.
    pub async fn execute_remote(&self, command: &str, args: &str) -> Result<String, EngineError> {
        let value = self
            .fetch(
                endpoints::EXECUTE_COMMAND,
                FetchOptions::post_json(json!({ "command": command, "args": args })),
            )
            .await?;
        match value.get("result") {
            Some(Value::String(result)) => Ok(result.clone()),
            Some(other) => Ok(other.to_string()),
            None => Err(EngineError::unexpected(
                endpoints::EXECUTE_COMMAND,
                "missing `result`",
            )),
        }
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
