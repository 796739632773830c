//! In-process backend with the script server's semantics.
//!
//! Used offline and in tests. Routes mirror the HTTP backend: the script
//! text, the execution status, the command catalog and the selection
//! endpoint all live in memory.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;
use webdsl_protocols::{CommandCatalog, ExecutionCursor, FetchOptions, HttpMethod};

use crate::backend::Backend;
use crate::error::BackendError;

const DEFAULT_SELECTION_ENDPOINT: &str = "/v1/connectors/browser/update_selected_element/";

/// An element reported through the selection endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedElement {
    pub element_html: String,
    pub element_name: String,
}

#[derive(Debug, Deserialize)]
struct ScriptBody {
    script: String,
}

#[derive(Debug, Deserialize)]
struct CommandBody {
    command: String,
    #[serde(default)]
    args: String,
}

#[derive(Default)]
struct State {
    script: String,
    status: ExecutionCursor,
    variables: BTreeMap<String, String>,
    selections: Vec<SelectedElement>,
    executed: Vec<(String, String)>,
}

/// In-memory [`Backend`].
pub struct MemoryBackend {
    state: RwLock<State>,
    catalog: CommandCatalog,
    selection_endpoint: String,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
            catalog: Self::default_catalog(),
            selection_endpoint: DEFAULT_SELECTION_ENDPOINT.to_string(),
        }
    }

    pub fn with_script(self, script: impl Into<String>) -> Self {
        self.state.write().script = script.into();
        self
    }

    pub fn with_catalog(mut self, catalog: CommandCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_selection_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.selection_endpoint = endpoint.into();
        self
    }

    /// The catalog the script server ships with.
    pub fn default_catalog() -> CommandCatalog {
        let entries: [(&str, &[&str]); 7] = [
            ("NAVIGATE", &["URL"]),
            ("ASK_USER", &["Prompt"]),
            ("CLICK_XPATH", &["XPath"]),
            ("TYPE_XPATH", &["XPath", "Text"]),
            ("SAVE_TO_VARIABLE", &["Variable Name", "Value"]),
            ("READ_XPATH", &["XPath"]),
            ("FIND_AND_SAVE", &["URL", "Query", "Variable Name"]),
        ];
        let map: BTreeMap<String, Vec<String>> = entries
            .iter()
            .map(|(name, params)| {
                (
                    name.to_string(),
                    params.iter().map(|p| p.to_string()).collect(),
                )
            })
            .collect();
        CommandCatalog::from(map)
    }

    pub fn script(&self) -> String {
        self.state.read().script.clone()
    }

    /// Last status pushed through `/set_execution_status`.
    pub fn status(&self) -> ExecutionCursor {
        self.state.read().status
    }

    pub fn selections(&self) -> Vec<SelectedElement> {
        self.state.read().selections.clone()
    }

    /// `(command, args)` pairs received on `/execute_command`, in order.
    pub fn executed(&self) -> Vec<(String, String)> {
        self.state.read().executed.clone()
    }

    pub fn variables(&self) -> BTreeMap<String, String> {
        self.state.read().variables.clone()
    }

    fn body<T: for<'de> Deserialize<'de>>(options: &FetchOptions) -> Result<T, BackendError> {
        let body = options
            .body
            .clone()
            .ok_or_else(|| BackendError::BadRequest("missing body".to_string()))?;
        serde_json::from_value(body).map_err(|e| BackendError::BadRequest(e.to_string()))
    }

    fn execute(&self, command: &str, args: &str) -> String {
        let mut state = self.state.write();
        state.executed.push((command.to_string(), args.to_string()));
        match command.to_lowercase().as_str() {
            "ask_user" => args.to_string(),
            "save_to_variable" => match args.split_once(' ') {
                Some((name, value)) => {
                    let value = unquote(value);
                    state.variables.insert(name.to_string(), value);
                    format!("Saved value to variable {}", name)
                }
                None => format!("Missing value for variable {}", args),
            },
            _ => format!("Unknown command: {}", command),
        }
    }

    fn route(&self, method: HttpMethod, path: &str, options: &FetchOptions) -> Result<Value, BackendError> {
        if path == self.selection_endpoint.trim_end_matches('/') {
            let selected: SelectedElement = Self::body(options)?;
            debug!("Selected element '{}'", selected.element_name);
            self.state.write().selections.push(selected);
            return Ok(json!({"message": "Selected element updated"}));
        }

        match (method, path) {
            (HttpMethod::Get, "/get_script") => Ok(json!({"script": self.script()})),
            (HttpMethod::Post, "/update_script") => {
                let body: ScriptBody = Self::body(options)?;
                self.state.write().script = body.script;
                Ok(json!({"message": "Script updated successfully"}))
            }
            (HttpMethod::Post, "/clear_script") => {
                let mut state = self.state.write();
                state.script.clear();
                state.status = ExecutionCursor::default();
                Ok(json!({"message": "Script cleared successfully"}))
            }
            (HttpMethod::Post, "/execute_command") => {
                let body: CommandBody = Self::body(options)?;
                let result = self.execute(&body.command, &body.args);
                Ok(json!({"result": result}))
            }
            (HttpMethod::Get, "/get_variables") => serde_json::to_value(self.variables())
                .map_err(|e| BackendError::Decode(e.to_string())),
            (HttpMethod::Get, "/get_command_structure") => serde_json::to_value(&self.catalog)
                .map_err(|e| BackendError::Decode(e.to_string())),
            (HttpMethod::Post, "/add_command") => {
                let body: CommandBody = Self::body(options)?;
                self.state
                    .write()
                    .script
                    .push_str(&format!("\n{} {}", body.command, body.args));
                Ok(json!({"message": "Command added successfully"}))
            }
            (HttpMethod::Get, "/get_execution_status") => serde_json::to_value(self.status())
                .map_err(|e| BackendError::Decode(e.to_string())),
            (HttpMethod::Post, "/set_execution_status") => {
                let status: ExecutionCursor = Self::body(options)?;
                self.state.write().status = status;
                Ok(json!({"message": "Execution status updated"}))
            }
            _ => Err(BackendError::NotFound(path.to_string())),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn fetch(&self, endpoint: &str, options: &FetchOptions) -> Result<Value, BackendError> {
        let path = normalize(endpoint);
        debug!("Memory backend {:?} {}", options.method, path);
        self.route(options.method, &path, options)
    }
}

/// Path part of an endpoint with a leading slash and no trailing slash.
fn normalize(endpoint: &str) -> String {
    let without_scheme = match endpoint.split_once("://") {
        Some((_, rest)) => rest.find('/').map(|i| &rest[i..]).unwrap_or("/"),
        None => endpoint,
    };
    let path = without_scheme.split('?').next().unwrap_or_default();
    format!("/{}", path.trim_matches('/'))
}

fn unquote(value: &str) -> String {
    serde_json::from_str::<String>(value).unwrap_or_else(|_| value.to_string())
}
