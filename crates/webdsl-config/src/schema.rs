//! Configuration schema definitions.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub relay: RelayConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend reached by the broker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Where grabbed elements are reported. Relative paths are joined to
    /// `base_url`; absolute URLs are used as they are.
    #[serde(default = "default_selection_endpoint")]
    pub selection_endpoint: String,

    #[serde(default = "default_http_timeout")]
    pub timeout_seconds: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            selection_endpoint: default_selection_endpoint(),
            timeout_seconds: default_http_timeout(),
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

fn default_base_url() -> String {
    "http://localhost:8670".to_string()
}

fn default_selection_endpoint() -> String {
    "/v1/connectors/browser/update_selected_element/".to_string()
}

fn default_http_timeout() -> u64 {
    30
}

/// Execution engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Pause between two steps so the automation stays visible.
    #[serde(default = "default_step_delay")]
    pub step_delay_ms: u64,

    /// Command name that pauses the run until the user confirms.
    #[serde(default = "default_ask_user")]
    pub ask_user_directive: String,

    /// Send commands the relay does not implement to `/execute_command`.
    #[serde(default = "default_true")]
    pub remote_commands: bool,

    /// Mirror the cursor to `/set_execution_status`.
    #[serde(default = "default_true")]
    pub mirror_status: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            step_delay_ms: default_step_delay(),
            ask_user_directive: default_ask_user(),
            remote_commands: true,
            mirror_status: true,
        }
    }
}

impl EngineConfig {
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }
}

fn default_step_delay() -> u64 {
    1000
}

fn default_ask_user() -> String {
    "ASK_USER".to_string()
}

/// Relay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// How long a highlighted element keeps its outline.
    #[serde(default = "default_highlight")]
    pub highlight_ms: u64,

    /// Optional timeout for page calls. Unset means a call with no reply
    /// stays pending.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,

    /// Ask for a label when an element is grabbed.
    #[serde(default = "default_true")]
    pub prompt_for_label: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            highlight_ms: default_highlight(),
            request_timeout_ms: None,
            prompt_for_label: true,
        }
    }
}

impl RelayConfig {
    pub fn highlight(&self) -> Duration {
        Duration::from_millis(self.highlight_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

fn default_highlight() -> u64 {
    500
}

/// Logging settings for the binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,

    /// Directory for a daily rolling log file.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            directory: None,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
