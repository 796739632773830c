//! Execution session state: cursor, run state and the output log record.

use serde::{Deserialize, Serialize};

use crate::error::StepError;

/// Position of the engine within a script.
///
/// Serializes to the body of `/set_execution_status`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionCursor {
    pub current_line: usize,
    pub is_executing: bool,
    #[serde(rename = "waiting_for_user")]
    pub is_waiting_for_user: bool,
}

impl ExecutionCursor {
    /// Cursor for the given state at `current_line`.
    pub fn at(current_line: usize, state: RunState) -> Self {
        Self {
            current_line,
            is_executing: state.is_active(),
            is_waiting_for_user: state == RunState::WaitingForUser,
        }
    }
}

/// Engine run state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Idle,
    Running,
    WaitingForUser,
    Completed,
    Errored,
}

impl RunState {
    /// Running or paused on the user: a run is in progress.
    pub fn is_active(&self) -> bool {
        matches!(self, RunState::Running | RunState::WaitingForUser)
    }

    /// Completed or errored: the run is over until the next start.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Errored)
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Idle => write!(f, "idle"),
            RunState::Running => write!(f, "running"),
            RunState::WaitingForUser => write!(f, "waiting_for_user"),
            RunState::Completed => write!(f, "completed"),
            RunState::Errored => write!(f, "errored"),
        }
    }
}

/// One entry of the output log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Zero-based index of the line in the script.
    pub index: usize,
    /// The line text.
    pub line: String,
    pub result: Result<String, StepError>,
}

impl StepRecord {
    pub fn success(index: usize, line: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            index,
            line: line.into(),
            result: Ok(result.into()),
        }
    }

    pub fn failure(index: usize, line: impl Into<String>, error: StepError) -> Self {
        Self {
            index,
            line: line.into(),
            result: Err(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

impl std::fmt::Display for StepRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.result {
            Ok(result) => write!(f, "{}: {} -> {}", self.index + 1, self.line, result),
            Err(error) => write!(f, "{}: {} -> error: {}", self.index + 1, self.line, error),
        }
    }
}
