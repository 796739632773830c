//! Per-run session state owned by the engine.

use tokio_util::sync::CancellationToken;
use webdsl_protocols::{ExecutionCursor, RunState, Script, StepRecord};

/// Point-in-time view of the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSnapshot {
    pub state: RunState,
    pub cursor: ExecutionCursor,
    /// Number of entries in the output log.
    pub steps: usize,
    /// A line has been sent and its reply is outstanding.
    pub in_flight: bool,
}

impl EngineSnapshot {
    /// Nothing left to do without outside input.
    pub fn is_settled(&self) -> bool {
        !self.in_flight && self.state != RunState::Running
    }
}

pub(crate) struct Session {
    pub script: Script,
    pub cursor: usize,
    pub state: RunState,
    pub log: Vec<StepRecord>,
    /// Bumped on every start and reset. Replies carry the epoch they were
    /// sent in and are dropped when it no longer matches.
    pub epoch: u64,
    pub in_flight: bool,
    /// Cancels the pacing of the current run.
    pub pacing: CancellationToken,
}

impl Session {
    pub fn new() -> Self {
        Self {
            script: Script::default(),
            cursor: 0,
            state: RunState::Idle,
            log: Vec::new(),
            epoch: 0,
            in_flight: false,
            pacing: CancellationToken::new(),
        }
    }

    pub fn execution_cursor(&self) -> ExecutionCursor {
        ExecutionCursor::at(self.cursor, self.state)
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            state: self.state,
            cursor: self.execution_cursor(),
            steps: self.log.len(),
            in_flight: self.in_flight,
        }
    }

    /// Start a new epoch and return its pacing token. The previous epoch's
    /// pacing is cancelled.
    pub fn next_epoch(&mut self) -> CancellationToken {
        self.epoch += 1;
        self.pacing.cancel();
        self.pacing = CancellationToken::new();
        self.in_flight = false;
        self.pacing.clone()
    }

    /// Move the cursor past blank lines.
    pub fn skip_blank_lines(&mut self) {
        while self.script.line(self.cursor).is_some_and(str::is_empty) {
            self.cursor += 1;
        }
    }

    pub fn at_end(&self) -> bool {
        self.cursor >= self.script.len()
    }

    pub fn current_line(&self) -> Option<&str> {
        self.script.line(self.cursor)
    }

    /// Advance past the current line. Ends the run when nothing is left.
    pub fn advance(&mut self) {
        self.cursor += 1;
        self.skip_blank_lines();
        self.state = if self.at_end() {
            RunState::Completed
        } else {
            RunState::Running
        };
    }
}
