//! The execution engine.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use webdsl_config::EngineConfig;
use webdsl_protocols::{
    CommandInvocation, ExecutionCursor, PageCall, RunState, Script, StepError, StepRecord,
};
use webdsl_relay::{CommandDispatcher, PageChannel};

use crate::error::EngineError;
use crate::session::{EngineSnapshot, Session};
use crate::store::ScriptStore;

const EVENT_CAPACITY: usize = 256;

/// Engine behaviour settings.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Pause between a successful line and the next one.
    pub step_delay: Duration,
    /// Command name that pauses the run until [`ExecutionEngine::confirm`].
    pub ask_user_directive: String,
    /// Send commands the relay does not implement to `/execute_command`.
    pub remote_commands: bool,
    /// Push the cursor to `/set_execution_status` on every change.
    pub mirror_status: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for EngineOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            step_delay: config.step_delay(),
            ask_user_directive: config.ask_user_directive.clone(),
            remote_commands: config.remote_commands,
            mirror_status: config.mirror_status,
        }
    }
}

/// Observable engine events.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    StateChanged(RunState),
    /// A line finished and was appended to the output log.
    Stepped(StepRecord),
    /// The run is paused on the ask-user directive.
    AwaitingUser { index: usize, prompt: String },
    Reset,
}

/// What one call to [`ExecutionEngine::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Not running, or another step is in flight.
    Skipped,
    Advanced,
    WaitingForUser,
    Completed,
    Errored,
    /// The session was reset while the line was in flight; its reply was
    /// dropped.
    Stale,
}

enum LineResult {
    Done(Result<String, StepError>),
    AskUser(String),
}

struct Inner {
    channel: Arc<dyn PageChannel>,
    store: ScriptStore,
    options: EngineOptions,
    session: Mutex<Session>,
    events: broadcast::Sender<EngineEvent>,
    snapshot: watch::Sender<EngineSnapshot>,
    status: mpsc::UnboundedSender<ExecutionCursor>,
}

/// Runs scripts one line at a time through a [`PageChannel`].
///
/// Lines run strictly in order: line N+1 is sent only after line N's reply
/// arrived, or after the user confirmed when line N is the ask-user
/// directive. The first failing line ends the run.
///
/// Cloning gives another handle to the same engine.
#[derive(Clone)]
pub struct ExecutionEngine {
    inner: Arc<Inner>,
}

impl ExecutionEngine {
    /// Must be called inside a tokio runtime.
    pub fn new(channel: Arc<dyn PageChannel>, options: EngineOptions) -> Self {
        let session = Session::new();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (snapshot, _) = watch::channel(session.snapshot());
        let store = ScriptStore::new(channel.clone());

        let (status, rx) = mpsc::unbounded_channel();
        if options.mirror_status {
            tokio::spawn(mirror_status(store.clone(), rx));
        }

        Self {
            inner: Arc::new(Inner {
                channel,
                store,
                options,
                session: Mutex::new(session),
                events,
                snapshot,
                status,
            }),
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.inner.options
    }

    pub fn store(&self) -> &ScriptStore {
        &self.inner.store
    }

    /// Replace the script. Refused while a run is in progress.
    pub fn load_script(&self, script: impl Into<Script>) -> Result<(), EngineError> {
        let mut session = self.inner.session.lock();
        if session.state.is_active() {
            return Err(EngineError::Busy(session.state));
        }
        session.script = script.into();
        debug!("Loaded script with {} command(s)", session.script.command_count());
        Ok(())
    }

    /// Fetch the stored script from the backend and load it.
    pub async fn load_from_store(&self) -> Result<Script, EngineError> {
        let script = self.inner.store.load_script().await?;
        self.load_script(script.clone())?;
        Ok(script)
    }

    /// Fetch the stored script and continue the run recorded in the
    /// backend's execution status.
    ///
    /// Returns the state the run resumed in, or `None` when the status shows
    /// no run in progress; the script is loaded either way.
    pub async fn resume_from_store(&self) -> Result<Option<RunState>, EngineError> {
        let script = self.inner.store.load_script().await?;
        let status = self.inner.store.fetch_status().await?;

        let (epoch, pacing, state) = {
            let mut session = self.inner.session.lock();
            if session.state.is_active() {
                return Err(EngineError::Busy(session.state));
            }
            session.script = script;
            if !status.is_executing || status.current_line >= session.script.len() {
                debug!("Stored status has no run to resume: {:?}", status);
                return Ok(None);
            }

            let pacing = session.next_epoch();
            session.cursor = status.current_line;
            session.log.clear();
            session.state = if status.is_waiting_for_user {
                RunState::WaitingForUser
            } else {
                RunState::Running
            };
            info!(
                "Resuming script at line {} ({})",
                session.cursor + 1,
                session.state
            );
            self.publish(&session);
            self.emit(EngineEvent::StateChanged(session.state));
            (session.epoch, pacing, session.state)
        };
        if state == RunState::Running {
            self.spawn_driver(epoch, pacing);
        }
        Ok(Some(state))
    }

    pub fn script(&self) -> Script {
        self.inner.session.lock().script.clone()
    }

    pub fn cursor(&self) -> ExecutionCursor {
        self.inner.session.lock().execution_cursor()
    }

    pub fn state(&self) -> RunState {
        self.inner.session.lock().state
    }

    /// The output log of the current run.
    pub fn log(&self) -> Vec<StepRecord> {
        self.inner.session.lock().log.clone()
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        self.inner.session.lock().snapshot()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.inner.events.subscribe()
    }

    /// Start running from the first line. Does nothing while a run is in
    /// progress; returns whether a run was started.
    pub fn start(&self) -> bool {
        let (epoch, pacing) = {
            let mut session = self.inner.session.lock();
            if session.state.is_active() {
                debug!("start ignored: engine is {}", session.state);
                return false;
            }
            let pacing = session.next_epoch();
            session.cursor = 0;
            session.log.clear();
            session.skip_blank_lines();
            session.state = if session.at_end() {
                RunState::Completed
            } else {
                RunState::Running
            };
            info!(
                "Starting script with {} command(s)",
                session.script.command_count()
            );
            self.publish(&session);
            self.emit(EngineEvent::StateChanged(session.state));
            (session.epoch, pacing)
        };
        if self.state() == RunState::Running {
            self.spawn_driver(epoch, pacing);
        }
        true
    }

    /// Run the line under the cursor.
    ///
    /// Does nothing unless the engine is running and no other line is in
    /// flight.
    pub async fn step(&self) -> StepOutcome {
        self.step_in(None).await
    }

    /// Resume after the ask-user directive. Returns whether the engine was
    /// waiting.
    pub fn confirm(&self) -> bool {
        let (epoch, pacing) = {
            let mut session = self.inner.session.lock();
            if session.state != RunState::WaitingForUser {
                debug!("confirm ignored: engine is {}", session.state);
                return false;
            }
            session.advance();
            info!("User confirmed, continuing at line {}", session.cursor + 1);
            self.publish(&session);
            self.emit(EngineEvent::StateChanged(session.state));
            (session.epoch, session.pacing.clone())
        };
        if self.state() == RunState::Running {
            self.spawn_driver(epoch, pacing);
        }
        true
    }

    /// Back to idle from any state: clears the script, cursor and log,
    /// cancels pacing and tells the relay to drop the session's cosmetic
    /// work. Replies still in flight are dropped when they arrive.
    pub fn reset(&self) {
        {
            let mut session = self.inner.session.lock();
            session.next_epoch();
            session.script = Script::default();
            session.cursor = 0;
            session.log.clear();
            session.state = RunState::Idle;
            self.publish(&session);
        }
        self.inner.channel.post(PageCall::ResetSession);
        self.emit(EngineEvent::Reset);
        self.emit(EngineEvent::StateChanged(RunState::Idle));
        info!("Engine reset");
    }

    /// Wait until the engine needs outside input to make progress: waiting
    /// for the user, finished, failed or idle.
    pub async fn wait_until_settled(&self) -> EngineSnapshot {
        let mut rx = self.inner.snapshot.subscribe();
        let settled = match rx.wait_for(EngineSnapshot::is_settled).await {
            Ok(snapshot) => Some(snapshot.clone()),
            Err(_) => None,
        };
        settled.unwrap_or_else(|| self.snapshot())
    }

    async fn step_in(&self, epoch: Option<u64>) -> StepOutcome {
        let (epoch, index, line) = {
            let mut session = self.inner.session.lock();
            if epoch.is_some_and(|e| e != session.epoch) {
                return StepOutcome::Stale;
            }
            if session.state != RunState::Running || session.in_flight {
                return StepOutcome::Skipped;
            }
            session.skip_blank_lines();
            let Some(line) = session.current_line().map(str::to_string) else {
                session.state = RunState::Completed;
                self.publish(&session);
                self.emit(EngineEvent::StateChanged(RunState::Completed));
                return StepOutcome::Completed;
            };
            session.in_flight = true;
            self.publish(&session);
            (session.epoch, session.cursor, line)
        };

        debug!("Line {}: {}", index + 1, line);
        let result = self.run_line(&line).await;
        self.finish(epoch, index, line, result)
    }

    async fn run_line(&self, line: &str) -> LineResult {
        let invocation = match CommandInvocation::parse(line) {
            Ok(Some(invocation)) => invocation,
            Ok(None) => return LineResult::Done(Ok(String::new())),
            Err(e) => return LineResult::Done(Err(e.into())),
        };
        if invocation.is_named(&self.inner.options.ask_user_directive) {
            return LineResult::AskUser(invocation.args().join(" "));
        }
        LineResult::Done(self.execute(&invocation).await)
    }

    /// Relay primitives go to the relay. Anything else goes to the backend
    /// when remote commands are enabled, and to the relay otherwise, which
    /// rejects it as unknown.
    async fn execute(&self, invocation: &CommandInvocation) -> Result<String, StepError> {
        let name = invocation.name();
        if !CommandDispatcher::supports(name) && self.inner.options.remote_commands {
            return Ok(self
                .inner
                .store
                .execute_remote(name, invocation.raw_args())
                .await?);
        }

        let value = self
            .inner
            .channel
            .call(PageCall::ExecuteCommand {
                command: name.to_string(),
                params: invocation.args().to_vec(),
            })
            .await?;
        Ok(match value {
            Value::String(message) => message,
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }

    fn finish(&self, epoch: u64, index: usize, line: String, result: LineResult) -> StepOutcome {
        let mut session = self.inner.session.lock();
        if session.epoch != epoch {
            warn!("Dropping reply for line {} from a previous session", index + 1);
            return StepOutcome::Stale;
        }
        session.in_flight = false;

        let (record, outcome) = match result {
            LineResult::AskUser(prompt) => {
                session.state = RunState::WaitingForUser;
                info!("Waiting for user: {}", prompt);
                self.emit(EngineEvent::AwaitingUser {
                    index,
                    prompt: prompt.clone(),
                });
                (
                    StepRecord::success(index, line, prompt),
                    StepOutcome::WaitingForUser,
                )
            }
            LineResult::Done(Ok(message)) => {
                session.advance();
                let outcome = match session.state {
                    RunState::Completed => StepOutcome::Completed,
                    _ => StepOutcome::Advanced,
                };
                (StepRecord::success(index, line, message), outcome)
            }
            LineResult::Done(Err(e)) => {
                error!("Line {} failed: {}", index + 1, e);
                session.state = RunState::Errored;
                (StepRecord::failure(index, line, e), StepOutcome::Errored)
            }
        };

        session.log.push(record.clone());
        self.publish(&session);
        self.emit(EngineEvent::Stepped(record));
        if outcome != StepOutcome::Advanced {
            self.emit(EngineEvent::StateChanged(session.state));
        }
        if outcome == StepOutcome::Completed {
            info!("Script completed after {} step(s)", session.log.len());
        }
        outcome
    }

    fn spawn_driver(&self, epoch: u64, pacing: CancellationToken) {
        let engine = self.clone();
        tokio::spawn(async move { engine.drive(epoch, pacing).await });
    }

    /// Step until the run pauses, ends or the epoch changes.
    async fn drive(&self, epoch: u64, pacing: CancellationToken) {
        let mut snapshots = self.inner.snapshot.subscribe();
        loop {
            if pacing.is_cancelled() {
                return;
            }
            match self.step_in(Some(epoch)).await {
                StepOutcome::Advanced => {
                    tokio::select! {
                        _ = tokio::time::sleep(self.inner.options.step_delay) => {}
                        _ = pacing.cancelled() => return,
                    }
                }
                // A manual step is in flight; pick up after it.
                StepOutcome::Skipped if self.state() == RunState::Running => {
                    tokio::select! {
                        changed = snapshots.changed() => {
                            if changed.is_err() {
                                return;
                            }
                        }
                        _ = pacing.cancelled() => return,
                    }
                }
                _ => return,
            }
        }
    }

    fn publish(&self, session: &Session) {
        let snapshot = session.snapshot();
        let cursor = snapshot.cursor;
        self.inner.snapshot.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
        if self.inner.options.mirror_status {
            let _ = self.inner.status.send(cursor);
        }
    }

    fn emit(&self, event: EngineEvent) {
        let _ = self.inner.events.send(event);
    }
}

/// Push cursors to the backend in order, skipping to the latest one when
/// several are queued. Failures are logged and never reach the run.
async fn mirror_status(store: ScriptStore, mut rx: mpsc::UnboundedReceiver<ExecutionCursor>) {
    let mut last: Option<ExecutionCursor> = None;
    while let Some(mut cursor) = rx.recv().await {
        while let Ok(newer) = rx.try_recv() {
            cursor = newer;
        }
        if last == Some(cursor) {
            continue;
        }
        match store.push_status(cursor).await {
            Ok(()) => last = Some(cursor),
            Err(e) => warn!("Failed to mirror execution status: {}", e),
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
