// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The universe: a single-threaded main loop that owns the current state and
//! runs submitted actions one at a time.
//!
//! Callers talk to the loop through a [`UniverseTransaction`] handle. Actions
//! are queued on a bounded channel; progress is published on a `watch`
//! channel as a [`Status`]. The loop itself runs on a blocking worker so that
//! rules never hold up the async runtime.
//!
//! # Lifecycle
//!
//! 1. `Starting`: the init action runs and the root's observers activate.
//! 2. `Busy` / `Idle`: queued commands run until the queue is empty.
//! 3. `Stopped`: after [`UniverseTransaction::stop`], [`UniverseTransaction::kill`]
//!    or the first failing transaction.

use crate::config::DclareConfig;
use crate::engine::consistency::check_consistency;
use crate::engine::constants::ConstantState;
use crate::engine::history::History;
use crate::engine::leaf::{LeafTransaction, Scope};
use crate::engine::propagator::Propagator;
use crate::engine::statistics::{StatisticsSnapshot, UniverseStatistics};
use crate::errors::{EngineError, RuleError};
use crate::model::{Action, ConstantId, Model, ObjectId, Value};
use crate::observability::messages::engine::{
    HistoryMoved, TransactionCompleted, TransactionFailed, TransactionStarted, UniverseStarted, UniverseStopped,
};
use crate::observability::messages::StructuredLog;
use crate::state::State;
use crate::traits::DiffHandler;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mood {
    Starting,
    Busy,
    Idle,
    Stopped,
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mood::Starting => "starting",
            Mood::Busy => "busy",
            Mood::Idle => "idle",
            Mood::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// What the main loop last published.
#[derive(Debug, Clone)]
pub struct Status {
    pub mood: Mood,
    /// Name of the action running (busy) or last run.
    pub action: Option<Arc<str>>,
    pub state: State,
    pub stats: StatisticsSnapshot,
    /// Commands processed so far, the init action included.
    pub completed: u64,
}

enum Command {
    Run(Action),
    Backward,
    Forward,
    Stop,
}

#[derive(Clone, Copy)]
enum Direction {
    Backward,
    Forward,
}

struct Shared {
    model: Arc<Model>,
    config: DclareConfig,
    constants: ConstantState,
    stats: UniverseStatistics,
    errors: Mutex<Vec<EngineError>>,
    diff_handlers: RwLock<Vec<Arc<dyn DiffHandler>>>,
    submitted: AtomicU64,
}

/// Handle to a running universe. Cheap to clone; every clone talks to the
/// same main loop.
#[derive(Clone)]
pub struct UniverseTransaction {
    commands: mpsc::Sender<Command>,
    status: watch::Receiver<Status>,
    shared: Arc<Shared>,
    token: CancellationToken,
}

impl UniverseTransaction {
    /// Starts a universe for `model` and runs `init` as its first transaction.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(model: Arc<Model>, config: DclareConfig, init: Action) -> Self {
        Self::start_with(model, config, init, Vec::new())
    }

    /// Like [`UniverseTransaction::start`], with diff handlers that already
    /// see the init transaction.
    pub fn start_with(
        model: Arc<Model>,
        config: DclareConfig,
        init: Action,
        diff_handlers: Vec<Arc<dyn DiffHandler>>,
    ) -> Self {
        let stats = UniverseStatistics::new();
        stats.set_debugging(config.dev_mode);
        let shared = Arc::new(Shared {
            constants: ConstantState::new(config.is_trace_derivation()),
            model: Arc::clone(&model),
            stats,
            errors: Mutex::new(Vec::new()),
            diff_handlers: RwLock::new(diff_handlers),
            submitted: AtomicU64::new(1),
            config,
        });

        let (commands_tx, commands_rx) = mpsc::channel(shared.config.max_in_in_queue().max(1));
        let state = State::new(model);
        let (status_tx, status_rx) = watch::channel(Status {
            mood: Mood::Starting,
            action: Some(Arc::clone(&init.name)),
            state: state.clone(),
            stats: shared.stats.snapshot(),
            completed: 0,
        });
        let token = CancellationToken::new();

        let main_loop = MainLoop {
            history: History::new(shared.config.max_nr_of_history()),
            shared: Arc::clone(&shared),
            commands: commands_rx,
            status: status_tx,
            token: token.clone(),
            state,
            last_action: None,
            completed: 0,
            initialized: false,
        };
        tokio::task::spawn_blocking(move || main_loop.run(init));

        Self {
            commands: commands_tx,
            status: status_rx,
            shared,
            token,
        }
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.shared.model
    }

    pub fn config(&self) -> &DclareConfig {
        &self.shared.config
    }

    /// Queues an action. Waits while the queue is full.
    pub async fn put(&self, action: Action) -> Result<(), EngineError> {
        self.send(Command::Run(action)).await
    }

    /// Queues an action and waits until it and everything queued before it ran.
    pub async fn put_and_wait_for_idle(&self, action: Action) -> Result<State, EngineError> {
        self.put(action).await?;
        let status = self.wait_for_idle().await;
        self.throw_if_error()?;
        Ok(status.state)
    }

    /// Undoes the last transaction. A no-op when only the initialized state
    /// is left.
    pub async fn backward(&self) -> Result<(), EngineError> {
        self.send(Command::Backward).await
    }

    /// Redoes the last undone transaction.
    pub async fn forward(&self) -> Result<(), EngineError> {
        self.send(Command::Forward).await
    }

    /// Stops the universe once every queued command ran.
    pub async fn stop(&self) -> Result<(), EngineError> {
        self.send(Command::Stop).await
    }

    /// Stops the universe after the current command, dropping the queue.
    pub fn kill(&self) {
        self.token.cancel();
        // Wakes the loop if it is parked on an empty queue.
        let _ = self.commands.try_send(Command::Stop);
    }

    async fn send(&self, command: Command) -> Result<(), EngineError> {
        if self.is_stopped() {
            return Err(EngineError::UniverseStopped);
        }
        // Counted once queued, so a put dropped while the queue is full
        // never holds up wait_for_idle.
        self.commands
            .send(command)
            .await
            .map_err(|_| EngineError::QueueClosed)?;
        self.shared.submitted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Waits until every command submitted so far ran, or the universe stopped.
    pub async fn wait_for_idle(&self) -> Status {
        let target = self.shared.submitted.load(Ordering::SeqCst);
        self.wait_until(|s| s.mood == Mood::Stopped || (s.mood == Mood::Idle && s.completed >= target))
            .await
    }

    pub async fn wait_for_stopped(&self) -> Status {
        self.wait_until(|s| s.mood == Mood::Stopped).await
    }

    async fn wait_until(&self, done: impl FnMut(&Status) -> bool) -> Status {
        let mut status = self.status.clone();
        let reached = match status.wait_for(done).await {
            Ok(reached) => Some((*reached).clone()),
            Err(_) => None,
        };
        reached.unwrap_or_else(|| self.status())
    }

    pub fn status(&self) -> Status {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Status> {
        self.status.clone()
    }

    pub fn current_state(&self) -> State {
        self.status.borrow().state.clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled() || self.status.borrow().mood == Mood::Stopped
    }

    pub fn errors(&self) -> Vec<EngineError> {
        self.shared.errors.lock().clone()
    }

    /// Returns the first recorded error, if any.
    pub fn throw_if_error(&self) -> Result<(), EngineError> {
        match self.shared.errors.lock().first() {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    pub fn stats(&self) -> StatisticsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Registers a handler for every later transaction.
    pub fn add_diff_handler(&self, handler: Arc<dyn DiffHandler>) {
        self.shared.diff_handlers.write().push(handler);
    }

    /// Runs `body` against the current state without changing it. Any write
    /// fails with [`EngineError::ReadOnly`].
    pub fn read<R, F>(&self, body: F) -> Result<R, RuleError>
    where
        F: FnOnce(&mut LeafTransaction<'_>) -> Result<R, RuleError>,
    {
        let state = self.current_state();
        let mut leaf = LeafTransaction::read_only(self.scope(&state), state.clone());
        body(&mut leaf)
    }

    /// Like [`UniverseTransaction::read`], but reading an observed property of
    /// an object outside the universe first runs that object's observers.
    /// Detached objects may be written; the universe stays untouched. The
    /// first observer failure met while deriving is returned.
    pub fn derive<R, F>(&self, body: F) -> Result<R, RuleError>
    where
        F: FnOnce(&mut LeafTransaction<'_>) -> Result<R, RuleError>,
    {
        let state = self.current_state();
        let mut leaf = LeafTransaction::deriving(self.scope(&state), state.clone());
        let result = body(&mut leaf)?;
        match leaf.into_derive_failures().into_iter().next() {
            Some(error) => Err(error),
            None => Ok(result),
        }
    }

    fn scope<'s>(&'s self, pre: &'s State) -> Scope<'s> {
        Scope {
            pre,
            constants: &self.shared.constants,
            config: &self.shared.config,
        }
    }

    /// Derives (or looks up) a constant outside any transaction.
    pub fn constant(&self, constant: impl Into<ConstantId>, argument: impl Into<Value>) -> Result<Value, RuleError> {
        self.shared
            .constants
            .get(&self.shared.model, &constant.into(), &argument.into())
    }
}

struct MainLoop {
    shared: Arc<Shared>,
    commands: mpsc::Receiver<Command>,
    status: watch::Sender<Status>,
    token: CancellationToken,
    state: State,
    history: History,
    last_action: Option<Arc<str>>,
    completed: u64,
    initialized: bool,
}

impl MainLoop {
    fn run(mut self, init: Action) {
        UniverseStarted {
            universe: self.shared.model.universe_class().as_str(),
            dev_mode: self.shared.config.dev_mode,
            max_in_in_queue: self.shared.config.max_in_in_queue(),
        }
        .log();

        let root = self.shared.model.root();
        self.last_action = Some(Arc::clone(&init.name));
        let mut running = self.transact(&init, &[root]);
        self.initialized = true;
        self.completed += 1;

        while running && !self.token.is_cancelled() {
            let command = match self.commands.try_recv() {
                Ok(command) => command,
                Err(TryRecvError::Empty) => {
                    self.publish(Mood::Idle);
                    match self.commands.blocking_recv() {
                        Some(command) => command,
                        None => break,
                    }
                }
                Err(TryRecvError::Disconnected) => break,
            };
            if self.token.is_cancelled() {
                break;
            }

            running = match command {
                Command::Run(action) => {
                    self.last_action = Some(Arc::clone(&action.name));
                    self.publish(Mood::Busy);
                    self.transact(&action, &[])
                }
                Command::Backward => {
                    self.travel(Direction::Backward);
                    true
                }
                Command::Forward => {
                    self.travel(Direction::Forward);
                    true
                }
                Command::Stop => false,
            };
            self.completed += 1;
        }

        let killed = self.token.is_cancelled();
        self.token.cancel();
        self.commands.close();
        self.publish(Mood::Stopped);
        UniverseStopped {
            run_count: self.shared.stats.run_count(),
            killed,
        }
        .log();
    }

    /// Runs one action to its fixpoint and commits the result. Returns false
    /// when the universe must stop.
    fn transact(&mut self, action: &Action, activate: &[ObjectId]) -> bool {
        let trace = self.shared.config.is_trace_actions();
        if trace {
            TransactionStarted { action: &action.name }.log();
        }
        let started = Instant::now();
        let pre = self.state.clone();

        let propagator = Propagator {
            model: &self.shared.model,
            config: &self.shared.config,
            constants: &self.shared.constants,
            stats: &self.shared.stats,
        };
        let outcome = match propagator.run(&pre, action, activate) {
            Ok(outcome) => outcome,
            Err(error) => {
                self.shared.stats.abort_run();
                self.fail(action, error);
                return false;
            }
        };

        let mut problems = outcome.failures;
        if self.initialized {
            problems.extend(check_consistency(&outcome.state, &self.shared.config));
        }
        self.state = outcome.state;
        self.history.record(pre.clone());
        self.shared.stats.complete_run();
        if trace {
            TransactionCompleted {
                action: &action.name,
                changes: outcome.changes,
                orphans_cleared: outcome.orphans_cleared,
                duration: started.elapsed(),
            }
            .log();
        }
        self.notify(&pre, !self.initialized);

        if problems.is_empty() {
            true
        } else {
            self.fail(action, EngineError::Consistency(problems));
            false
        }
    }

    fn fail(&self, action: &Action, error: EngineError) {
        TransactionFailed {
            action: &action.name,
            error: &error,
        }
        .log();
        self.shared.errors.lock().push(error);
    }

    fn travel(&mut self, direction: Direction) {
        let current = self.state.clone();
        let moved = match direction {
            Direction::Backward => self.history.undo(current),
            Direction::Forward => self.history.redo(current),
        };
        let Some(target) = moved else {
            return;
        };
        let pre = std::mem::replace(&mut self.state, target);
        HistoryMoved {
            direction: match direction {
                Direction::Backward => "backward",
                Direction::Forward => "forward",
            },
            depth: self.history.len(),
        }
        .log();
        self.notify(&pre, false);
    }

    fn notify(&self, pre: &State, init: bool) {
        let handlers: Vec<Arc<dyn DiffHandler>> = self.shared.diff_handlers.read().clone();
        for handler in handlers {
            handler.handle(pre, &self.state, init);
        }
    }

    fn publish(&self, mood: Mood) {
        self.status.send_replace(Status {
            mood,
            action: self.last_action.clone(),
            state: self.state.clone(),
            stats: self.shared.stats.snapshot(),
            completed: self.completed,
        });
    }
}
