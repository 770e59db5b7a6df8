// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for universe and transaction events.
//!
//! This module contains message types for logging events related to:
//! * Universe lifecycle (start, stop, history travel)
//! * Transaction lifecycle (start, completion, failure)
//! * Observer scheduling and failures
//! * Orphan clearing, merge fallbacks and constant derivation

use crate::engine::Priority;
use crate::errors::{EngineError, RuleError};
use crate::model::{ObjectId, ObserverInstance, Value};
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// Universe main loop started.
///
/// # Log Level
/// `info!` - Important operational event
pub struct UniverseStarted<'a> {
    pub universe: &'a str,
    pub dev_mode: bool,
    pub max_in_in_queue: usize,
}

impl Display for UniverseStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Universe '{}' started (dev_mode={}, max_in_in_queue={})",
            self.universe, self.dev_mode, self.max_in_in_queue
        )
    }
}

impl StructuredLog for UniverseStarted<'_> {
    fn log(&self) {
        tracing::info!(
            universe = self.universe,
            dev_mode = self.dev_mode,
            max_in_in_queue = self.max_in_in_queue,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "universe",
            span_name = name,
            universe = self.universe,
            dev_mode = self.dev_mode,
        )
    }
}

/// Universe main loop ended.
///
/// # Log Level
/// `info!` - Important operational event
pub struct UniverseStopped {
    pub run_count: u64,
    pub killed: bool,
}

impl Display for UniverseStopped {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let how = if self.killed { "killed" } else { "stopped" };
        write!(f, "Universe {} after {} transactions", how, self.run_count)
    }
}

impl StructuredLog for UniverseStopped {
    fn log(&self) {
        tracing::info!(run_count = self.run_count, killed = self.killed, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("universe_stopped", span_name = name, run_count = self.run_count)
    }
}

/// An action's transaction started.
///
/// # Log Level
/// `debug!` - Traced when `trace.actions` is enabled
pub struct TransactionStarted<'a> {
    pub action: &'a str,
}

impl Display for TransactionStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Transaction '{}' started", self.action)
    }
}

impl StructuredLog for TransactionStarted<'_> {
    fn log(&self) {
        tracing::debug!(action = self.action, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("transaction", span_name = name, action = self.action)
    }
}

/// An action's transaction reached its fixpoint.
///
/// # Log Level
/// `debug!` - Traced when `trace.actions` is enabled
///
/// # Example
/// ```
/// use dclare::observability::messages::engine::TransactionCompleted;
/// use std::time::Duration;
///
/// let msg = TransactionCompleted {
///     action: "add_order",
///     changes: 12,
///     orphans_cleared: 0,
///     duration: Duration::from_millis(3),
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct TransactionCompleted<'a> {
    pub action: &'a str,
    pub changes: u64,
    pub orphans_cleared: usize,
    pub duration: Duration,
}

impl Display for TransactionCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Transaction '{}' completed: {} changes, {} orphans cleared in {:?}",
            self.action, self.changes, self.orphans_cleared, self.duration
        )
    }
}

impl StructuredLog for TransactionCompleted<'_> {
    fn log(&self) {
        tracing::debug!(
            action = self.action,
            changes = self.changes,
            orphans_cleared = self.orphans_cleared,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "transaction_completed",
            span_name = name,
            action = self.action,
            changes = self.changes,
            duration = ?self.duration,
        )
    }
}

/// A transaction failed; the universe stops.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct TransactionFailed<'a> {
    pub action: &'a str,
    pub error: &'a EngineError,
}

impl Display for TransactionFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Transaction '{}' failed: {}", self.action, self.error)
    }
}

impl StructuredLog for TransactionFailed<'_> {
    fn log(&self) {
        tracing::error!(action = self.action, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("transaction_failed", span_name = name, action = self.action)
    }
}

/// An observer rule returned an error; its writes were rolled back.
///
/// # Log Level
/// `warn!` - Recoverable within the transaction
pub struct ObserverFailed<'a> {
    pub instance: &'a ObserverInstance,
    pub error: &'a RuleError,
}

impl Display for ObserverFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Observer {} failed: {}", self.instance, self.error)
    }
}

impl StructuredLog for ObserverFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            observer = %self.instance.observer,
            object = %self.instance.object,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("observer_failed", span_name = name, instance = %self.instance)
    }
}

/// An observer instance exceeded its change limit and will not run again in
/// this transaction.
pub struct ObserverStopped<'a> {
    pub instance: &'a ObserverInstance,
    pub changes: usize,
    pub limit: usize,
}

impl Display for ObserverStopped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Observer {} stopped after {} changes (limit {})",
            self.instance, self.changes, self.limit
        )
    }
}

impl StructuredLog for ObserverStopped<'_> {
    fn log(&self) {
        tracing::warn!(
            observer = %self.instance.observer,
            object = %self.instance.object,
            changes = self.changes,
            limit = self.limit,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("observer_stopped", span_name = name, instance = %self.instance)
    }
}

/// An observer instance was put on the agenda.
///
/// # Log Level
/// `trace!` - Traced when `trace.universe` is enabled
pub struct ObserverTriggered<'a> {
    pub instance: &'a ObserverInstance,
    pub priority: Priority,
}

impl Display for ObserverTriggered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Triggered {} at {} priority", self.instance, self.priority)
    }
}

impl StructuredLog for ObserverTriggered<'_> {
    fn log(&self) {
        tracing::trace!(instance = %self.instance, priority = %self.priority, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!("observer", span_name = name, instance = %self.instance)
    }
}

/// A property changed.
///
/// # Log Level
/// `trace!` - Traced when `trace.mutable` is enabled
pub struct MutableChanged<'a> {
    pub object: &'a ObjectId,
    pub setable: &'a str,
    pub old: &'a Value,
    pub new: &'a Value,
}

impl Display for MutableChanged<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}.{}: {} -> {}", self.object, self.setable, self.old, self.new)
    }
}

impl StructuredLog for MutableChanged<'_> {
    fn log(&self) {
        tracing::trace!(object = %self.object, setable = self.setable, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!("mutable", span_name = name, object = %self.object, setable = self.setable)
    }
}

/// Objects without a parent were reset.
///
/// # Log Level
/// `debug!` - Traced when `trace.universe` is enabled
pub struct OrphansCleared {
    pub count: usize,
}

impl Display for OrphansCleared {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Cleared {} orphans", self.count)
    }
}

impl StructuredLog for OrphansCleared {
    fn log(&self) {
        tracing::debug!(count = self.count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("orphans", span_name = name, count = self.count)
    }
}

/// Parallel branches of a batch conflicted; the batch reruns sequentially.
///
/// # Log Level
/// `debug!` - Expected under contention
pub struct ParallelMergeFallback<'a> {
    pub priority: Priority,
    pub batch_size: usize,
    pub error: &'a EngineError,
}

impl Display for ParallelMergeFallback<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Rerunning {} {} observers sequentially: {}",
            self.batch_size, self.priority, self.error
        )
    }
}

impl StructuredLog for ParallelMergeFallback<'_> {
    fn log(&self) {
        tracing::debug!(
            priority = %self.priority,
            batch_size = self.batch_size,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("merge_fallback", span_name = name, batch_size = self.batch_size)
    }
}

/// Undo or redo moved the universe to another state.
///
/// # Log Level
/// `info!` - Important operational event
pub struct HistoryMoved<'a> {
    pub direction: &'a str,
    pub depth: usize,
}

impl Display for HistoryMoved<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Moved {} in history, {} states behind", self.direction, self.depth)
    }
}

impl StructuredLog for HistoryMoved<'_> {
    fn log(&self) {
        tracing::info!(direction = self.direction, depth = self.depth, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("history", span_name = name, direction = self.direction)
    }
}

/// A constant value was derived and memoized.
///
/// # Log Level
/// `trace!` - Traced when `trace.derivation` is enabled
pub struct ConstantDerived<'a> {
    pub constant: &'a str,
    pub argument: &'a Value,
    pub value: &'a Value,
}

impl Display for ConstantDerived<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Derived {}({}) = {}", self.constant, self.argument, self.value)
    }
}

impl StructuredLog for ConstantDerived<'_> {
    fn log(&self) {
        tracing::trace!(constant = self.constant, argument = %self.argument, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!("constant", span_name = name, constant = self.constant)
    }
}
