// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Runs one action to a fixpoint.
//!
//! The action's writes trigger every observer instance that read a changed
//! property. Triggered instances are drained from the [`Agenda`] one priority
//! level at a time; a level with several instances runs in parallel on the
//! same base state and the branches are merged. When branches conflict the
//! level is rerun sequentially.
//!
//! Once nothing is left to run, objects that lost their parent are cleared
//! (which may trigger more observers) until no orphans remain.

use crate::config::DclareConfig;
use crate::engine::constants::ConstantState;
use crate::engine::leaf::{LeafOutcome, LeafTransaction, Scope};
use crate::engine::priority::{Agenda, Priority};
use crate::engine::statistics::UniverseStatistics;
use crate::errors::{ConsistencyError, EngineError};
use crate::model::{Action, Model, ObjectId, Observer, ObserverInstance, PARENT};
use crate::observability::messages::engine::{
    ObserverFailed, ObserverStopped, ObserverTriggered, OrphansCleared, ParallelMergeFallback,
};
use crate::observability::messages::StructuredLog;
use crate::state::State;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// Result of a transaction that ran to its fixpoint.
#[derive(Debug)]
pub struct TransactionOutcome {
    pub state: State,
    /// Observers that failed, whose writes were rolled back, and observers
    /// stopped for making too many changes.
    pub failures: Vec<ConsistencyError>,
    pub changes: u64,
    pub orphans_cleared: usize,
}

#[derive(Default)]
struct Bookkeeping {
    agenda: Agenda,
    changes_by: HashMap<ObserverInstance, usize>,
    failures: BTreeMap<ObserverInstance, ConsistencyError>,
    unparented: BTreeSet<ObjectId>,
    changes: u64,
}

pub(crate) struct Propagator<'a> {
    pub model: &'a Arc<Model>,
    pub config: &'a DclareConfig,
    pub constants: &'a ConstantState,
    pub stats: &'a UniverseStatistics,
}

impl<'a> Propagator<'a> {
    /// Runs `action` on `pre`, first activating the observers of `activate`.
    pub fn run(&self, pre: &State, action: &Action, activate: &[ObjectId]) -> Result<TransactionOutcome, EngineError> {
        let scope = Scope {
            pre,
            constants: self.constants,
            config: self.config,
        };
        let mut books = Bookkeeping::default();

        let mut leaf = LeafTransaction::new(scope, pre.clone(), None);
        let result = (action.body)(&mut leaf);
        let outcome = leaf.finish(result);
        if let Some(error) = &outcome.error {
            return Err(EngineError::Rule {
                culprit: action.name.to_string(),
                message: error.to_string(),
            });
        }

        for object in activate {
            self.activate(&mut books, object);
        }
        let mut state = outcome.state.clone();
        self.absorb(&mut books, pre, &state, &outcome, None)?;

        let mut orphans_cleared = 0;
        loop {
            while let Some((priority, batch)) = books.agenda.pop_batch() {
                state = self.run_batch(&mut books, scope, state, priority, batch)?;
            }
            let (next, cleared) = self.clear_orphans(&mut books, scope, state)?;
            state = next;
            orphans_cleared += cleared;
            if cleared == 0 && !books.agenda.has_runnable() {
                break;
            }
        }

        let failures = books.failures.into_values().collect();
        Ok(TransactionOutcome {
            state,
            failures,
            changes: books.changes,
            orphans_cleared,
        })
    }

    fn activate(&self, books: &mut Bookkeeping, object: &ObjectId) {
        for observer in self.model.observers_of(&object.class) {
            let instance = ObserverInstance::new(observer.id.clone(), object.clone());
            self.trigger(books, instance, observer.trigger_priority());
        }
    }

    fn trigger(&self, books: &mut Bookkeeping, instance: ObserverInstance, priority: Priority) {
        if self.config.is_trace_universe() {
            if books.agenda.push(instance.clone(), priority) {
                ObserverTriggered {
                    instance: &instance,
                    priority,
                }
                .log();
            }
        } else {
            books.agenda.push(instance, priority);
        }
    }

    /// Triggers observers of every property a leaf changed between `before`
    /// and `current`, skipping the writer itself.
    fn absorb(
        &self,
        books: &mut Bookkeeping,
        before: &State,
        current: &State,
        outcome: &LeafOutcome,
        writer: Option<&ObserverInstance>,
    ) -> Result<(), EngineError> {
        for slot in &outcome.written {
            if slot.setable.as_str() == PARENT {
                books.unparented.insert(slot.object.clone());
            }
            if before.get(&slot.object, &slot.setable) == current.get(&slot.object, &slot.setable) {
                continue;
            }
            let triggered: Vec<ObserverInstance> = current
                .observers_of(slot)
                .filter(|instance| Some(*instance) != writer)
                .cloned()
                .collect();
            for instance in triggered {
                let priority = self
                    .model
                    .observer(&instance.observer)
                    .map_or(Priority::Forward, Observer::trigger_priority);
                self.trigger(books, instance, priority);
            }
        }
        for object in &outcome.activated {
            self.activate(books, object);
        }

        books.changes += outcome.changes as u64;
        let total = self.stats.bump_and_get_total_changes(outcome.changes as u64);
        let limit = self.config.max_total_nr_of_changes();
        if total > limit as u64 {
            return Err(EngineError::TooManyChanges {
                culprit: "transaction".to_string(),
                changes: total as usize,
                limit,
            });
        }
        Ok(())
    }

    fn run_observer(&self, scope: Scope<'_>, base: &State, instance: &ObserverInstance) -> LeafOutcome {
        let observer = self.model.observer(&instance.observer);
        let alive = base.contains(&instance.object) || instance.object == self.model.root();
        let Some(observer) = observer.filter(|_| alive) else {
            let leaf = LeafTransaction::new(scope, base.with_reads(instance, BTreeSet::new()), None);
            return leaf.finish(Ok(()));
        };

        let mut leaf = LeafTransaction::new(scope, base.clone(), Some(instance.clone()));
        let result = (observer.rule)(&mut leaf, &instance.object);
        let mut outcome = leaf.finish(result);

        let limit = self.config.max_nr_of_observed();
        if outcome.error.is_none() && outcome.reads.len() > limit {
            outcome.error = Some(
                EngineError::TooManyObserved {
                    instance: instance.to_string(),
                    observed: outcome.reads.len(),
                    limit,
                }
                .into(),
            );
        }

        if outcome.error.is_some() {
            outcome.state = base.with_reads(instance, outcome.reads.clone());
            outcome.written.clear();
            outcome.activated.clear();
            outcome.changes = 0;
        } else {
            outcome.state = outcome.state.with_reads(instance, outcome.reads.clone());
        }
        outcome
    }

    /// Bookkeeping after one observer run: failures, change limits, the
    /// immediate self re-trigger and triggering of dependents.
    fn settle(
        &self,
        books: &mut Bookkeeping,
        instance: &ObserverInstance,
        before: &State,
        current: &State,
        outcome: &LeafOutcome,
    ) -> Result<(), EngineError> {
        if let Some(error) = &outcome.error {
            ObserverFailed { instance, error }.log();
            let checks = self
                .model
                .observer(&instance.observer)
                .map_or(true, |o| o.checks_consistency);
            if checks {
                let failure = ConsistencyError::ObserverFailed {
                    instance: instance.clone(),
                    message: error.to_string(),
                };
                books.failures.insert(instance.clone(), failure);
            }
            books.agenda.stop(instance);
            return Ok(());
        }

        let max_observers = self.config.max_nr_of_observers();
        for slot in &outcome.reads {
            let observers = current.observer_count(slot);
            if observers > max_observers {
                return Err(EngineError::TooManyObservers {
                    object: slot.object.clone(),
                    setable: slot.setable.clone(),
                    observers,
                    limit: max_observers,
                });
            }
        }

        let changes = books.changes_by.entry(instance.clone()).or_default();
        *changes += outcome.changes;
        let changes = *changes;
        let limit = self.config.max_nr_of_changes();
        if changes > limit {
            // The last run is kept; only this instance stops.
            ObserverStopped {
                instance,
                changes,
                limit,
            }
            .log();
            books.agenda.stop(instance);
            books.failures.insert(
                instance.clone(),
                ConsistencyError::ObserverStopped {
                    instance: instance.clone(),
                    changes,
                    limit,
                },
            );
        } else if outcome.changes > 0 {
            self.trigger(books, instance.clone(), Priority::Immediate);
        }

        self.absorb(books, before, current, outcome, Some(instance))
    }

    fn run_batch(
        &self,
        books: &mut Bookkeeping,
        scope: Scope<'_>,
        state: State,
        priority: Priority,
        batch: Vec<ObserverInstance>,
    ) -> Result<State, EngineError> {
        self.stats.bump_forward_count(batch.len() as u64);

        if batch.len() > 1 && !self.config.is_run_sequential() {
            let outcomes: Vec<LeafOutcome> = batch
                .par_iter()
                .map(|instance| self.run_observer(scope, &state, instance))
                .collect();
            let branches: Vec<State> = outcomes.iter().map(|o| o.state.clone()).collect();
            match State::merge(&state, &branches) {
                Ok(merged) => {
                    for (instance, outcome) in batch.iter().zip(outcomes.iter()) {
                        self.settle(books, instance, &state, &merged, outcome)?;
                    }
                    return Ok(merged);
                }
                Err(error) => {
                    ParallelMergeFallback {
                        priority,
                        batch_size: batch.len(),
                        error: &error,
                    }
                    .log();
                }
            }
        }

        let mut state = state;
        for instance in &batch {
            if books.agenda.is_stopped(instance) {
                continue;
            }
            let outcome = self.run_observer(scope, &state, instance);
            let before = std::mem::replace(&mut state, outcome.state.clone());
            self.settle(books, instance, &before, &state, &outcome)?;
        }
        Ok(state)
    }

    /// Resets the state of objects that lost their parent in this transaction.
    fn clear_orphans(&self, books: &mut Bookkeeping, scope: Scope<'_>, state: State) -> Result<(State, usize), EngineError> {
        let root = self.model.root();
        let candidates = std::mem::take(&mut books.unparented);
        let orphans: Vec<ObjectId> = candidates
            .into_iter()
            .filter(|object| *object != root && state.contains(object) && state.parent(object).is_none())
            .collect();
        if orphans.is_empty() {
            return Ok((state, 0));
        }

        let mut leaf = LeafTransaction::new(scope, state.clone(), None);
        for orphan in &orphans {
            leaf.clear(orphan)?;
        }
        let outcome = leaf.finish(Ok(()));

        let mut next = outcome.state.clone();
        for orphan in &orphans {
            next = next.without_instances_of(orphan);
            books.agenda.remove_object(orphan);
        }
        self.absorb(books, &state, &next, &outcome, None)?;

        if self.config.is_trace_universe() {
            OrphansCleared { count: orphans.len() }.log();
        }
        Ok((next, orphans.len()))
    }
}
