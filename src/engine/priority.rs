// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Priority-ordered agenda of triggered observer instances.
//!
//! Observer instances that must (re)run during a transaction are queued on an
//! [`Agenda`]. The agenda is drained by priority: everything queued at the
//! highest priority present forms the next batch, which may run in parallel.
//!
//! # Ordering
//!
//! Entries are ordered by:
//! 1. **Priority** (`Immediate` > `Urgent` > `Forward` > `Backward`)
//! 2. **Arrival** (earlier first, so equal priorities run FIFO)
//!
//! # Deduplication
//!
//! An instance is queued at most once. Triggering it again at a higher
//! priority promotes it; a lower priority is ignored. Promotion leaves a stale
//! heap entry behind which is skipped when popped.
//!
//! # Stopped instances
//!
//! Instances stopped for the rest of a transaction (after failing) are kept
//! in separate storage instead of the heap, the same way blocked work is set
//! aside, so they never reach a batch.
//!
//! ```rust
//! use dclare::engine::{Agenda, Priority};
//! use dclare::model::{ObjectId, ObserverInstance};
//!
//! let instance = |id: &str| ObserverInstance::new(id.into(), ObjectId::new("Item", "1"));
//!
//! let mut agenda = Agenda::new();
//! agenda.push(instance("total"), Priority::Forward);
//! agenda.push(instance("undo"), Priority::Backward);
//! agenda.push(instance("label"), Priority::Forward);
//!
//! let (priority, batch) = agenda.pop_batch().unwrap();
//! assert_eq!(priority, Priority::Forward);
//! assert_eq!(batch, vec![instance("total"), instance("label")]);
//! assert_eq!(agenda.pop_batch().unwrap().0, Priority::Backward);
//! ```

use crate::model::{ObjectId, ObserverInstance};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::fmt;

/// Scheduling priority of an observer instance, lowest first.
///
/// `Backward` work only runs when nothing else is queued. `Immediate` is
/// used when an instance re-triggers itself after changing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Backward,
    Forward,
    Urgent,
    Immediate,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Priority::Backward => "backward",
            Priority::Forward => "forward",
            Priority::Urgent => "urgent",
            Priority::Immediate => "immediate",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
struct AgendaEntry {
    instance: ObserverInstance,
    priority: Priority,
    sequence: u64,
}

impl PartialEq for AgendaEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.sequence == other.sequence
    }
}

impl Eq for AgendaEntry {}

impl PartialOrd for AgendaEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AgendaEntry {
    // Max-heap: higher priority first, then lower sequence (earlier arrival) first.
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

#[derive(Debug, Default)]
pub struct Agenda {
    heap: BinaryHeap<AgendaEntry>,
    // Live priority of every queued instance; heap entries disagreeing with it are stale.
    queued: HashMap<ObserverInstance, Priority>,
    stopped: HashSet<ObserverInstance>,
    stopped_tasks: HashMap<ObserverInstance, Priority>,
    sequence: u64,
}

impl Agenda {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `instance`. Returns whether the agenda changed.
    pub fn push(&mut self, instance: ObserverInstance, priority: Priority) -> bool {
        if self.stopped.contains(&instance) {
            let stored = self.stopped_tasks.entry(instance).or_insert(priority);
            *stored = (*stored).max(priority);
            return false;
        }
        if let Some(current) = self.queued.get(&instance) {
            if *current >= priority {
                return false;
            }
        }

        self.sequence += 1;
        self.queued.insert(instance.clone(), priority);
        self.heap.push(AgendaEntry {
            instance,
            priority,
            sequence: self.sequence,
        });
        true
    }

    /// Removes the highest priority runnable instance.
    pub fn pop_next(&mut self) -> Option<(ObserverInstance, Priority)> {
        self.discard_stale();
        let entry = self.heap.pop()?;
        self.queued.remove(&entry.instance);
        Some((entry.instance, entry.priority))
    }

    /// Removes every runnable instance queued at the highest priority present.
    pub fn pop_batch(&mut self) -> Option<(Priority, Vec<ObserverInstance>)> {
        let (first, priority) = self.pop_next()?;
        let mut batch = vec![first];
        loop {
            self.discard_stale();
            match self.heap.peek() {
                Some(entry) if entry.priority == priority => {
                    if let Some((instance, _)) = self.pop_next() {
                        batch.push(instance);
                    }
                }
                _ => break,
            }
        }
        Some((priority, batch))
    }

    fn discard_stale(&mut self) {
        while let Some(top) = self.heap.peek() {
            if self.queued.get(&top.instance) == Some(&top.priority) {
                return;
            }
            self.heap.pop();
        }
    }

    /// Prevents `instance` from running again in this agenda's transaction.
    pub fn stop(&mut self, instance: &ObserverInstance) {
        self.stopped.insert(instance.clone());
        if let Some(priority) = self.queued.remove(instance) {
            self.stopped_tasks.insert(instance.clone(), priority);
        }
    }

    pub fn is_stopped(&self, instance: &ObserverInstance) -> bool {
        self.stopped.contains(instance)
    }

    /// Drops every queued instance bound to `object`.
    pub fn remove_object(&mut self, object: &ObjectId) {
        self.queued.retain(|instance, _| &instance.object != object);
        self.stopped_tasks.retain(|instance, _| &instance.object != object);
    }

    /// Whether anything runnable is queued.
    pub fn has_runnable(&self) -> bool {
        !self.queued.is_empty()
    }

    /// Check if the agenda is empty (runnable and stopped instances)
    pub fn is_empty(&self) -> bool {
        self.queued.is_empty() && self.stopped_tasks.is_empty()
    }

    /// Number of queued instances, stopped ones included
    pub fn len(&self) -> usize {
        self.queued.len() + self.stopped_tasks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(observer: &str, key: &str) -> ObserverInstance {
        ObserverInstance::new(observer.into(), ObjectId::new("Item", key))
    }

    #[test]
    fn test_priority_ordering() {
        let mut agenda = Agenda::new();
        agenda.push(instance("low", "1"), Priority::Backward);
        agenda.push(instance("high", "1"), Priority::Immediate);
        agenda.push(instance("mid", "1"), Priority::Forward);

        assert_eq!(agenda.pop_next(), Some((instance("high", "1"), Priority::Immediate)));
        assert_eq!(agenda.pop_next(), Some((instance("mid", "1"), Priority::Forward)));
        assert_eq!(agenda.pop_next(), Some((instance("low", "1"), Priority::Backward)));
        assert_eq!(agenda.pop_next(), None);
    }

    #[test]
    fn test_equal_priorities_are_fifo() {
        let mut agenda = Agenda::new();
        agenda.push(instance("b", "1"), Priority::Forward);
        agenda.push(instance("a", "1"), Priority::Forward);

        assert_eq!(agenda.pop_next().unwrap().0, instance("b", "1"));
        assert_eq!(agenda.pop_next().unwrap().0, instance("a", "1"));
    }

    #[test]
    fn test_duplicate_push_is_ignored() {
        let mut agenda = Agenda::new();
        assert!(agenda.push(instance("a", "1"), Priority::Forward));
        assert!(!agenda.push(instance("a", "1"), Priority::Forward));
        assert!(!agenda.push(instance("a", "1"), Priority::Backward));
        assert_eq!(agenda.len(), 1);
    }

    #[test]
    fn test_higher_priority_promotes() {
        let mut agenda = Agenda::new();
        agenda.push(instance("a", "1"), Priority::Forward);
        agenda.push(instance("b", "1"), Priority::Urgent);
        assert!(agenda.push(instance("a", "1"), Priority::Immediate));

        assert_eq!(agenda.pop_next(), Some((instance("a", "1"), Priority::Immediate)));
        assert_eq!(agenda.pop_next(), Some((instance("b", "1"), Priority::Urgent)));
        // the stale forward entry for "a" is skipped
        assert_eq!(agenda.pop_next(), None);
        assert!(agenda.is_empty());
    }

    #[test]
    fn test_pop_batch_takes_whole_priority_level() {
        let mut agenda = Agenda::new();
        agenda.push(instance("a", "1"), Priority::Forward);
        agenda.push(instance("b", "1"), Priority::Forward);
        agenda.push(instance("c", "1"), Priority::Backward);
        agenda.push(instance("d", "1"), Priority::Forward);

        let (priority, batch) = agenda.pop_batch().unwrap();
        assert_eq!(priority, Priority::Forward);
        assert_eq!(batch, vec![instance("a", "1"), instance("b", "1"), instance("d", "1")]);

        let (priority, batch) = agenda.pop_batch().unwrap();
        assert_eq!(priority, Priority::Backward);
        assert_eq!(batch, vec![instance("c", "1")]);
        assert!(agenda.pop_batch().is_none());
    }

    #[test]
    fn test_stopped_instances_are_set_aside() {
        let mut agenda = Agenda::new();
        agenda.push(instance("a", "1"), Priority::Forward);
        agenda.push(instance("b", "1"), Priority::Forward);
        agenda.stop(&instance("a", "1"));

        assert!(agenda.is_stopped(&instance("a", "1")));
        assert_eq!(agenda.len(), 2);
        assert!(!agenda.push(instance("a", "1"), Priority::Immediate));

        assert_eq!(agenda.pop_next().unwrap().0, instance("b", "1"));
        assert_eq!(agenda.pop_next(), None);
        assert!(!agenda.has_runnable());
        assert!(!agenda.is_empty());
    }

    #[test]
    fn test_remove_object_drops_its_instances() {
        let mut agenda = Agenda::new();
        agenda.push(instance("a", "1"), Priority::Forward);
        agenda.push(instance("a", "2"), Priority::Forward);
        agenda.remove_object(&ObjectId::new("Item", "1"));

        assert_eq!(agenda.pop_next().unwrap().0, instance("a", "2"));
        assert_eq!(agenda.pop_next(), None);
    }
}
