// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::state::State;
use std::collections::VecDeque;

/// Undo/redo stacks of universe states.
///
/// The oldest entry is the state before initialization. Undo never goes back
/// past the initialized state, so at least one entry always stays.
#[derive(Debug)]
pub struct History {
    past: VecDeque<State>,
    future: Vec<State>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Records the state a completed transaction started from. Clears redo.
    pub fn record(&mut self, pre: State) {
        self.past.push_back(pre);
        self.future.clear();
        while self.past.len() > self.capacity {
            self.past.pop_front();
        }
    }

    pub fn can_undo(&self) -> bool {
        self.past.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Returns the previous state, keeping `current` for redo.
    pub fn undo(&mut self, current: State) -> Option<State> {
        if !self.can_undo() {
            return None;
        }
        let previous = self.past.pop_back()?;
        self.future.push(current);
        Some(previous)
    }

    /// Returns the next state, keeping `current` for undo.
    pub fn redo(&mut self, current: State) -> Option<State> {
        let next = self.future.pop()?;
        self.past.push_back(current);
        Some(next)
    }

    pub fn len(&self) -> usize {
        self.past.len()
    }

    pub fn is_empty(&self) -> bool {
        self.past.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Model, MutableClass, ObjectId, Setable, Value};
    use std::sync::Arc;

    fn states() -> Vec<State> {
        let model = Arc::new(
            Model::builder("Universe")
                .class(MutableClass::new("Universe"))
                .setable(Setable::new("n").default(Value::Int(0)))
                .build()
                .unwrap(),
        );
        let root = model.root();
        let empty = State::new(model);
        (0..4).map(|n| empty.set(&root, &"n".into(), Value::Int(n))).collect()
    }

    fn n(state: &State) -> Value {
        state.get(&ObjectId::new("Universe", "root"), &"n".into())
    }

    #[test]
    fn test_undo_redo() {
        let s = states();
        let mut history = History::new(10);
        history.record(s[0].clone());
        history.record(s[1].clone());
        history.record(s[2].clone());

        let back = history.undo(s[3].clone()).unwrap();
        assert_eq!(n(&back), Value::Int(2));
        let back = history.undo(back).unwrap();
        assert_eq!(n(&back), Value::Int(1));
        assert!(!history.can_undo());
        assert!(history.undo(back.clone()).is_none());

        let forward = history.redo(back).unwrap();
        assert_eq!(n(&forward), Value::Int(2));
        let forward = history.redo(forward).unwrap();
        assert_eq!(n(&forward), Value::Int(3));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_record_clears_redo() {
        let s = states();
        let mut history = History::new(10);
        history.record(s[0].clone());
        history.record(s[1].clone());
        let back = history.undo(s[2].clone()).unwrap();
        assert!(history.can_redo());

        history.record(back);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let s = states();
        let mut history = History::new(2);
        for state in &s {
            history.record(state.clone());
        }
        assert_eq!(history.len(), 2);
        let back = history.undo(s[0].clone()).unwrap();
        assert_eq!(n(&back), Value::Int(3));
    }
}
