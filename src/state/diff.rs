// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::model::{ObjectId, SetableId, Value};
use crate::state::{Slot, State};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// A property whose value differs between two states.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub object: ObjectId,
    pub setable: SetableId,
    pub old: Value,
    pub new: Value,
}

impl Change {
    pub fn slot(&self) -> Slot {
        Slot::new(self.object.clone(), self.setable.clone())
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}: {} -> {}", self.object, self.setable, self.old, self.new)
    }
}

impl State {
    /// Property changes from `self` to `newer`, ordered by object then setable.
    pub fn diff(&self, newer: &State) -> Vec<Change> {
        if self.shares_objects_with(newer) {
            return Vec::new();
        }

        let objects: BTreeSet<&ObjectId> = self.objects.keys().chain(newer.objects.keys()).collect();
        let mut changes = Vec::new();
        for object in objects {
            let before = self.objects.get(object);
            let after = newer.objects.get(object);
            if let (Some(b), Some(a)) = (before, after) {
                if Arc::ptr_eq(b, a) {
                    continue;
                }
            }

            let setables: BTreeSet<&SetableId> = before
                .into_iter()
                .flat_map(|props| props.keys())
                .chain(after.into_iter().flat_map(|props| props.keys()))
                .collect();
            for setable in setables {
                let old = self.get(object, setable);
                let new = newer.get(object, setable);
                if old != new {
                    changes.push(Change {
                        object: object.clone(),
                        setable: setable.clone(),
                        old,
                        new,
                    });
                }
            }
        }
        changes
    }

    /// Human readable rendering of [`State::diff`], one change per line.
    pub fn diff_string(&self, newer: &State) -> String {
        self.diff(newer)
            .iter()
            .map(|change| format!("{}\n", change))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::model;

    #[test]
    fn test_diff_reports_added_changed_and_removed() {
        let a = ObjectId::new("Item", "a");
        let b = ObjectId::new("Item", "b");
        let before = State::new(model())
            .set(&a, &"name".into(), "x".into())
            .set(&b, &"name".into(), "gone".into());
        let after = before
            .set(&a, &"name".into(), "y".into())
            .set(&a, &"count".into(), Value::Int(2))
            .set(&b, &"name".into(), Value::Null);

        let changes = before.diff(&after);
        assert_eq!(changes.len(), 3);
        assert_eq!(changes[0].setable.as_str(), "count");
        assert_eq!(changes[0].old, Value::Int(0));
        assert_eq!(changes[1].new, Value::from("y"));
        assert_eq!(changes[2].object, b);
        assert_eq!(changes[2].new, Value::Null);
    }

    #[test]
    fn test_diff_of_identical_states_is_empty() {
        let state = State::new(model()).set(&ObjectId::new("Item", "a"), &"name".into(), "x".into());
        assert!(state.diff(&state.clone()).is_empty());
    }

    #[test]
    fn test_diff_string() {
        let a = ObjectId::new("Item", "a");
        let before = State::new(model());
        let after = before.set(&a, &"name".into(), "x".into());
        assert_eq!(before.diff_string(&after), "Item:a.name: null -> \"x\"\n");
    }
}
