// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::EngineError;
use crate::model::Value;
use crate::state::State;
use std::collections::BTreeSet;

impl State {
    /// Three-way merge of states that were each derived from `base`.
    ///
    /// A property changed by one branch takes that branch's value. Two branches
    /// agreeing on a value is fine. Set values merge their additions and
    /// removals. Any other disagreement is [`EngineError::NotMergeable`].
    /// Dependency reads are taken from whichever branch changed them.
    pub fn merge(base: &State, branches: &[State]) -> Result<State, EngineError> {
        let mut merged = base.clone();

        for branch in branches {
            for change in base.diff(branch) {
                let current = merged.get(&change.object, &change.setable);
                let value = if current == change.old || current == change.new {
                    change.new
                } else {
                    match (&current, &change.old, &change.new) {
                        (Value::Set(current), Value::Set(old), Value::Set(new)) => Value::Set(merge_sets(current, old, new)),
                        _ => {
                            return Err(EngineError::NotMergeable {
                                object: change.object,
                                setable: change.setable,
                            })
                        }
                    }
                };
                merged = merged.set(&change.object, &change.setable, value);
            }

            for instance in branch.instances() {
                if base.reads_of(instance) != branch.reads_of(instance) {
                    let reads = branch.reads_of(instance).cloned().unwrap_or_default();
                    merged = merged.with_reads(instance, reads);
                }
            }
            for instance in base.instances() {
                if branch.reads_of(instance).is_none() {
                    merged = merged.with_reads(instance, BTreeSet::new());
                }
            }
        }

        Ok(merged)
    }
}

fn merge_sets(current: &BTreeSet<Value>, old: &BTreeSet<Value>, new: &BTreeSet<Value>) -> BTreeSet<Value> {
    let added = new.difference(old);
    let removed: BTreeSet<&Value> = old.difference(new).collect();
    current
        .iter()
        .filter(|v| !removed.contains(v))
        .chain(added)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ObjectId, ObserverInstance};
    use crate::state::tests::model;
    use crate::state::Slot;

    fn item() -> ObjectId {
        ObjectId::new("Item", "1")
    }

    #[test]
    fn test_disjoint_changes_merge() {
        let base = State::new(model());
        let left = base.set(&item(), &"name".into(), "left".into());
        let right = base.set(&item(), &"count".into(), Value::Int(5));

        let merged = State::merge(&base, &[left, right]).unwrap();
        assert_eq!(merged.get(&item(), &"name".into()), Value::from("left"));
        assert_eq!(merged.get(&item(), &"count".into()), Value::Int(5));
    }

    #[test]
    fn test_equal_changes_merge() {
        let base = State::new(model());
        let left = base.set(&item(), &"name".into(), "same".into());
        let right = left.clone();

        let merged = State::merge(&base, &[left, right]).unwrap();
        assert_eq!(merged.get(&item(), &"name".into()), Value::from("same"));
    }

    #[test]
    fn test_conflicting_scalars_are_not_mergeable() {
        let base = State::new(model());
        let left = base.set(&item(), &"name".into(), "left".into());
        let right = base.set(&item(), &"name".into(), "right".into());

        let err = State::merge(&base, &[left, right]).unwrap_err();
        assert!(matches!(err, EngineError::NotMergeable { .. }));
    }

    #[test]
    fn test_set_additions_and_removals_merge() {
        let tags = "tags".into();
        let base = State::new(model()).set(&item(), &tags, Value::set_of([Value::Int(1), Value::Int(2)]));
        let left = base.set(&item(), &tags, Value::set_of([Value::Int(1), Value::Int(2), Value::Int(3)]));
        let right = base.set(&item(), &tags, Value::set_of([Value::Int(2)]));

        let merged = State::merge(&base, &[left, right]).unwrap();
        assert_eq!(merged.get(&item(), &tags), Value::set_of([Value::Int(2), Value::Int(3)]));
    }

    #[test]
    fn test_reads_follow_branches() {
        let base = State::new(model());
        let a = ObserverInstance::new("a".into(), item());
        let b = ObserverInstance::new("b".into(), item());
        let slot = Slot::new(item(), "name".into());
        let left = base.with_reads(&a, [slot.clone()].into_iter().collect());
        let right = base.with_reads(&b, [slot.clone()].into_iter().collect());

        let merged = State::merge(&base, &[left, right]).unwrap();
        assert_eq!(merged.observer_count(&slot), 2);
    }
}
