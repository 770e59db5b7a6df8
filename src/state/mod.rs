// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Immutable universe state.
//!
//! A [`State`] maps objects to their non-default property values and carries
//! the dependency index that links observer instances to the properties they
//! read. Every write returns a new `State`; unchanged objects are shared
//! between snapshots through `Arc`, so keeping history is cheap.

mod diff;
mod merge;

pub use diff::Change;

use crate::model::{Model, ObjectId, ObserverInstance, SetableId, Value, CONTAINING, PARENT};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

pub type Properties = BTreeMap<SetableId, Value>;

/// One property of one object.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot {
    pub object: ObjectId,
    pub setable: SetableId,
}

impl Slot {
    pub fn new(object: ObjectId, setable: SetableId) -> Self {
        Self { object, setable }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.object, self.setable)
    }
}

#[derive(Clone)]
pub struct State {
    model: Arc<Model>,
    objects: Arc<BTreeMap<ObjectId, Arc<Properties>>>,
    reads: Arc<BTreeMap<ObserverInstance, Arc<BTreeSet<Slot>>>>,
    observers: Arc<BTreeMap<Slot, BTreeSet<ObserverInstance>>>,
}

impl State {
    pub fn new(model: Arc<Model>) -> Self {
        Self {
            model,
            objects: Arc::new(BTreeMap::new()),
            reads: Arc::new(BTreeMap::new()),
            observers: Arc::new(BTreeMap::new()),
        }
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    /// Value of `setable` on `object`, or the setable's default.
    pub fn get(&self, object: &ObjectId, setable: &SetableId) -> Value {
        self.value(object, setable)
            .cloned()
            .unwrap_or_else(|| self.default_of(setable))
    }

    /// Stored (non-default) value, if any.
    pub fn value(&self, object: &ObjectId, setable: &SetableId) -> Option<&Value> {
        self.objects.get(object).and_then(|props| props.get(setable))
    }

    pub fn default_of(&self, setable: &SetableId) -> Value {
        self.model
            .setable(setable)
            .map(|s| s.default.clone())
            .unwrap_or_default()
    }

    /// Returns a state where `object.setable` holds `value`. Storing the
    /// default removes the property, and an object without properties is
    /// removed altogether.
    pub fn set(&self, object: &ObjectId, setable: &SetableId, value: Value) -> State {
        let is_default = value == self.default_of(setable);
        let current = self.value(object, setable);
        if (is_default && current.is_none()) || current == Some(&value) {
            return self.clone();
        }

        let mut next = self.clone();
        let objects = Arc::make_mut(&mut next.objects);
        if is_default {
            if let Some(props) = objects.get_mut(object) {
                Arc::make_mut(props).remove(setable);
                if props.is_empty() {
                    objects.remove(object);
                }
            }
        } else {
            let props = objects.entry(object.clone()).or_default();
            Arc::make_mut(props).insert(setable.clone(), value);
        }
        next
    }

    /// Returns a state without any property of `object`.
    pub fn clear(&self, object: &ObjectId) -> State {
        if !self.objects.contains_key(object) {
            return self.clone();
        }
        let mut next = self.clone();
        Arc::make_mut(&mut next.objects).remove(object);
        next
    }

    pub fn contains(&self, object: &ObjectId) -> bool {
        self.objects.contains_key(object)
    }

    pub fn objects(&self) -> impl Iterator<Item = &ObjectId> {
        self.objects.keys()
    }

    pub fn properties(&self, object: &ObjectId) -> impl Iterator<Item = (&SetableId, &Value)> {
        self.objects.get(object).into_iter().flat_map(|props| props.iter())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn parent(&self, object: &ObjectId) -> Option<ObjectId> {
        self.value(object, &SetableId::new(PARENT))
            .and_then(Value::as_ref_id)
            .cloned()
    }

    /// The setable of the parent that contains `object`.
    pub fn containing(&self, object: &ObjectId) -> Option<SetableId> {
        self.value(object, &SetableId::new(CONTAINING))
            .and_then(Value::as_str)
            .map(SetableId::new)
    }

    /// Objects directly contained by `object`.
    pub fn children(&self, object: &ObjectId) -> BTreeSet<ObjectId> {
        self.model
            .containment_setables_of(&object.class)
            .flat_map(|s| self.get(object, &s.id).refs())
            .collect()
    }

    /// Whether `ancestor` is `object` itself or one of its parents.
    pub fn is_ancestor_or_self(&self, ancestor: &ObjectId, object: &ObjectId) -> bool {
        let mut current = Some(object.clone());
        let mut steps = 0;
        while let Some(id) = current {
            if &id == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.objects.len() {
                return false;
            }
            current = self.parent(&id);
        }
        false
    }

    /// Objects transitively contained by the root, root included.
    pub fn reachable(&self) -> BTreeSet<ObjectId> {
        let mut reachable = BTreeSet::new();
        let mut pending = vec![self.model.root()];
        while let Some(object) = pending.pop() {
            if reachable.insert(object.clone()) {
                pending.extend(self.children(&object));
            }
        }
        reachable
    }

    pub fn reads_of(&self, instance: &ObserverInstance) -> Option<&BTreeSet<Slot>> {
        self.reads.get(instance).map(|reads| reads.as_ref())
    }

    pub fn observers_of(&self, slot: &Slot) -> impl Iterator<Item = &ObserverInstance> {
        self.observers.get(slot).into_iter().flat_map(|set| set.iter())
    }

    pub fn observer_count(&self, slot: &Slot) -> usize {
        self.observers.get(slot).map_or(0, BTreeSet::len)
    }

    pub fn instances(&self) -> impl Iterator<Item = &ObserverInstance> {
        self.reads.keys()
    }

    /// Replaces the recorded reads of `instance`, keeping the reverse index in step.
    pub fn with_reads(&self, instance: &ObserverInstance, reads: BTreeSet<Slot>) -> State {
        if self.reads_of(instance) == Some(&reads) {
            return self.clone();
        }
        let mut next = self.clone();
        next.drop_reads(instance);
        if !reads.is_empty() {
            let index = Arc::make_mut(&mut next.observers);
            for slot in &reads {
                index.entry(slot.clone()).or_default().insert(instance.clone());
            }
            Arc::make_mut(&mut next.reads).insert(instance.clone(), Arc::new(reads));
        }
        next
    }

    /// Forgets every observer instance bound to `object`.
    pub fn without_instances_of(&self, object: &ObjectId) -> State {
        let instances: Vec<ObserverInstance> = self
            .reads
            .keys()
            .filter(|instance| &instance.object == object)
            .cloned()
            .collect();
        if instances.is_empty() {
            return self.clone();
        }
        let mut next = self.clone();
        for instance in &instances {
            next.drop_reads(instance);
        }
        next
    }

    fn drop_reads(&mut self, instance: &ObserverInstance) {
        let Some(previous) = Arc::make_mut(&mut self.reads).remove(instance) else {
            return;
        };
        let index = Arc::make_mut(&mut self.observers);
        for slot in previous.iter() {
            if let Some(set) = index.get_mut(slot) {
                set.remove(instance);
                if set.is_empty() {
                    index.remove(slot);
                }
            }
        }
    }

    pub(crate) fn shares_objects_with(&self, other: &State) -> bool {
        Arc::ptr_eq(&self.objects, &other.objects)
    }

    /// Multi-line listing of every object and property, sorted.
    pub fn as_string(&self) -> String {
        self.to_string()
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.shares_objects_with(other) || self.objects == other.objects
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("objects", &self.objects.len())
            .field("instances", &self.reads.len())
            .finish()
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (object, props) in self.objects.iter() {
            writeln!(f, "{}", object)?;
            for (setable, value) in props.iter() {
                writeln!(f, "    {} = {}", setable, value)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MutableClass, Setable};

    pub(crate) fn model() -> Arc<Model> {
        Arc::new(
            Model::builder("Universe")
                .class(MutableClass::new("Universe").with_setable("items"))
                .class(MutableClass::new("Item").with_setable("name").with_setable("tags"))
                .setable(Setable::new("items").default(Value::empty_set()).containment())
                .setable(Setable::new("name"))
                .setable(Setable::new("tags").default(Value::empty_set()))
                .setable(Setable::new("count").default(Value::Int(0)))
                .build()
                .unwrap(),
        )
    }

    fn item(key: &str) -> ObjectId {
        ObjectId::new("Item", key)
    }

    #[test]
    fn test_get_returns_default_when_absent() {
        let state = State::new(model());
        assert_eq!(state.get(&item("1"), &"count".into()), Value::Int(0));
        assert_eq!(state.get(&item("1"), &"name".into()), Value::Null);
    }

    #[test]
    fn test_set_is_persistent() {
        let empty = State::new(model());
        let one = empty.set(&item("1"), &"name".into(), "a".into());

        assert!(empty.is_empty());
        assert_eq!(one.get(&item("1"), &"name".into()), Value::from("a"));
        assert_eq!(one.len(), 1);
    }

    #[test]
    fn test_setting_default_removes_property_and_object() {
        let state = State::new(model())
            .set(&item("1"), &"count".into(), Value::Int(3))
            .set(&item("1"), &"count".into(), Value::Int(0));

        assert!(!state.contains(&item("1")));
        assert!(state.is_empty());
    }

    #[test]
    fn test_unchanged_set_shares_objects() {
        let state = State::new(model()).set(&item("1"), &"name".into(), "a".into());
        let same = state.set(&item("1"), &"name".into(), "a".into());
        assert!(same.shares_objects_with(&state));
    }

    #[test]
    fn test_children_and_reachable() {
        let root = model().root();
        let state = State::new(model())
            .set(&root, &"items".into(), Value::set_of([Value::Ref(item("1"))]))
            .set(&item("1"), &PARENT.into(), Value::Ref(root.clone()))
            .set(&item("2"), &"name".into(), "loose".into());

        assert_eq!(state.children(&root), [item("1")].into_iter().collect());
        let reachable = state.reachable();
        assert!(reachable.contains(&root));
        assert!(reachable.contains(&item("1")));
        assert!(!reachable.contains(&item("2")));
        assert!(state.is_ancestor_or_self(&root, &item("1")));
        assert!(!state.is_ancestor_or_self(&item("1"), &root));
    }

    #[test]
    fn test_with_reads_maintains_reverse_index() {
        let instance = ObserverInstance::new("rule".into(), item("1"));
        let a = Slot::new(item("1"), "name".into());
        let b = Slot::new(item("2"), "name".into());

        let state = State::new(model()).with_reads(&instance, [a.clone(), b.clone()].into_iter().collect());
        assert_eq!(state.observer_count(&a), 1);
        assert_eq!(state.observer_count(&b), 1);

        let state = state.with_reads(&instance, [b.clone()].into_iter().collect());
        assert_eq!(state.observer_count(&a), 0);
        assert_eq!(state.observers_of(&b).next(), Some(&instance));

        let state = state.without_instances_of(&item("1"));
        assert_eq!(state.observer_count(&b), 0);
        assert_eq!(state.instances().count(), 0);
    }

    #[test]
    fn test_display_lists_properties() {
        let state = State::new(model()).set(&item("1"), &"name".into(), "a".into());
        assert_eq!(state.as_string(), "Item:1\n    name = \"a\"\n");
    }
}
