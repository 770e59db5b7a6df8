// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The transaction context handed to actions and observer rules.
//!
//! A [`LeafTransaction`] works on a private copy of the state. Reads made by
//! an observer are recorded so the observer can be re-triggered when any of
//! them changes. Writes keep containment (parent links) and opposites in
//! step, so a rule only ever sets one side of a relation.
//!
//! Outside the propagation loop a leaf can run read-only, or deriving: in a
//! deriving leaf the observed properties of objects that are not contained
//! by the universe are computed on first read by running the observers of
//! their class. Such values live only as long as the leaf.

use crate::config::DclareConfig;
use crate::engine::constants::ConstantState;
use crate::errors::{EngineError, RuleError};
use crate::model::{ClassId, ConstantId, Model, ObjectId, ObserverInstance, Setable, SetableId, Value, CONTAINING, PARENT};
use crate::observability::messages::engine::{MutableChanged, ObserverFailed};
use crate::observability::messages::StructuredLog;
use crate::state::{Slot, State};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Shared, read-only surroundings of every leaf in one universe transaction.
#[derive(Clone, Copy)]
pub(crate) struct Scope<'a> {
    pub pre: &'a State,
    pub constants: &'a ConstantState,
    pub config: &'a DclareConfig,
}

/// What a finished leaf produced.
#[derive(Debug)]
pub(crate) struct LeafOutcome {
    pub state: State,
    pub reads: BTreeSet<Slot>,
    pub written: BTreeSet<Slot>,
    pub activated: BTreeSet<ObjectId>,
    pub changes: usize,
    pub error: Option<RuleError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Mutating,
    ReadOnly,
    Deriving,
}

pub struct LeafTransaction<'a> {
    scope: Scope<'a>,
    mode: Mode,
    model: Arc<Model>,
    state: State,
    observer: Option<ObserverInstance>,
    reads: BTreeSet<Slot>,
    written: BTreeSet<Slot>,
    activated: BTreeSet<ObjectId>,
    changes: usize,
    derived: BTreeSet<ObjectId>,
    derive_failures: Vec<RuleError>,
}

impl<'a> LeafTransaction<'a> {
    pub(crate) fn new(scope: Scope<'a>, state: State, observer: Option<ObserverInstance>) -> Self {
        Self {
            scope,
            mode: Mode::Mutating,
            model: Arc::clone(state.model()),
            state,
            observer,
            reads: BTreeSet::new(),
            written: BTreeSet::new(),
            activated: BTreeSet::new(),
            changes: 0,
            derived: BTreeSet::new(),
            derive_failures: Vec::new(),
        }
    }

    /// A leaf on which every write fails with [`EngineError::ReadOnly`].
    pub(crate) fn read_only(scope: Scope<'a>, state: State) -> Self {
        Self {
            mode: Mode::ReadOnly,
            ..Self::new(scope, state, None)
        }
    }

    /// A leaf deriving the properties of detached objects on read. Writes to
    /// objects contained by the universe fail with [`EngineError::ReadOnly`].
    pub(crate) fn deriving(scope: Scope<'a>, state: State) -> Self {
        Self {
            mode: Mode::Deriving,
            ..Self::new(scope, state, None)
        }
    }

    /// Failures of observers run while deriving, in the order they happened.
    pub(crate) fn into_derive_failures(self) -> Vec<RuleError> {
        self.derive_failures
    }

    pub(crate) fn finish(self, result: Result<(), RuleError>) -> LeafOutcome {
        LeafOutcome {
            state: self.state,
            reads: self.reads,
            written: self.written,
            activated: self.activated,
            changes: self.changes,
            error: result.err(),
        }
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    pub fn root(&self) -> ObjectId {
        self.model.root()
    }

    /// The observer instance this leaf runs, `None` for actions.
    pub fn observer(&self) -> Option<&ObserverInstance> {
        self.observer.as_ref()
    }

    /// The working state, read without recording dependencies.
    pub fn current(&self) -> &State {
        &self.state
    }

    /// Number of changes made so far.
    pub fn changes(&self) -> usize {
        self.changes
    }

    /// Reads `object.setable`, recording the read when running an observer.
    pub fn get(&mut self, object: &ObjectId, setable: impl Into<SetableId>) -> Value {
        let setable = setable.into();
        self.observe(object, &setable);
        self.derive(object, &setable);
        self.state.get(object, &setable)
    }

    /// Integer convenience over [`LeafTransaction::get`]; null reads as zero.
    pub fn get_int(&mut self, object: &ObjectId, setable: impl Into<SetableId>) -> Result<i64, EngineError> {
        let setable = setable.into();
        match self.get(object, setable.clone()) {
            Value::Null => Ok(0),
            Value::Int(i) => Ok(i),
            found => Err(EngineError::TypeMismatch {
                object: object.clone(),
                setable,
                expected: "integer",
                found,
            }),
        }
    }

    /// Value at the start of the universe transaction. Not recorded.
    pub fn pre(&self, object: &ObjectId, setable: impl Into<SetableId>) -> Value {
        self.scope.pre.get(object, &setable.into())
    }

    pub fn parent(&mut self, object: &ObjectId) -> Option<ObjectId> {
        self.observe(object, &SetableId::new(PARENT));
        self.state.parent(object)
    }

    /// Objects directly contained by `object`; reads every containment setable.
    pub fn children(&mut self, object: &ObjectId) -> BTreeSet<ObjectId> {
        let containments: Vec<SetableId> = self
            .model
            .containment_setables_of(&object.class)
            .map(|s| s.id.clone())
            .collect();
        for setable in &containments {
            self.observe(object, setable);
        }
        self.state.children(object)
    }

    fn observe(&mut self, object: &ObjectId, setable: &SetableId) {
        if self.observer.is_none() {
            return;
        }
        if self.model.setable(setable).is_some_and(|s| s.observed) {
            self.reads.insert(Slot::new(object.clone(), setable.clone()));
        }
    }

    /// Whether `object` is outside the containment tree of the universe root.
    pub fn is_detached(&self, object: &ObjectId) -> bool {
        !self.state.is_ancestor_or_self(&self.model.root(), object)
    }

    fn derive(&mut self, object: &ObjectId, setable: &SetableId) {
        if self.mode != Mode::Deriving || self.derived.contains(object) || !self.is_detached(object) {
            return;
        }
        if !self.model.setable(setable).is_some_and(|s| s.observed) {
            return;
        }

        // Marked first: observers reading their own object see what is there.
        self.derived.insert(object.clone());
        let model = Arc::clone(&self.model);
        for observer in model.observers_of(&object.class) {
            if let Err(error) = (observer.rule)(self, object) {
                let instance = ObserverInstance::new(observer.id.clone(), object.clone());
                ObserverFailed {
                    instance: &instance,
                    error: &error,
                }
                .log();
                self.derive_failures.push(error);
            }
        }
    }

    pub fn constant(&self, constant: impl Into<ConstantId>, argument: impl Into<Value>) -> Result<Value, RuleError> {
        self.scope
            .constants
            .get(&self.model, &constant.into(), &argument.into())
    }

    pub fn set_constant(
        &self,
        constant: impl Into<ConstantId>,
        argument: impl Into<Value>,
        value: impl Into<Value>,
    ) -> Result<(), EngineError> {
        self.scope
            .constants
            .set(&constant.into(), &argument.into(), value.into())
    }

    /// Id of an object of `class`. The object comes to life once it is
    /// contained somewhere.
    pub fn construct(&self, class: impl Into<ClassId>, key: impl AsRef<str>) -> Result<ObjectId, EngineError> {
        let class = class.into();
        if self.model.class(&class).is_none() {
            return Err(EngineError::UnknownClass(class));
        }
        Ok(ObjectId::new(class, key))
    }

    pub fn set(&mut self, object: &ObjectId, setable: impl Into<SetableId>, value: impl Into<Value>) -> Result<(), EngineError> {
        let setable = self.setable(setable.into())?;
        self.write(object, &setable, value.into())
    }

    /// Adds `value` to the set held by `object.setable`.
    pub fn add(&mut self, object: &ObjectId, setable: impl Into<SetableId>, value: impl Into<Value>) -> Result<(), EngineError> {
        let setable = self.setable(setable.into())?;
        let mut set = self.set_value(object, &setable)?;
        set.insert(value.into());
        self.write(object, &setable, Value::Set(set))
    }

    /// Removes `value` from the set held by `object.setable`.
    pub fn remove(&mut self, object: &ObjectId, setable: impl Into<SetableId>, value: impl Into<Value>) -> Result<(), EngineError> {
        let setable = self.setable(setable.into())?;
        let mut set = self.set_value(object, &setable)?;
        set.remove(&value.into());
        self.write(object, &setable, Value::Set(set))
    }

    /// Removes `object` from its parent. Orphan clearing then resets its state.
    pub fn delete(&mut self, object: &ObjectId) -> Result<(), EngineError> {
        match (self.state.parent(object), self.state.containing(object)) {
            (Some(parent), Some(containing)) => {
                let setable = self.setable(containing)?;
                let remaining = without(self.state.get(&parent, &setable.id), object);
                self.write(&parent, &setable, remaining)
            }
            _ => self.clear(object),
        }
    }

    /// Resets every property of `object` to its default, unlinking children,
    /// opposites and its own parent.
    pub fn clear(&mut self, object: &ObjectId) -> Result<(), EngineError> {
        let setables: Vec<SetableId> = self
            .state
            .properties(object)
            .map(|(id, _)| id.clone())
            .filter(|id| id.as_str() != PARENT && id.as_str() != CONTAINING)
            .collect();
        for id in setables {
            let setable = self.setable(id)?;
            let default = setable.default.clone();
            self.write(object, &setable, default)?;
        }

        if let (Some(parent), Some(containing)) = (self.state.parent(object), self.state.containing(object)) {
            let setable = self.setable(containing)?;
            let remaining = without(self.state.get(&parent, &setable.id), object);
            self.write(&parent, &setable, remaining)?;
        }
        for plumbing in [PARENT, CONTAINING] {
            let setable = self.setable(SetableId::new(plumbing))?;
            self.write(object, &setable, Value::Null)?;
        }
        Ok(())
    }

    fn setable(&self, id: SetableId) -> Result<Setable, EngineError> {
        self.model
            .setable(&id)
            .cloned()
            .ok_or(EngineError::UnknownSetable(id))
    }

    fn set_value(&self, object: &ObjectId, setable: &Setable) -> Result<BTreeSet<Value>, EngineError> {
        match self.state.get(object, &setable.id) {
            Value::Set(set) => Ok(set),
            Value::Null => Ok(BTreeSet::new()),
            found => Err(EngineError::TypeMismatch {
                object: object.clone(),
                setable: setable.id.clone(),
                expected: "set",
                found,
            }),
        }
    }

    fn write(&mut self, object: &ObjectId, setable: &Setable, value: Value) -> Result<(), EngineError> {
        let old = self.state.get(object, &setable.id);
        if old == value {
            return Ok(());
        }
        let writable = match self.mode {
            Mode::Mutating => true,
            Mode::ReadOnly => false,
            Mode::Deriving => self.is_detached(object),
        };
        if !writable {
            return Err(EngineError::ReadOnly {
                object: object.clone(),
                setable: setable.id.clone(),
            });
        }

        let relational = setable.containment || setable.opposite.is_some();
        let (added, removed) = if relational {
            let old_refs = old.refs();
            let new_refs = value.refs();
            let added: BTreeSet<ObjectId> = new_refs.difference(&old_refs).cloned().collect();
            let removed: BTreeSet<ObjectId> = old_refs.difference(&new_refs).cloned().collect();
            (added, removed)
        } else {
            (BTreeSet::new(), BTreeSet::new())
        };

        if setable.containment {
            for child in &added {
                if self.state.is_ancestor_or_self(child, object) {
                    return Err(EngineError::CycleInParentChain {
                        child: child.clone(),
                        parent: object.clone(),
                    });
                }
            }
        }

        if self.scope.config.is_trace_mutable() {
            MutableChanged {
                object,
                setable: setable.id.as_str(),
                old: &old,
                new: &value,
            }
            .log();
        }

        self.state = self.state.set(object, &setable.id, value);
        self.changes += 1;
        self.written.insert(Slot::new(object.clone(), setable.id.clone()));

        if setable.containment {
            self.reparent(object, setable, &added, &removed)?;
        }
        if let Some(opposite) = &setable.opposite {
            self.mirror(object, opposite, &added, &removed)?;
        }
        Ok(())
    }

    fn reparent(
        &mut self,
        parent: &ObjectId,
        setable: &Setable,
        added: &BTreeSet<ObjectId>,
        removed: &BTreeSet<ObjectId>,
    ) -> Result<(), EngineError> {
        let parent_setable = self.setable(SetableId::new(PARENT))?;
        let containing_setable = self.setable(SetableId::new(CONTAINING))?;

        for child in removed {
            let still_here = self.state.parent(child).as_ref() == Some(parent)
                && self.state.containing(child).as_ref() == Some(&setable.id);
            if still_here {
                self.write(child, &parent_setable, Value::Null)?;
                self.write(child, &containing_setable, Value::Null)?;
            }
        }

        for child in added {
            match (self.state.parent(child), self.state.containing(child)) {
                (Some(previous), Some(containing)) => {
                    if &previous != parent || containing != setable.id {
                        let previous_setable = self.setable(containing)?;
                        let remaining = without(self.state.get(&previous, &previous_setable.id), child);
                        self.write(&previous, &previous_setable, remaining)?;
                    }
                }
                _ => {
                    self.activated.insert(child.clone());
                }
            }
            self.write(child, &parent_setable, Value::Ref(parent.clone()))?;
            self.write(child, &containing_setable, Value::Str(Arc::from(setable.id.as_str())))?;
        }
        Ok(())
    }

    fn mirror(
        &mut self,
        object: &ObjectId,
        opposite: &SetableId,
        added: &BTreeSet<ObjectId>,
        removed: &BTreeSet<ObjectId>,
    ) -> Result<(), EngineError> {
        let opposite = self.setable(opposite.clone())?;
        for other in removed {
            let remaining = without(self.state.get(other, &opposite.id), object);
            self.write(other, &opposite, remaining)?;
        }
        for other in added {
            let next = if opposite.is_many() {
                let mut set = self.set_value(other, &opposite)?;
                set.insert(Value::Ref(object.clone()));
                Value::Set(set)
            } else {
                Value::Ref(object.clone())
            };
            self.write(other, &opposite, next)?;
        }
        Ok(())
    }
}

/// `value` with every reference to `object` taken out.
fn without(value: Value, object: &ObjectId) -> Value {
    match value {
        Value::Ref(id) if &id == object => Value::Null,
        Value::Set(mut set) => {
            set.remove(&Value::Ref(object.clone()));
            Value::Set(set)
        }
        Value::List(list) => Value::List(
            list.into_iter()
                .filter(|v| v.as_ref_id() != Some(object))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MutableClass, ObserverId};

    fn model() -> Arc<Model> {
        Arc::new(
            Model::builder("Universe")
                .class(MutableClass::new("Universe").with_setable("folders"))
                .class(MutableClass::new("Folder").with_setable("files").with_setable("sub"))
                .class(MutableClass::new("File").with_setable("name").with_setable("owner"))
                .class(MutableClass::new("Person").with_setable("owns").with_setable("favorite"))
                .setable(Setable::new("folders").default(Value::empty_set()).containment())
                .setable(Setable::new("files").default(Value::empty_set()).containment())
                .setable(Setable::new("sub").containment())
                .setable(Setable::new("name"))
                .setable(Setable::new("owner").opposite("owns"))
                .setable(Setable::new("owns").default(Value::empty_set()).opposite("owner"))
                .setable(Setable::new("favorite").opposite("fan"))
                .setable(Setable::new("fan").opposite("favorite"))
                .build()
                .unwrap(),
        )
    }

    fn run<F>(state: &State, observer: Option<ObserverInstance>, body: F) -> LeafOutcome
    where
        F: FnOnce(&mut LeafTransaction<'_>) -> Result<(), RuleError>,
    {
        let constants = ConstantState::new(false);
        let config = DclareConfig::default();
        let scope = Scope {
            pre: state,
            constants: &constants,
            config: &config,
        };
        let mut leaf = LeafTransaction::new(scope, state.clone(), observer);
        let result = body(&mut leaf);
        leaf.finish(result)
    }

    fn folder(key: &str) -> ObjectId {
        ObjectId::new("Folder", key)
    }

    fn file(key: &str) -> ObjectId {
        ObjectId::new("File", key)
    }

    #[test]
    fn test_containment_sets_parent_and_activates() {
        let state = State::new(model());
        let root = state.model().root();

        let outcome = run(&state, None, |tx| {
            tx.add(&root, "folders", folder("a"))?;
            tx.add(&folder("a"), "files", file("1"))?;
            Ok(())
        });

        assert!(outcome.error.is_none());
        assert_eq!(outcome.state.parent(&folder("a")), Some(root.clone()));
        assert_eq!(outcome.state.parent(&file("1")), Some(folder("a")));
        assert_eq!(outcome.state.containing(&file("1")), Some("files".into()));
        assert_eq!(outcome.activated, [folder("a"), file("1")].into_iter().collect());
    }

    #[test]
    fn test_move_removes_from_previous_parent() {
        let state = State::new(model());
        let root = state.model().root();
        let setup = run(&state, None, |tx| {
            tx.add(&root, "folders", folder("a"))?;
            tx.add(&root, "folders", folder("b"))?;
            tx.add(&folder("a"), "files", file("1"))?;
            Ok(())
        });

        let moved = run(&setup.state, None, |tx| Ok(tx.add(&folder("b"), "files", file("1"))?));

        assert!(moved.error.is_none());
        assert_eq!(moved.state.get(&folder("a"), &"files".into()), Value::empty_set());
        assert_eq!(moved.state.parent(&file("1")), Some(folder("b")));
        assert!(moved.activated.is_empty());
    }

    #[test]
    fn test_removed_child_loses_parent() {
        let state = State::new(model());
        let root = state.model().root();
        let setup = run(&state, None, |tx| Ok(tx.add(&root, "folders", folder("a"))?));

        let removed = run(&setup.state, None, |tx| Ok(tx.remove(&root, "folders", folder("a"))?));
        assert_eq!(removed.state.parent(&folder("a")), None);
        assert!(!removed.state.contains(&folder("a")));
    }

    #[test]
    fn test_cycle_in_parent_chain_is_rejected() {
        let state = State::new(model());
        let root = state.model().root();
        let setup = run(&state, None, |tx| {
            tx.add(&root, "folders", folder("a"))?;
            tx.set(&folder("a"), "sub", folder("b"))?;
            Ok(())
        });

        let cyclic = run(&setup.state, None, |tx| Ok(tx.set(&folder("b"), "sub", folder("a"))?));
        assert!(matches!(
            cyclic.error,
            Some(RuleError::Engine(EngineError::CycleInParentChain { .. }))
        ));
        let self_contained = run(&setup.state, None, |tx| Ok(tx.set(&folder("a"), "sub", folder("a"))?));
        assert!(self_contained.error.is_some());
    }

    #[test]
    fn test_many_to_one_opposite() {
        let state = State::new(model());
        let alice = ObjectId::new("Person", "alice");
        let bob = ObjectId::new("Person", "bob");

        let owned = run(&state, None, |tx| Ok(tx.set(&file("1"), "owner", alice.clone())?));
        assert_eq!(
            owned.state.get(&alice, &"owns".into()),
            Value::set_of([Value::Ref(file("1"))])
        );

        let transferred = run(&owned.state, None, |tx| Ok(tx.set(&file("1"), "owner", bob.clone())?));
        assert_eq!(transferred.state.get(&alice, &"owns".into()), Value::empty_set());
        assert_eq!(
            transferred.state.get(&bob, &"owns".into()),
            Value::set_of([Value::Ref(file("1"))])
        );

        let released = run(&transferred.state, None, |tx| Ok(tx.remove(&bob, "owns", file("1"))?));
        assert_eq!(released.state.get(&file("1"), &"owner".into()), Value::Null);
    }

    #[test]
    fn test_one_to_one_opposite_steals() {
        let state = State::new(model());
        let alice = ObjectId::new("Person", "alice");
        let bob = ObjectId::new("Person", "bob");
        let star = ObjectId::new("Person", "star");

        let first = run(&state, None, |tx| Ok(tx.set(&alice, "favorite", star.clone())?));
        assert_eq!(first.state.get(&star, &"fan".into()), Value::Ref(alice.clone()));

        let second = run(&first.state, None, |tx| Ok(tx.set(&bob, "favorite", star.clone())?));
        assert_eq!(second.state.get(&star, &"fan".into()), Value::Ref(bob.clone()));
        assert_eq!(second.state.get(&alice, &"favorite".into()), Value::Null);
    }

    #[test]
    fn test_observer_reads_are_recorded() {
        let state = State::new(model());
        let instance = ObserverInstance::new(ObserverId::new("namer"), file("1"));

        let outcome = run(&state, Some(instance), |tx| {
            let _ = tx.get(&file("1"), "owner");
            let _ = tx.parent(&file("1"));
            tx.set(&file("1"), "name", "x")?;
            Ok(())
        });

        let expected: BTreeSet<Slot> = [
            Slot::new(file("1"), "owner".into()),
            Slot::new(file("1"), PARENT.into()),
        ]
        .into_iter()
        .collect();
        assert_eq!(outcome.reads, expected);
        assert_eq!(outcome.changes, 1);
        assert_eq!(outcome.written, [Slot::new(file("1"), "name".into())].into_iter().collect());
    }

    #[test]
    fn test_actions_record_no_reads() {
        let state = State::new(model());
        let outcome = run(&state, None, |tx| {
            let _ = tx.get(&file("1"), "name");
            Ok(())
        });
        assert!(outcome.reads.is_empty());
    }

    #[test]
    fn test_type_mismatch_and_unknowns() {
        let state = State::new(model());
        let outcome = run(&state, None, |tx| {
            tx.set(&file("1"), "name", "x")?;
            tx.add(&file("1"), "name", "y")?;
            Ok(())
        });
        assert!(matches!(
            outcome.error,
            Some(RuleError::Engine(EngineError::TypeMismatch { expected: "set", .. }))
        ));

        let outcome = run(&state, None, |tx| Ok(tx.set(&file("1"), "nope", 1i64)?));
        assert!(matches!(outcome.error, Some(RuleError::Engine(EngineError::UnknownSetable(_)))));

        let outcome = run(&state, None, |tx| tx.construct("Ghost", "1").map(|_| ()).map_err(RuleError::from));
        assert!(matches!(outcome.error, Some(RuleError::Engine(EngineError::UnknownClass(_)))));
    }

    #[test]
    fn test_clear_unlinks_everything() {
        let state = State::new(model());
        let root = state.model().root();
        let alice = ObjectId::new("Person", "alice");
        let setup = run(&state, None, |tx| {
            tx.add(&root, "folders", folder("a"))?;
            tx.add(&folder("a"), "files", file("1"))?;
            tx.set(&file("1"), "owner", alice.clone())?;
            Ok(())
        });

        let cleared = run(&setup.state, None, |tx| Ok(tx.clear(&folder("a"))?));
        assert!(cleared.error.is_none());
        assert!(!cleared.state.contains(&folder("a")));
        assert_eq!(cleared.state.get(&root, &"folders".into()), Value::empty_set());
        // the child is unparented but keeps its own state until orphan clearing
        assert_eq!(cleared.state.parent(&file("1")), None);
        assert_eq!(cleared.state.get(&file("1"), &"owner".into()), Value::Ref(alice));
    }

    #[test]
    fn test_deriving_leaf_only_writes_detached_objects() {
        let state = State::new(model());
        let root = state.model().root();
        let setup = run(&state, None, |tx| Ok(tx.add(&root, "folders", folder("a"))?));

        let constants = ConstantState::new(false);
        let config = DclareConfig::default();
        let scope = Scope {
            pre: &setup.state,
            constants: &constants,
            config: &config,
        };
        let mut leaf = LeafTransaction::deriving(scope, setup.state.clone());

        assert!(!leaf.is_detached(&folder("a")));
        assert!(leaf.is_detached(&folder("loose")));
        leaf.add(&folder("loose"), "files", file("1")).unwrap();
        assert!(leaf.is_detached(&file("1")));
        assert_eq!(
            leaf.set(&folder("a"), "sub", folder("loose")),
            Err(EngineError::ReadOnly {
                object: folder("a"),
                setable: "sub".into(),
            })
        );
    }

    #[test]
    fn test_read_only_leaf_rejects_changes() {
        let state = State::new(model());
        let constants = ConstantState::new(false);
        let config = DclareConfig::default();
        let scope = Scope {
            pre: &state,
            constants: &constants,
            config: &config,
        };
        let mut leaf = LeafTransaction::read_only(scope, state.clone());

        // Writing what is already there is not a change.
        assert_eq!(leaf.set(&file("1"), "name", Value::Null), Ok(()));
        assert!(matches!(
            leaf.set(&file("1"), "name", "x"),
            Err(EngineError::ReadOnly { .. })
        ));
        assert_eq!(leaf.changes(), 0);
    }
}
