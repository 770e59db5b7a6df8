// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::ModelValidationError;
use crate::model::validation::validate_model;
use crate::model::{
    ClassId, Constant, ConstantId, MutableClass, ObjectId, Observer, ObserverId, Setable, SetableId,
};
use crate::observability::messages::validation::{ModelValidationFailed, ModelValidationIssue};
use crate::observability::messages::StructuredLog;
use std::collections::{BTreeMap, HashMap};

/// Key of the single root object of every universe.
pub const ROOT_KEY: &str = "root";

/// An immutable, validated set of class, setable, observer and constant
/// declarations. Shared by every state of a universe.
#[derive(Debug)]
pub struct Model {
    universe: ClassId,
    classes: BTreeMap<ClassId, MutableClass>,
    setables: HashMap<SetableId, Setable>,
    observers: HashMap<ObserverId, Observer>,
    constants: HashMap<ConstantId, Constant>,
}

impl Model {
    pub fn builder(universe: impl Into<ClassId>) -> ModelBuilder {
        ModelBuilder::new(universe)
    }

    pub fn universe_class(&self) -> &ClassId {
        &self.universe
    }

    /// The root object. It is never an orphan.
    pub fn root(&self) -> ObjectId {
        ObjectId::new(self.universe.clone(), ROOT_KEY)
    }

    pub fn class(&self, id: &ClassId) -> Option<&MutableClass> {
        self.classes.get(id)
    }

    pub fn classes(&self) -> impl Iterator<Item = &MutableClass> {
        self.classes.values()
    }

    pub fn setable(&self, id: &SetableId) -> Option<&Setable> {
        self.setables.get(id)
    }

    pub fn observer(&self, id: &ObserverId) -> Option<&Observer> {
        self.observers.get(id)
    }

    pub fn constant(&self, id: &ConstantId) -> Option<&Constant> {
        self.constants.get(id)
    }

    pub fn setables_of<'a>(&'a self, class: &ClassId) -> impl Iterator<Item = &'a Setable> + 'a {
        self.classes
            .get(class)
            .into_iter()
            .flat_map(|c| c.setables.iter())
            .filter_map(|id| self.setables.get(id))
    }

    pub fn observers_of<'a>(&'a self, class: &ClassId) -> impl Iterator<Item = &'a Observer> + 'a {
        self.classes
            .get(class)
            .into_iter()
            .flat_map(|c| c.observers.iter())
            .filter_map(|id| self.observers.get(id))
    }

    pub fn containment_setables_of<'a>(&'a self, class: &ClassId) -> impl Iterator<Item = &'a Setable> + 'a {
        self.setables_of(class).filter(|s| s.containment)
    }
}

/// Collects declarations and validates them into a [`Model`].
///
/// # Example
/// ```
/// use dclare::model::{Model, MutableClass, Setable, Value};
///
/// let model = Model::builder("Universe")
///     .class(MutableClass::new("Universe").with_setable("orders"))
///     .class(MutableClass::new("Order"))
///     .setable(Setable::new("orders").default(Value::empty_set()).containment())
///     .build()
///     .expect("valid model");
///
/// assert_eq!(model.root().to_string(), "Universe:root");
/// ```
#[derive(Debug)]
pub struct ModelBuilder {
    pub(crate) universe: ClassId,
    pub(crate) classes: Vec<MutableClass>,
    pub(crate) setables: Vec<Setable>,
    pub(crate) observers: Vec<Observer>,
    pub(crate) constants: Vec<Constant>,
}

impl ModelBuilder {
    pub fn new(universe: impl Into<ClassId>) -> Self {
        Self {
            universe: universe.into(),
            classes: Vec::new(),
            setables: Setable::builtin(),
            observers: Vec::new(),
            constants: Vec::new(),
        }
    }

    pub fn class(mut self, class: MutableClass) -> Self {
        self.classes.push(class);
        self
    }

    pub fn setable(mut self, setable: Setable) -> Self {
        self.setables.push(setable);
        self
    }

    pub fn observer(mut self, observer: Observer) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn constant(mut self, constant: Constant) -> Self {
        self.constants.push(constant);
        self
    }

    pub fn build(self) -> Result<Model, Vec<ModelValidationError>> {
        if let Err(errors) = validate_model(&self) {
            for issue in &errors {
                ModelValidationIssue { issue }.log();
            }
            ModelValidationFailed {
                universe: self.universe.as_str(),
                error_count: errors.len(),
            }
            .log();
            return Err(errors);
        }

        Ok(Model {
            universe: self.universe,
            classes: self.classes.into_iter().map(|c| (c.id.clone(), c)).collect(),
            setables: self.setables.into_iter().map(|s| (s.id.clone(), s)).collect(),
            observers: self.observers.into_iter().map(|o| (o.id.clone(), o)).collect(),
            constants: self.constants.into_iter().map(|c| (c.id.clone(), c)).collect(),
        })
    }
}
