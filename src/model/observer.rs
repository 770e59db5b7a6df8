// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::{LeafTransaction, Priority};
use crate::errors::RuleError;
use crate::model::{ObjectId, ObserverId};
use std::fmt;
use std::sync::Arc;

/// Body of an observer, run for one object inside a [`LeafTransaction`].
pub type Rule = Arc<dyn Fn(&mut LeafTransaction<'_>, &ObjectId) -> Result<(), RuleError> + Send + Sync>;

/// A rule that is re-run for an object whenever a property it read changes.
#[derive(Clone)]
pub struct Observer {
    pub id: ObserverId,
    /// Backward observers only run once no forward work is left.
    pub backward: bool,
    /// Failures of a checking observer make the transaction inconsistent;
    /// failures of a non-checking observer are only logged.
    pub checks_consistency: bool,
    pub rule: Rule,
}

impl Observer {
    pub fn new<F>(id: impl Into<ObserverId>, rule: F) -> Self
    where
        F: Fn(&mut LeafTransaction<'_>, &ObjectId) -> Result<(), RuleError> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            backward: false,
            checks_consistency: true,
            rule: Arc::new(rule),
        }
    }

    pub fn backward(mut self) -> Self {
        self.backward = true;
        self
    }

    /// Priority at which a change to something this observer read schedules it.
    pub fn trigger_priority(&self) -> Priority {
        if self.backward {
            Priority::Backward
        } else {
            Priority::Forward
        }
    }

    pub fn non_checking(mut self) -> Self {
        self.checks_consistency = false;
        self
    }
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("id", &self.id)
            .field("backward", &self.backward)
            .field("checks_consistency", &self.checks_consistency)
            .finish()
    }
}

/// An observer bound to one object. This is the unit of scheduling.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObserverInstance {
    pub observer: ObserverId,
    pub object: ObjectId,
}

impl ObserverInstance {
    pub fn new(observer: ObserverId, object: ObjectId) -> Self {
        Self { observer, object }
    }
}

impl fmt::Display for ObserverInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.observer, self.object)
    }
}
