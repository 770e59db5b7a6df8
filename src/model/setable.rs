// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::model::{SetableId, Value};

/// Plumbing setable holding the containing parent of an object.
pub const PARENT: &str = "$parent";
/// Plumbing setable holding the id of the setable that contains an object.
pub const CONTAINING: &str = "$containing";

/// Declaration of a property that objects can hold.
///
/// A setable that stores its `default` is the same as a setable that stores
/// nothing; states never keep default values.
///
/// # Example
/// ```
/// use dclare::model::{Setable, Value};
///
/// let lines = Setable::new("lines").default(Value::empty_set()).containment();
/// assert!(lines.is_many());
/// assert!(lines.containment);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Setable {
    pub id: SetableId,
    pub default: Value,
    /// Changes of an observed setable trigger the observers that read it.
    pub observed: bool,
    /// Referenced objects are children of the holder.
    pub containment: bool,
    /// Setable on the referenced objects that mirrors this one.
    pub opposite: Option<SetableId>,
    /// Holding the default after a transaction is a consistency error.
    pub mandatory: bool,
    /// Setable on the same object whose set bounds the allowed values.
    pub scope: Option<SetableId>,
    /// Internal bookkeeping, never synchronized.
    pub plumbing: bool,
}

impl Setable {
    pub fn new(id: impl Into<SetableId>) -> Self {
        Self {
            id: id.into(),
            default: Value::Null,
            observed: true,
            containment: false,
            opposite: None,
            mandatory: false,
            scope: None,
            plumbing: false,
        }
    }

    pub fn default(mut self, default: Value) -> Self {
        self.default = default;
        self
    }

    pub fn containment(mut self) -> Self {
        self.containment = true;
        self
    }

    pub fn opposite(mut self, opposite: impl Into<SetableId>) -> Self {
        self.opposite = Some(opposite.into());
        self
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub fn scope(mut self, scope: impl Into<SetableId>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn unobserved(mut self) -> Self {
        self.observed = false;
        self
    }

    pub fn plumbing(mut self) -> Self {
        self.plumbing = true;
        self
    }

    /// Whether values of this setable are sets (one-to-many).
    pub fn is_many(&self) -> bool {
        matches!(self.default, Value::Set(_))
    }

    pub(crate) fn builtin() -> Vec<Setable> {
        vec![Setable::new(PARENT).plumbing(), Setable::new(CONTAINING).plumbing()]
    }
}
