// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::model::{ClassId, ObserverId, SetableId};

/// A class of mutable objects: the setables its objects carry and the
/// observers that run for every object of the class once it is activated.
#[derive(Debug, Clone, PartialEq)]
pub struct MutableClass {
    pub id: ClassId,
    pub setables: Vec<SetableId>,
    pub observers: Vec<ObserverId>,
}

impl MutableClass {
    pub fn new(id: impl Into<ClassId>) -> Self {
        Self {
            id: id.into(),
            setables: Vec::new(),
            observers: Vec::new(),
        }
    }

    pub fn with_setable(mut self, setable: impl Into<SetableId>) -> Self {
        self.setables.push(setable.into());
        self
    }

    pub fn with_observer(mut self, observer: impl Into<ObserverId>) -> Self {
        self.observers.push(observer.into());
        self
    }

    pub fn has_setable(&self, setable: &SetableId) -> bool {
        self.setables.contains(setable)
    }
}
