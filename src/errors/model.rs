// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::model::{ClassId, ConstantId, ObserverId, SetableId};
use std::fmt;

/// Errors that can occur while validating model declarations
#[derive(Debug, Clone, PartialEq)]
pub enum ModelValidationError {
    DuplicateClass { class: ClassId },
    DuplicateSetable { setable: SetableId },
    DuplicateObserver { observer: ObserverId },
    DuplicateConstant { constant: ConstantId },
    /// The universe class named by the builder is not declared
    MissingUniverseClass { class: ClassId },
    /// A class lists a setable that is not declared
    UnknownSetable { class: ClassId, setable: SetableId },
    /// A class lists an observer that is not declared
    UnknownObserver { class: ClassId, observer: ObserverId },
    UnresolvedOpposite { setable: SetableId, opposite: SetableId },
    UnresolvedScope { setable: SetableId, scope: SetableId },
    /// The opposite does not name this setable as its own opposite
    AsymmetricOpposite { setable: SetableId, opposite: SetableId },
    ContainmentWithOpposite { setable: SetableId },
}

impl fmt::Display for ModelValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelValidationError::DuplicateClass { class } => {
                write!(f, "Duplicate class id: '{}'", class)
            }
            ModelValidationError::DuplicateSetable { setable } => {
                write!(f, "Duplicate setable id: '{}'", setable)
            }
            ModelValidationError::DuplicateObserver { observer } => {
                write!(f, "Duplicate observer id: '{}'", observer)
            }
            ModelValidationError::DuplicateConstant { constant } => {
                write!(f, "Duplicate constant id: '{}'", constant)
            }
            ModelValidationError::MissingUniverseClass { class } => {
                write!(f, "Universe class '{}' is not declared", class)
            }
            ModelValidationError::UnknownSetable { class, setable } => {
                write!(f, "Class '{}' lists setable '{}' which does not exist", class, setable)
            }
            ModelValidationError::UnknownObserver { class, observer } => {
                write!(f, "Class '{}' lists observer '{}' which does not exist", class, observer)
            }
            ModelValidationError::UnresolvedOpposite { setable, opposite } => {
                write!(f, "Setable '{}' has opposite '{}' which does not exist", setable, opposite)
            }
            ModelValidationError::UnresolvedScope { setable, scope } => {
                write!(f, "Setable '{}' has scope '{}' which does not exist", setable, scope)
            }
            ModelValidationError::AsymmetricOpposite { setable, opposite } => {
                write!(
                    f,
                    "Setable '{}' has opposite '{}' but '{}' does not point back",
                    setable, opposite, opposite
                )
            }
            ModelValidationError::ContainmentWithOpposite { setable } => {
                write!(f, "Containment setable '{}' cannot have an opposite", setable)
            }
        }
    }
}

impl std::error::Error for ModelValidationError {}
