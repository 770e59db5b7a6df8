// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::{ConsistencyError, ModelValidationError};
use crate::model::{ClassId, ConstantId, ObjectId, ObserverId, SetableId, Value};
use thiserror::Error;

/// Errors raised while running transactions in a universe.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Too many changes by {culprit}: {changes} exceeds limit {limit}")]
    TooManyChanges {
        culprit: String,
        changes: usize,
        limit: usize,
    },

    #[error("Observer {instance} read {observed} properties, limit is {limit}")]
    TooManyObserved {
        instance: String,
        observed: usize,
        limit: usize,
    },

    #[error("Property {object}.{setable} has {observers} observers, limit is {limit}")]
    TooManyObservers {
        object: ObjectId,
        setable: SetableId,
        observers: usize,
        limit: usize,
    },

    #[error("Containing {child} in {parent} would create a cycle in the parent chain")]
    CycleInParentChain { child: ObjectId, parent: ObjectId },

    #[error("Concurrent changes to {object}.{setable} cannot be merged")]
    NotMergeable { object: ObjectId, setable: SetableId },

    #[error("Constant {constant}({argument}) depends on itself")]
    ConstantCycle { constant: ConstantId, argument: Value },

    #[error("Constant {constant}({argument}) is already {existing}, cannot set {new}")]
    ConstantAlreadySet {
        constant: ConstantId,
        argument: Value,
        existing: Value,
        new: Value,
    },

    #[error("{}", describe_consistency(.0))]
    Consistency(Vec<ConsistencyError>),

    #[error("Rule {culprit} failed: {message}")]
    Rule { culprit: String, message: String },

    #[error("Cannot change {object}.{setable} outside a mutating transaction")]
    ReadOnly { object: ObjectId, setable: SetableId },

    #[error("Universe is stopped")]
    UniverseStopped,

    #[error("Universe action queue is closed")]
    QueueClosed,

    #[error("Invalid model: {}", describe_validation(.0))]
    Validation(Vec<ModelValidationError>),

    #[error("Unknown setable '{0}'")]
    UnknownSetable(SetableId),

    #[error("Unknown class '{0}'")]
    UnknownClass(ClassId),

    #[error("Unknown observer '{0}'")]
    UnknownObserver(ObserverId),

    #[error("Unknown constant '{0}'")]
    UnknownConstant(ConstantId),

    #[error("{object}.{setable} holds {found}, expected {expected}")]
    TypeMismatch {
        object: ObjectId,
        setable: SetableId,
        expected: &'static str,
        found: Value,
    },
}

fn describe_consistency(errors: &[ConsistencyError]) -> String {
    let details: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    format!("{} consistency error(s): {}", errors.len(), details.join("; "))
}

fn describe_validation(errors: &[ModelValidationError]) -> String {
    let details: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    details.join("; ")
}

/// Failure of an observer, action or constant deriver.
///
/// Engine errors raised by transaction operations convert with `?`;
/// rule-specific failures carry a message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("{0}")]
    Failed(String),
}

impl RuleError {
    pub fn failed(message: impl Into<String>) -> Self {
        RuleError::Failed(message.into())
    }
}
