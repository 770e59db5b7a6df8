// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::model::{ObjectId, ObserverInstance, SetableId, Value};
use thiserror::Error;

/// A violation found when a transaction completes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConsistencyError {
    #[error("Mandatory {object}.{setable} is empty")]
    EmptyMandatory { object: ObjectId, setable: SetableId },

    #[error("{object}.{setable} = {value} is out of scope")]
    OutOfScope {
        object: ObjectId,
        setable: SetableId,
        value: Value,
    },

    #[error("{object}.{setable} references orphan {orphan}")]
    ReferencedOrphan {
        object: ObjectId,
        setable: SetableId,
        orphan: ObjectId,
    },

    #[error("Orphan {object} still holds state")]
    OrphanState { object: ObjectId },

    #[error("Observer {instance} stopped after {changes} changes, limit is {limit}")]
    ObserverStopped {
        instance: ObserverInstance,
        changes: usize,
        limit: usize,
    },

    #[error("Observer {instance} failed: {message}")]
    ObserverFailed {
        instance: ObserverInstance,
        message: String,
    },
}
