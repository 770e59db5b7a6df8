// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::EngineError;
use thiserror::Error;

/// Errors raised while exchanging deltas with a remote universe.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid object id '{0}'")]
    InvalidObjectId(String),

    #[error("Unknown setable '{0}'")]
    UnknownSetable(String),

    #[error("Invalid delta: {0}")]
    InvalidDelta(String),

    #[error("Connection closed")]
    Closed,

    #[error(transparent)]
    Engine(#[from] EngineError),
}
