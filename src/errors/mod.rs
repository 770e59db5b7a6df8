// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod consistency;
mod engine;
mod model;
mod sync;

pub use config::ConfigError;
pub use consistency::ConsistencyError;
pub use engine::{EngineError, RuleError};
pub use model::ModelValidationError;
pub use sync::SyncError;
