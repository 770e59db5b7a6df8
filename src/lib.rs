// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod config;     // runtime config + limits
pub mod engine;     // universe, transactions, propagation
pub mod errors;     // error handling
pub mod model;      // classes, setables, observers, constants
pub mod observability;
pub mod state;      // immutable state snapshots
pub mod sync;       // delta exchange between universes
pub mod traits;     // unified abstractions
