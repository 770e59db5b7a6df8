// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! [`StructuredLog`] to emit it with structured fields at its own level.
//!
//! # Organization
//!
//! * `engine` - universe lifecycle, transactions, observers and constants
//! * `sync` - delta exchange and connections
//! * `validation` - model and configuration problems
//!
//! # Usage Pattern
//!
//! ```rust
//! use dclare::observability::messages::engine::UniverseStarted;
//! use dclare::observability::messages::StructuredLog;
//!
//! let msg = UniverseStarted {
//!     universe: "Shop",
//!     dev_mode: true,
//!     max_in_in_queue: 100,
//! };
//!
//! msg.log();
//! assert_eq!(msg.to_string(), "Universe 'Shop' started (dev_mode=true, max_in_in_queue=100)");
//! ```

use std::fmt::Display;
use tracing::Span;

pub mod engine;
pub mod sync;
pub mod validation;

/// A message that knows its log level and structured fields.
pub trait StructuredLog: Display {
    /// Emits the message as a tracing event.
    fn log(&self);

    /// Opens a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
