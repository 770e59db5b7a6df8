// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! This module provides centralized message types for all diagnostic and operational
//! logging in dclare. Message types follow a struct-based pattern with a `Display`
//! implementation, so log lines are never assembled from loose strings at the call
//! site and every event carries the same structured fields wherever it is emitted.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::engine` - universe lifecycle, transactions and observer events
//! * `messages::sync` - delta exchange and connection events
//! * `messages::validation` - model validation and configuration loading
//!
//! Most engine messages are only emitted when the matching `trace` switch is on
//! in a dev-mode [`DclareConfig`](crate::config::DclareConfig).
//!
//! # Usage
//!
//! ```rust
//! use dclare::observability::messages::engine::OrphansCleared;
//!
//! let msg = OrphansCleared { count: 2 };
//!
//! tracing::debug!("{}", msg);
//! ```

pub mod messages;
