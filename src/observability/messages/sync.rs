// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for delta exchange between universes.
//!
//! This module contains message types for logging events related to:
//! * Deltas produced from local transactions
//! * Deltas applied or rejected from a peer
//! * Connection lifecycle

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A local transaction produced a delta for the peer.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct DeltaProduced<'a> {
    pub universe: &'a str,
    pub objects: usize,
}

impl Display for DeltaProduced<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Universe '{}' produced a delta over {} objects", self.universe, self.objects)
    }
}

impl StructuredLog for DeltaProduced<'_> {
    fn log(&self) {
        tracing::debug!(universe = self.universe, objects = self.objects, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("delta_produced", span_name = name, universe = self.universe)
    }
}

/// A delta from the peer was submitted as an action.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct DeltaApplied<'a> {
    pub universe: &'a str,
    pub objects: usize,
}

impl Display for DeltaApplied<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Universe '{}' applied a delta over {} objects", self.universe, self.objects)
    }
}

impl StructuredLog for DeltaApplied<'_> {
    fn log(&self) {
        tracing::debug!(universe = self.universe, objects = self.objects, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("delta_applied", span_name = name, universe = self.universe)
    }
}

/// A delta from the peer could not be decoded or applied.
///
/// # Log Level
/// `warn!` - The delta is dropped and the connection stays open
///
/// # Example
/// ```
/// use dclare::observability::messages::sync::DeltaRejected;
///
/// let msg = DeltaRejected {
///     universe: "Shop",
///     reason: "expected an object",
/// };
///
/// assert_eq!(msg.to_string(), "Universe 'Shop' rejected a delta: expected an object");
/// ```
pub struct DeltaRejected<'a> {
    pub universe: &'a str,
    pub reason: &'a str,
}

impl Display for DeltaRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Universe '{}' rejected a delta: {}", self.universe, self.reason)
    }
}

impl StructuredLog for DeltaRejected<'_> {
    fn log(&self) {
        tracing::warn!(universe = self.universe, reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("delta_rejected", span_name = name, universe = self.universe)
    }
}

/// A synchronizer started exchanging deltas.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ConnectionOpened<'a> {
    pub universe: &'a str,
    pub peer: &'a str,
}

impl Display for ConnectionOpened<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Universe '{}' connected to {}", self.universe, self.peer)
    }
}

impl StructuredLog for ConnectionOpened<'_> {
    fn log(&self) {
        tracing::info!(universe = self.universe, peer = self.peer, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("connection", span_name = name, universe = self.universe, peer = self.peer)
    }
}

/// A synchronizer stopped.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ConnectionClosed<'a> {
    pub universe: &'a str,
    pub peer: &'a str,
    pub sent: u64,
    pub received: u64,
}

impl Display for ConnectionClosed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Universe '{}' disconnected from {} ({} deltas sent, {} received)",
            self.universe, self.peer, self.sent, self.received
        )
    }
}

impl StructuredLog for ConnectionClosed<'_> {
    fn log(&self) {
        tracing::info!(
            universe = self.universe,
            peer = self.peer,
            sent = self.sent,
            received = self.received,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("connection_closed", span_name = name, universe = self.universe)
    }
}
