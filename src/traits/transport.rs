// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::SyncError;
use async_trait::async_trait;

/// A bidirectional stream of JSON delta lines.
///
/// `receive` must be cancel safe: the synchronizer races it against
/// outgoing deltas.
#[async_trait]
pub trait DeltaTransport: Send {
    async fn send(&mut self, line: &str) -> Result<(), SyncError>;

    /// Next line from the peer, `None` once the peer closed.
    async fn receive(&mut self) -> Result<Option<String>, SyncError>;

    fn peer(&self) -> String;
}
