// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Keeping two universes of the same model in step.
//!
//! A [`DeltaAdaptor`] turns every committed transaction into a JSON delta and
//! applies deltas from the peer as actions. A [`UniverseSynchronizer`] moves
//! deltas over a [`DeltaTransport`](crate::traits::DeltaTransport), either TCP
//! or an in-memory channel. A [`OneShot`] builds a model from JSON and
//! renders the result back.

pub mod connection;
pub mod delta_adaptor;
pub mod helper;
pub mod json;
pub mod one_shot;
#[cfg(test)]
pub mod integration_tests;

pub use connection::{ChannelTransport, SyncSummary, TcpTransport, UniverseSynchronizer};
pub use delta_adaptor::DeltaAdaptor;
pub use helper::DefaultSerializationHelper;
pub use json::{json_to_state, json_to_value, state_to_json, value_to_json};
pub use one_shot::OneShot;
