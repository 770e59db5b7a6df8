// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod diff_handler;
pub mod serialization;
pub mod transport;

pub use diff_handler::DiffHandler;
pub use serialization::SerializationHelper;
pub use transport::DeltaTransport;
