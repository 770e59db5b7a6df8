// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod consistency;
pub mod constants;
pub mod history;
pub mod leaf;
pub mod priority;
pub mod propagator;
pub mod statistics;
pub mod universe;

pub use consistency::check_consistency;
pub use constants::{ConstantContext, ConstantState};
pub use history::History;
pub use leaf::LeafTransaction;
pub use priority::{Agenda, Priority};
pub use propagator::TransactionOutcome;
pub use statistics::{StatisticsSnapshot, UniverseStatistics};
pub use universe::{Mood, Status, UniverseTransaction};
