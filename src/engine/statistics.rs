// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Counters of a running universe, updated from the transaction thread and
/// read from anywhere.
#[derive(Debug, Default)]
pub struct UniverseStatistics {
    run_count: AtomicU64,
    forward_count: AtomicU64,
    total_changes: AtomicU64,
    total_changes_ever: AtomicU64,
    debugging: AtomicBool,
}

/// Point-in-time copy of [`UniverseStatistics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatisticsSnapshot {
    pub run_count: u64,
    pub forward_count: u64,
    pub total_changes: u64,
    pub total_changes_ever: u64,
    pub debugging: bool,
}

impl UniverseStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ends a transaction: counts it and resets the per-transaction change total.
    pub fn complete_run(&self) {
        self.run_count.fetch_add(1, Ordering::SeqCst);
        self.total_changes.store(0, Ordering::SeqCst);
    }

    /// Resets the per-transaction change total without counting a run.
    pub fn abort_run(&self) {
        self.total_changes.store(0, Ordering::SeqCst);
    }

    pub fn bump_and_get_total_changes(&self, changes: u64) -> u64 {
        self.total_changes_ever.fetch_add(changes, Ordering::SeqCst);
        self.total_changes.fetch_add(changes, Ordering::SeqCst) + changes
    }

    pub fn bump_forward_count(&self, runs: u64) {
        self.forward_count.fetch_add(runs, Ordering::SeqCst);
    }

    pub fn set_debugging(&self, debugging: bool) {
        self.debugging.store(debugging, Ordering::SeqCst);
    }

    pub fn debugging(&self) -> bool {
        self.debugging.load(Ordering::SeqCst)
    }

    pub fn run_count(&self) -> u64 {
        self.run_count.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            run_count: self.run_count.load(Ordering::SeqCst),
            forward_count: self.forward_count.load(Ordering::SeqCst),
            total_changes: self.total_changes.load(Ordering::SeqCst),
            total_changes_ever: self.total_changes_ever.load(Ordering::SeqCst),
            debugging: self.debugging.load(Ordering::SeqCst),
        }
    }
}

impl fmt::Display for StatisticsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "runs={} observer_runs={} changes={} changes_ever={}{}",
            self.run_count,
            self.forward_count,
            self.total_changes,
            self.total_changes_ever,
            if self.debugging { " (debugging)" } else { "" }
        )
    }
}
