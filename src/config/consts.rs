// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Maximum changes in one transaction before it is aborted (dev mode only)
pub const MAX_TOTAL_NR_OF_CHANGES: usize = 10_000;
/// Maximum changes by one observer instance in one transaction (dev mode only)
pub const MAX_NR_OF_CHANGES: usize = 200;
/// Maximum properties one observer instance may read (dev mode only)
pub const MAX_NR_OF_OBSERVED: usize = 1_000;
/// Maximum observer instances reading one property (dev mode only)
pub const MAX_NR_OF_OBSERVERS: usize = 1_000;
/// Capacity of the universe action queue
pub const MAX_IN_IN_QUEUE: usize = 100;
/// Number of undoable transactions kept
pub const MAX_NR_OF_HISTORY: usize = 64;

/// Prefix of environment variables read by `DclareConfig::from_env`
pub const ENV_PREFIX: &str = "DCLARE_";
