// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{
    ENV_PREFIX, MAX_IN_IN_QUEUE, MAX_NR_OF_CHANGES, MAX_NR_OF_HISTORY, MAX_NR_OF_OBSERVED, MAX_NR_OF_OBSERVERS,
    MAX_TOTAL_NR_OF_CHANGES,
};
use crate::errors::ConfigError;
use crate::observability::messages::validation::ConfigLoaded;
use crate::observability::messages::StructuredLog;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Runtime configuration of a universe.
///
/// Limits and traces only take effect in dev mode. Outside dev mode the
/// change and observation limits are unbounded and traces are off, while the
/// queue capacity and history length always apply.
///
/// # Example
/// ```yaml
/// dev_mode: true
/// check_orphan_state: true
/// trace:
///   universe: true
///   actions: true
/// limits:
///   max_nr_of_changes: 50
///   max_in_in_queue: 10
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DclareConfig {
    pub dev_mode: bool,
    pub check_orphan_state: bool,
    pub run_sequential: bool,
    pub trace: TraceConfig,
    pub limits: LimitConfig,
}

/// Which engine activities are traced at debug level.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    pub universe: bool,
    pub mutable: bool,
    pub actions: bool,
    pub derivation: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitConfig {
    pub max_total_nr_of_changes: usize,
    pub max_nr_of_changes: usize,
    pub max_nr_of_observed: usize,
    pub max_nr_of_observers: usize,
    pub max_in_in_queue: usize,
    pub max_nr_of_history: usize,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            max_total_nr_of_changes: MAX_TOTAL_NR_OF_CHANGES,
            max_nr_of_changes: MAX_NR_OF_CHANGES,
            max_nr_of_observed: MAX_NR_OF_OBSERVED,
            max_nr_of_observers: MAX_NR_OF_OBSERVERS,
            max_in_in_queue: MAX_IN_IN_QUEUE,
            max_nr_of_history: MAX_NR_OF_HISTORY,
        }
    }
}

impl DclareConfig {
    /// Defaults overridden by `DCLARE_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each
    /// `DCLARE_*` variable. Unparseable values are ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |name: &str, current: bool| {
            lookup(&format!("{}{}", ENV_PREFIX, name))
                .and_then(|v| v.trim().parse::<bool>().ok())
                .unwrap_or(current)
        };
        let number = |name: &str, current: usize| {
            lookup(&format!("{}{}", ENV_PREFIX, name))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(current)
        };

        let defaults = Self::default();
        Self {
            dev_mode: flag("DEV_MODE", defaults.dev_mode),
            check_orphan_state: flag("CHECK_ORPHAN_STATE", defaults.check_orphan_state),
            run_sequential: flag("RUN_SEQUENTIAL", defaults.run_sequential),
            trace: TraceConfig {
                universe: flag("TRACE_UNIVERSE", false),
                mutable: flag("TRACE_MUTABLE", false),
                actions: flag("TRACE_ACTIONS", false),
                derivation: flag("TRACE_DERIVATION", false),
            },
            limits: LimitConfig {
                max_total_nr_of_changes: number("MAX_TOTAL_NR_OF_CHANGES", defaults.limits.max_total_nr_of_changes),
                max_nr_of_changes: number("MAX_NR_OF_CHANGES", defaults.limits.max_nr_of_changes),
                max_nr_of_observed: number("MAX_NR_OF_OBSERVED", defaults.limits.max_nr_of_observed),
                max_nr_of_observers: number("MAX_NR_OF_OBSERVERS", defaults.limits.max_nr_of_observers),
                max_in_in_queue: number("MAX_IN_IN_QUEUE", defaults.limits.max_in_in_queue),
                max_nr_of_history: number("MAX_NR_OF_HISTORY", defaults.limits.max_nr_of_history),
            },
        }
    }

    pub fn with_dev_mode(mut self, dev_mode: bool) -> Self {
        self.dev_mode = dev_mode;
        self
    }

    pub fn with_check_orphan_state(mut self, check_orphan_state: bool) -> Self {
        self.check_orphan_state = check_orphan_state;
        self
    }

    pub fn with_run_sequential(mut self, run_sequential: bool) -> Self {
        self.run_sequential = run_sequential;
        self
    }

    pub fn with_trace_universe(mut self, trace: bool) -> Self {
        self.trace.universe = trace;
        self
    }

    pub fn with_trace_mutable(mut self, trace: bool) -> Self {
        self.trace.mutable = trace;
        self
    }

    pub fn with_trace_actions(mut self, trace: bool) -> Self {
        self.trace.actions = trace;
        self
    }

    pub fn with_trace_derivation(mut self, trace: bool) -> Self {
        self.trace.derivation = trace;
        self
    }

    pub fn with_max_total_nr_of_changes(mut self, max: usize) -> Self {
        self.limits.max_total_nr_of_changes = max;
        self
    }

    pub fn with_max_nr_of_changes(mut self, max: usize) -> Self {
        self.limits.max_nr_of_changes = max;
        self
    }

    pub fn with_max_nr_of_observed(mut self, max: usize) -> Self {
        self.limits.max_nr_of_observed = max;
        self
    }

    pub fn with_max_nr_of_observers(mut self, max: usize) -> Self {
        self.limits.max_nr_of_observers = max;
        self
    }

    pub fn with_max_in_in_queue(mut self, max: usize) -> Self {
        self.limits.max_in_in_queue = max;
        self
    }

    pub fn with_max_nr_of_history(mut self, max: usize) -> Self {
        self.limits.max_nr_of_history = max;
        self
    }

    pub fn is_check_orphan_state(&self) -> bool {
        self.dev_mode && self.check_orphan_state
    }

    pub fn is_run_sequential(&self) -> bool {
        self.dev_mode && self.run_sequential
    }

    pub fn is_trace_universe(&self) -> bool {
        self.dev_mode && self.trace.universe
    }

    pub fn is_trace_mutable(&self) -> bool {
        self.dev_mode && self.trace.mutable
    }

    pub fn is_trace_actions(&self) -> bool {
        self.dev_mode && self.trace.actions
    }

    pub fn is_trace_derivation(&self) -> bool {
        self.dev_mode && self.trace.derivation
    }

    pub fn max_total_nr_of_changes(&self) -> usize {
        self.dev_limit(self.limits.max_total_nr_of_changes)
    }

    pub fn max_nr_of_changes(&self) -> usize {
        self.dev_limit(self.limits.max_nr_of_changes)
    }

    pub fn max_nr_of_observed(&self) -> usize {
        self.dev_limit(self.limits.max_nr_of_observed)
    }

    pub fn max_nr_of_observers(&self) -> usize {
        self.dev_limit(self.limits.max_nr_of_observers)
    }

    pub fn max_in_in_queue(&self) -> usize {
        self.limits.max_in_in_queue
    }

    pub fn max_nr_of_history(&self) -> usize {
        self.limits.max_nr_of_history
    }

    fn dev_limit(&self, limit: usize) -> usize {
        if self.dev_mode {
            limit
        } else {
            usize::MAX
        }
    }

    /// Checks values that would make a universe unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.max_in_in_queue == 0 {
            return Err(ConfigError::Invalid("max_in_in_queue must be at least 1".to_string()));
        }
        if self.limits.max_nr_of_history == 0 {
            return Err(ConfigError::Invalid("max_nr_of_history must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Loads a config from a `.yaml`, `.yml` or `.toml` file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<DclareConfig, ConfigError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let content = match extension.as_str() {
        "yaml" | "yml" | "toml" => fs::read_to_string(path)?,
        other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
    };

    let config: DclareConfig = if extension == "toml" {
        toml::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };
    ConfigLoaded {
        path: &path.display().to_string(),
        dev_mode: config.dev_mode,
    }
    .log();
    Ok(config)
}

/// Loads a config file and validates it.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<DclareConfig, ConfigError> {
    let config = load_config(path)?;
    config.validate()?;
    Ok(config)
}
