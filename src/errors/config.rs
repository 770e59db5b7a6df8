// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors that can occur while loading a [`DclareConfig`](crate::config::DclareConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unsupported config format '{0}', expected .yaml, .yml or .toml")]
    UnsupportedFormat(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
