// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for model and configuration validation.
//!
//! This module contains message types for logging:
//! * Individual model validation issues
//! * Model validation failure summaries
//! * Configuration file loading

use crate::errors::ModelValidationError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// One problem found while validating model declarations.
///
/// # Log Level
/// `warn!` - Reported individually before the failure summary
///
/// # Example
/// ```
/// use dclare::errors::ModelValidationError;
/// use dclare::model::ClassId;
/// use dclare::observability::messages::validation::ModelValidationIssue;
///
/// let issue = ModelValidationError::DuplicateClass { class: ClassId::new("Order") };
/// let msg = ModelValidationIssue { issue: &issue };
///
/// assert_eq!(msg.to_string(), "Model validation issue: Duplicate class id: 'Order'");
/// ```
pub struct ModelValidationIssue<'a> {
    pub issue: &'a ModelValidationError,
}

impl Display for ModelValidationIssue<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Model validation issue: {}", self.issue)
    }
}

impl StructuredLog for ModelValidationIssue<'_> {
    fn log(&self) {
        tracing::warn!(issue = %self.issue, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::WARN,
            "span_name",
            name = name,
            issue = %self.issue,
        )
    }
}

/// Model validation failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use dclare::observability::messages::validation::ModelValidationFailed;
///
/// let msg = ModelValidationFailed {
///     universe: "Shop",
///     error_count: 3,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct ModelValidationFailed<'a> {
    pub universe: &'a str,
    pub error_count: usize,
}

impl Display for ModelValidationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Model '{}' failed validation with {} errors",
            self.universe, self.error_count
        )
    }
}

impl StructuredLog for ModelValidationFailed<'_> {
    fn log(&self) {
        tracing::error!(
            universe = self.universe,
            error_count = self.error_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "span_name",
            name = name,
            universe = self.universe,
            error_count = self.error_count,
        )
    }
}

/// A configuration file was read.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ConfigLoaded<'a> {
    pub path: &'a str,
    pub dev_mode: bool,
}

impl Display for ConfigLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Loaded configuration from '{}' (dev_mode={})", self.path, self.dev_mode)
    }
}

impl StructuredLog for ConfigLoaded<'_> {
    fn log(&self) {
        tracing::info!(path = self.path, dev_mode = self.dev_mode, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(tracing::Level::INFO, "span_name", name = name, path = self.path)
    }
}
