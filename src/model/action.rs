// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::LeafTransaction;
use crate::errors::RuleError;
use std::fmt;
use std::sync::Arc;

pub type ActionBody = Arc<dyn Fn(&mut LeafTransaction<'_>) -> Result<(), RuleError> + Send + Sync>;

/// A named unit of change submitted to a universe from outside.
///
/// Every action runs in its own transaction that propagates to a fixpoint
/// before the next action starts.
#[derive(Clone)]
pub struct Action {
    pub name: Arc<str>,
    pub body: ActionBody,
}

impl Action {
    pub fn new<F>(name: impl AsRef<str>, body: F) -> Self
    where
        F: Fn(&mut LeafTransaction<'_>) -> Result<(), RuleError> + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name.as_ref()),
            body: Arc::new(body),
        }
    }

    /// An action that changes nothing.
    pub fn noop(name: impl AsRef<str>) -> Self {
        Self::new(name, |_| Ok(()))
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action").field("name", &self.name).finish()
    }
}
