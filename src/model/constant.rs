// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::ConstantContext;
use crate::errors::RuleError;
use crate::model::{ConstantId, Value};
use std::fmt;
use std::sync::Arc;

pub type Deriver = Arc<dyn Fn(&ConstantContext<'_>, &Value) -> Result<Value, RuleError> + Send + Sync>;

/// A pure function of one argument whose results are memoized for the
/// lifetime of a universe. Derivers may read other constants through the
/// context but never observed state.
#[derive(Clone)]
pub struct Constant {
    pub id: ConstantId,
    pub deriver: Deriver,
}

impl Constant {
    pub fn new<F>(id: impl Into<ConstantId>, deriver: F) -> Self
    where
        F: Fn(&ConstantContext<'_>, &Value) -> Result<Value, RuleError> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            deriver: Arc::new(deriver),
        }
    }
}

impl fmt::Debug for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constant").field("id", &self.id).finish()
    }
}
