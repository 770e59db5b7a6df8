// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::{EngineError, RuleError};
use crate::model::{ConstantId, Model, Value};
use crate::observability::messages::engine::ConstantDerived;
use crate::observability::messages::StructuredLog;
use dashmap::DashMap;
use std::cell::RefCell;

type ConstantKey = (ConstantId, Value);

/// Memoized constant values of one universe.
///
/// Shared by all observer threads. Derivation happens outside the map's
/// locks, so a deriver may freely read other constants; two threads deriving
/// the same key concurrently both compute it and the first insert wins.
#[derive(Debug, Default)]
pub struct ConstantState {
    memo: DashMap<ConstantKey, Value>,
    trace: bool,
}

impl ConstantState {
    pub fn new(trace: bool) -> Self {
        Self {
            memo: DashMap::new(),
            trace,
        }
    }

    /// Value of `constant` for `argument`, deriving it on first use.
    pub fn get(&self, model: &Model, constant: &ConstantId, argument: &Value) -> Result<Value, RuleError> {
        ConstantContext::new(model, self).get(constant.clone(), argument.clone())
    }

    /// Fixes the value of `constant` for `argument` before anything derives it.
    pub fn set(&self, constant: &ConstantId, argument: &Value, value: Value) -> Result<(), EngineError> {
        let key = (constant.clone(), argument.clone());
        let existing = self.memo.entry(key).or_insert_with(|| value.clone());
        if *existing != value {
            return Err(EngineError::ConstantAlreadySet {
                constant: constant.clone(),
                argument: argument.clone(),
                existing: existing.clone(),
                new: value,
            });
        }
        Ok(())
    }

    pub fn is_set(&self, constant: &ConstantId, argument: &Value) -> bool {
        self.memo.contains_key(&(constant.clone(), argument.clone()))
    }

    pub fn len(&self) -> usize {
        self.memo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memo.is_empty()
    }

    pub fn clear(&self) {
        self.memo.clear();
    }
}

/// Handed to constant derivers; tracks the derivation stack to catch cycles.
pub struct ConstantContext<'a> {
    model: &'a Model,
    state: &'a ConstantState,
    stack: RefCell<Vec<ConstantKey>>,
}

impl<'a> ConstantContext<'a> {
    fn new(model: &'a Model, state: &'a ConstantState) -> Self {
        Self {
            model,
            state,
            stack: RefCell::new(Vec::new()),
        }
    }

    pub fn get(&self, constant: impl Into<ConstantId>, argument: impl Into<Value>) -> Result<Value, RuleError> {
        let key: ConstantKey = (constant.into(), argument.into());
        if let Some(value) = self.state.memo.get(&key) {
            return Ok(value.clone());
        }
        if self.stack.borrow().contains(&key) {
            return Err(EngineError::ConstantCycle {
                constant: key.0,
                argument: key.1,
            }
            .into());
        }

        let definition = self
            .model
            .constant(&key.0)
            .ok_or_else(|| EngineError::UnknownConstant(key.0.clone()))?;

        self.stack.borrow_mut().push(key.clone());
        let derived = (definition.deriver)(self, &key.1);
        self.stack.borrow_mut().pop();
        let value = derived?;

        if self.state.trace {
            ConstantDerived {
                constant: key.0.as_str(),
                argument: &key.1,
                value: &value,
            }
            .log();
        }
        Ok(self.state.memo.entry(key).or_insert(value).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Constant, MutableClass};

    fn model() -> Model {
        Model::builder("Universe")
            .class(MutableClass::new("Universe"))
            .constant(Constant::new("fibonacci", |ctx, n| {
                let n = n.as_int().ok_or_else(|| RuleError::failed("fibonacci needs an integer"))?;
                if n < 2 {
                    return Ok(Value::Int(n));
                }
                let a = ctx.get("fibonacci", n - 1)?.as_int().unwrap_or(0);
                let b = ctx.get("fibonacci", n - 2)?.as_int().unwrap_or(0);
                Ok(Value::Int(a + b))
            }))
            .constant(Constant::new("loop", |ctx, n| ctx.get("loop", n.clone())))
            .build()
            .unwrap()
    }

    #[test]
    fn test_fibonacci_is_memoized() {
        let model = model();
        let constants = ConstantState::new(false);

        let value = constants.get(&model, &"fibonacci".into(), &Value::Int(50)).unwrap();
        assert_eq!(value, Value::Int(12_586_269_025));
        assert_eq!(constants.len(), 51);
        assert!(constants.is_set(&"fibonacci".into(), &Value::Int(10)));
    }

    #[test]
    fn test_cycle_is_detected() {
        let model = model();
        let constants = ConstantState::new(false);

        let err = constants.get(&model, &"loop".into(), &Value::Int(1)).unwrap_err();
        assert!(matches!(err, RuleError::Engine(EngineError::ConstantCycle { .. })));
        assert!(constants.is_empty());
    }

    #[test]
    fn test_unknown_constant() {
        let model = model();
        let constants = ConstantState::new(false);
        let err = constants.get(&model, &"nope".into(), &Value::Null).unwrap_err();
        assert!(matches!(err, RuleError::Engine(EngineError::UnknownConstant(_))));
    }

    #[test]
    fn test_set_once() {
        let model = model();
        let constants = ConstantState::new(false);
        let id: ConstantId = "fibonacci".into();

        constants.set(&id, &Value::Int(1), Value::Int(1)).unwrap();
        constants.set(&id, &Value::Int(1), Value::Int(1)).unwrap();
        let err = constants.set(&id, &Value::Int(1), Value::Int(7)).unwrap_err();
        assert!(matches!(err, EngineError::ConstantAlreadySet { .. }));

        constants.get(&model, &id, &Value::Int(5)).unwrap();
        let err = constants.set(&id, &Value::Int(5), Value::Int(6)).unwrap_err();
        assert!(matches!(err, EngineError::ConstantAlreadySet { .. }));
    }
}
