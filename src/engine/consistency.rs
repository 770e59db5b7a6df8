// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::DclareConfig;
use crate::errors::ConsistencyError;
use crate::model::{Value, CONTAINING, PARENT};
use crate::state::State;

/// Checks mandatory properties, scopes and references to orphans in `state`.
pub fn check_consistency(state: &State, config: &DclareConfig) -> Vec<ConsistencyError> {
    let model = state.model();
    let root = model.root();
    let mut errors = Vec::new();

    for object in state.objects() {
        for setable in model.setables_of(&object.class) {
            if setable.mandatory && state.value(object, &setable.id).is_none() {
                errors.push(ConsistencyError::EmptyMandatory {
                    object: object.clone(),
                    setable: setable.id.clone(),
                });
            }
        }

        let is_orphan = *object != root && state.parent(object).is_none();
        if is_orphan && config.is_check_orphan_state() {
            errors.push(ConsistencyError::OrphanState { object: object.clone() });
        }

        for (setable_id, value) in state.properties(object) {
            if setable_id.as_str() == PARENT || setable_id.as_str() == CONTAINING {
                continue;
            }
            let Some(setable) = model.setable(setable_id) else {
                continue;
            };

            if let Some(scope) = &setable.scope {
                let allowed = match state.get(object, scope) {
                    Value::Set(allowed) => allowed,
                    _ => Default::default(),
                };
                if !value.within(&allowed) {
                    errors.push(ConsistencyError::OutOfScope {
                        object: object.clone(),
                        setable: setable_id.clone(),
                        value: value.clone(),
                    });
                }
            }

            if setable.containment || setable.plumbing {
                continue;
            }
            for referenced in value.refs() {
                if referenced != root && state.parent(&referenced).is_none() {
                    errors.push(ConsistencyError::ReferencedOrphan {
                        object: object.clone(),
                        setable: setable_id.clone(),
                        orphan: referenced,
                    });
                }
            }
        }
    }
    errors
}
