// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Model validation.
//!
//! Declarations are checked in three stages, accumulating every error found
//! in a stage before giving up:
//!
//! 1. **Uniqueness**: class, setable, observer and constant ids are unique
//! 2. **References**: classes list known setables and observers, opposites and
//!    scopes name known setables, the universe class is declared
//! 3. **Structure**: opposites are symmetric and containment setables have no
//!    opposite (the parent link already mirrors them)
//!
//! Structure checks look setables up by id, so they only run once the first
//! two stages pass.

use crate::errors::ModelValidationError;
use crate::model::ModelBuilder;
use std::collections::{HashMap, HashSet};

pub fn validate_model(builder: &ModelBuilder) -> Result<(), Vec<ModelValidationError>> {
    let mut errors = Vec::new();

    if let Err(duplicates) = validate_unique_ids(builder) {
        errors.extend(duplicates);
    }

    if let Err(unresolved) = validate_references(builder) {
        errors.extend(unresolved);
    }

    if errors.is_empty() {
        if let Err(structural) = validate_opposites(builder) {
            errors.extend(structural);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_unique_ids(builder: &ModelBuilder) -> Result<(), Vec<ModelValidationError>> {
    let mut errors = Vec::new();

    let mut classes = HashSet::new();
    for class in &builder.classes {
        if !classes.insert(&class.id) {
            errors.push(ModelValidationError::DuplicateClass { class: class.id.clone() });
        }
    }

    let mut setables = HashSet::new();
    for setable in &builder.setables {
        if !setables.insert(&setable.id) {
            errors.push(ModelValidationError::DuplicateSetable { setable: setable.id.clone() });
        }
    }

    let mut observers = HashSet::new();
    for observer in &builder.observers {
        if !observers.insert(&observer.id) {
            errors.push(ModelValidationError::DuplicateObserver { observer: observer.id.clone() });
        }
    }

    let mut constants = HashSet::new();
    for constant in &builder.constants {
        if !constants.insert(&constant.id) {
            errors.push(ModelValidationError::DuplicateConstant { constant: constant.id.clone() });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_references(builder: &ModelBuilder) -> Result<(), Vec<ModelValidationError>> {
    let setable_ids: HashSet<_> = builder.setables.iter().map(|s| &s.id).collect();
    let observer_ids: HashSet<_> = builder.observers.iter().map(|o| &o.id).collect();
    let mut errors = Vec::new();

    if !builder.classes.iter().any(|c| c.id == builder.universe) {
        errors.push(ModelValidationError::MissingUniverseClass {
            class: builder.universe.clone(),
        });
    }

    for class in &builder.classes {
        for setable in &class.setables {
            if !setable_ids.contains(setable) {
                errors.push(ModelValidationError::UnknownSetable {
                    class: class.id.clone(),
                    setable: setable.clone(),
                });
            }
        }
        for observer in &class.observers {
            if !observer_ids.contains(observer) {
                errors.push(ModelValidationError::UnknownObserver {
                    class: class.id.clone(),
                    observer: observer.clone(),
                });
            }
        }
    }

    for setable in &builder.setables {
        if let Some(opposite) = &setable.opposite {
            if !setable_ids.contains(opposite) {
                errors.push(ModelValidationError::UnresolvedOpposite {
                    setable: setable.id.clone(),
                    opposite: opposite.clone(),
                });
            }
        }
        if let Some(scope) = &setable.scope {
            if !setable_ids.contains(scope) {
                errors.push(ModelValidationError::UnresolvedScope {
                    setable: setable.id.clone(),
                    scope: scope.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_opposites(builder: &ModelBuilder) -> Result<(), Vec<ModelValidationError>> {
    let by_id: HashMap<_, _> = builder.setables.iter().map(|s| (&s.id, s)).collect();
    let mut errors = Vec::new();

    for setable in &builder.setables {
        let Some(opposite_id) = &setable.opposite else {
            continue;
        };
        if setable.containment {
            errors.push(ModelValidationError::ContainmentWithOpposite {
                setable: setable.id.clone(),
            });
            continue;
        }
        let mirrors_back = by_id
            .get(opposite_id)
            .and_then(|opposite| opposite.opposite.as_ref())
            .is_some_and(|back| *back == setable.id);
        if !mirrors_back {
            errors.push(ModelValidationError::AsymmetricOpposite {
                setable: setable.id.clone(),
                opposite: opposite_id.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Model, MutableClass, Observer, Setable, Value};

    fn universe() -> MutableClass {
        MutableClass::new("Universe")
    }

    #[test]
    fn test_valid_model() {
        let result = Model::builder("Universe")
            .class(universe().with_setable("items").with_observer("count"))
            .setable(Setable::new("items").default(Value::empty_set()).containment())
            .observer(Observer::new("count", |_, _| Ok(())))
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_duplicate_ids() {
        let errors = Model::builder("Universe")
            .class(universe())
            .class(universe())
            .setable(Setable::new("a"))
            .setable(Setable::new("a"))
            .build()
            .unwrap_err();

        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], ModelValidationError::DuplicateClass { .. }));
        assert!(matches!(errors[1], ModelValidationError::DuplicateSetable { .. }));
    }

    #[test]
    fn test_missing_universe_class() {
        let errors = Model::builder("Universe").build().unwrap_err();
        assert!(matches!(errors[0], ModelValidationError::MissingUniverseClass { .. }));
    }

    #[test]
    fn test_unresolved_references() {
        let errors = Model::builder("Universe")
            .class(universe().with_setable("missing").with_observer("nobody"))
            .setable(Setable::new("a").opposite("b"))
            .setable(Setable::new("c").scope("d"))
            .build()
            .unwrap_err();

        assert_eq!(errors.len(), 4);
        assert!(errors.iter().any(|e| matches!(e, ModelValidationError::UnknownSetable { .. })));
        assert!(errors.iter().any(|e| matches!(e, ModelValidationError::UnknownObserver { .. })));
        assert!(errors.iter().any(|e| matches!(e, ModelValidationError::UnresolvedOpposite { .. })));
        assert!(errors.iter().any(|e| matches!(e, ModelValidationError::UnresolvedScope { .. })));
    }

    #[test]
    fn test_asymmetric_opposite() {
        let errors = Model::builder("Universe")
            .class(universe())
            .setable(Setable::new("a").opposite("b"))
            .setable(Setable::new("b"))
            .build()
            .unwrap_err();

        assert_eq!(
            errors,
            vec![ModelValidationError::AsymmetricOpposite {
                setable: "a".into(),
                opposite: "b".into(),
            }]
        );
    }

    #[test]
    fn test_containment_with_opposite_rejected() {
        let errors = Model::builder("Universe")
            .class(universe())
            .setable(Setable::new("a").containment().opposite("b"))
            .setable(Setable::new("b").opposite("a"))
            .build()
            .unwrap_err();

        assert_eq!(
            errors,
            vec![ModelValidationError::ContainmentWithOpposite { setable: "a".into() }]
        );
    }

    #[test]
    fn test_structure_checks_skipped_after_reference_errors() {
        let errors = Model::builder("Universe")
            .class(universe().with_setable("ghost"))
            .setable(Setable::new("a").opposite("b"))
            .setable(Setable::new("b"))
            .build()
            .unwrap_err();

        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ModelValidationError::UnknownSetable { .. }));
    }
}
