// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Build a model once and hand back the result.
//!
//! A [`OneShot`] starts a universe, optionally loads a JSON snapshot into it,
//! runs its actions one after the other (each to idle), stops the universe
//! and returns the final state, or its JSON rendering.

use crate::config::DclareConfig;
use crate::engine::UniverseTransaction;
use crate::errors::SyncError;
use crate::model::{Action, Model};
use crate::state::State;
use crate::sync::json::{json_to_state, state_to_json};
use std::sync::Arc;

pub struct OneShot {
    model: Arc<Model>,
    config: DclareConfig,
    json_in: Option<String>,
    actions: Vec<Action>,
}

impl OneShot {
    /// A one-shot build of `model` in dev mode.
    pub fn new(model: Arc<Model>) -> Self {
        Self {
            model,
            config: DclareConfig::default().with_dev_mode(true),
            json_in: None,
            actions: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: DclareConfig) -> Self {
        self.config = config;
        self
    }

    /// Snapshot, as written by [`state_to_json`], loaded before any action.
    pub fn with_json(mut self, json: impl Into<String>) -> Self {
        self.json_in = Some(json.into());
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Runs everything and returns the state the universe stopped in.
    pub async fn run(self) -> Result<State, SyncError> {
        let mut actions = Vec::with_capacity(self.actions.len() + 1);
        if let Some(json) = &self.json_in {
            let snapshot = json_to_state(Arc::clone(&self.model), &serde_json::from_str(json)?)?;
            actions.push(load_snapshot(snapshot));
        }
        actions.extend(self.actions);

        let universe = UniverseTransaction::start(self.model, self.config, Action::noop("init"));
        for action in actions {
            universe.put_and_wait_for_idle(action).await?;
        }
        universe.stop().await?;
        let status = universe.wait_for_stopped().await;
        universe.throw_if_error()?;
        Ok(status.state)
    }

    /// Runs everything and renders the final state as JSON.
    pub async fn from_json_to_json(self) -> Result<String, SyncError> {
        let state = self.run().await?;
        Ok(state_to_json(&state).to_string())
    }
}

/// Writes every non-plumbing property of `snapshot`. Containment writes
/// restore the parent links.
fn load_snapshot(snapshot: State) -> Action {
    Action::new("load_json", move |tx| {
        let model = Arc::clone(tx.model());
        for object in snapshot.objects() {
            for (setable, value) in snapshot.properties(object) {
                if model.setable(setable).map_or(true, |s| s.plumbing) {
                    continue;
                }
                tx.set(object, setable.clone(), value.clone())?;
            }
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MutableClass, ObjectId, Observer, Setable, Value};

    fn catalog() -> Arc<Model> {
        Arc::new(
            Model::builder("Catalog")
                .class(MutableClass::new("Catalog").with_setable("items").with_setable("count").with_observer("count_items"))
                .class(MutableClass::new("Item").with_setable("name"))
                .setable(Setable::new("items").default(Value::empty_set()).containment())
                .setable(Setable::new("count").default(Value::Int(0)))
                .setable(Setable::new("name"))
                .observer(Observer::new("count_items", |tx, catalog| {
                    let count = tx.children(catalog).len() as i64;
                    tx.set(catalog, "count", count)?;
                    Ok(())
                }))
                .build()
                .unwrap(),
        )
    }

    fn item(key: &str) -> ObjectId {
        ObjectId::new("Item", key)
    }

    fn add_item(key: &'static str) -> Action {
        Action::new(format!("add_{}", key), move |tx| {
            let root = tx.root();
            tx.add(&root, "items", item(key))?;
            tx.set(&item(key), "name", key)?;
            Ok(())
        })
    }

    #[tokio::test]
    async fn test_run_applies_actions_in_order() {
        let state = OneShot::new(catalog())
            .with_action(add_item("pen"))
            .with_action(add_item("ink"))
            .run()
            .await
            .unwrap();

        let root = ObjectId::new("Catalog", "root");
        assert_eq!(state.get(&root, &"count".into()), Value::Int(2));
        assert_eq!(state.get(&item("ink"), &"name".into()), Value::str("ink"));
    }

    #[tokio::test]
    async fn test_json_in_is_rebuilt_and_extended() {
        let json_in = OneShot::new(catalog())
            .with_action(add_item("pen"))
            .from_json_to_json()
            .await
            .unwrap();

        let state = OneShot::new(catalog())
            .with_json(json_in)
            .with_action(add_item("ink"))
            .run()
            .await
            .unwrap();

        let root = ObjectId::new("Catalog", "root");
        assert_eq!(state.get(&root, &"count".into()), Value::Int(2));
        assert_eq!(state.parent(&item("pen")), Some(root));
        assert_eq!(state.get(&item("pen"), &"name".into()), Value::str("pen"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_rejected() {
        let err = OneShot::new(catalog()).with_json("[1, 2]").run().await.unwrap_err();

        assert!(matches!(err, SyncError::InvalidDelta(_)));
    }

    #[tokio::test]
    async fn test_failing_action_is_reported() {
        let err = OneShot::new(catalog())
            .with_action(Action::new("bad", |tx| {
                let root = tx.root();
                tx.set(&root, "colour", "red")?;
                Ok(())
            }))
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Engine(_)));
    }
}
