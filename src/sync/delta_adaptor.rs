// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Turns transactions into JSON deltas and deltas back into actions.
//!
//! A delta maps object ids to the properties that changed:
//!
//! ```json
//! { "Order:o1": { "total": 23 }, "Line:l1": { "qty": 4 } }
//! ```
//!
//! Properties written by an applied delta are not sent back to the peer.
//! Properties derived from them are, and converge because the peer derives
//! the same values.

use crate::engine::UniverseTransaction;
use crate::errors::SyncError;
use crate::model::{Action, ObjectId, SetableId, Value};
use crate::observability::messages::sync::{DeltaApplied, DeltaProduced};
use crate::observability::messages::StructuredLog;
use crate::state::{Slot, State};
use crate::traits::{DiffHandler, SerializationHelper};
use parking_lot::Mutex;
use serde_json::{Map, Value as Json};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::mpsc;

type Echoes = Arc<Mutex<HashMap<Slot, Value>>>;

/// Connects one universe to a stream of deltas.
pub struct DeltaAdaptor {
    universe: UniverseTransaction,
    helper: Arc<dyn SerializationHelper>,
    outgoing: tokio::sync::Mutex<mpsc::UnboundedReceiver<String>>,
    echoes: Echoes,
}

struct DeltaProducer {
    universe: String,
    helper: Arc<dyn SerializationHelper>,
    sender: mpsc::UnboundedSender<String>,
    echoes: Echoes,
}

impl DiffHandler for DeltaProducer {
    fn handle(&self, pre: &State, post: &State, _init: bool) {
        let echoes = std::mem::take(&mut *self.echoes.lock());
        let model = post.model();

        let mut delta: BTreeMap<String, Map<String, Json>> = BTreeMap::new();
        for change in pre.diff(post) {
            if !self.helper.mutable_filter(&change.object) {
                continue;
            }
            let Some(setable) = model.setable(&change.setable) else {
                continue;
            };
            if !self.helper.setable_filter(setable) {
                continue;
            }
            if echoes.get(&change.slot()) == Some(&change.new) {
                continue;
            }
            delta
                .entry(self.helper.serialize_object(&change.object))
                .or_default()
                .insert(change.setable.to_string(), self.helper.serialize_value(&change.new));
        }

        if delta.is_empty() {
            return;
        }
        let objects = delta.len();
        let json: Map<String, Json> = delta.into_iter().map(|(k, v)| (k, Json::Object(v))).collect();
        // A closed receiver means nobody listens any more.
        if self.sender.send(Json::Object(json).to_string()).is_ok() {
            DeltaProduced {
                universe: &self.universe,
                objects,
            }
            .log();
        }
    }
}

impl DeltaAdaptor {
    /// Registers a delta producer on `universe`. Deltas cover transactions
    /// that complete after this call.
    pub fn attach(universe: UniverseTransaction, helper: Arc<dyn SerializationHelper>) -> Arc<Self> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let echoes: Echoes = Arc::new(Mutex::new(HashMap::new()));
        universe.add_diff_handler(Arc::new(DeltaProducer {
            universe: universe.model().universe_class().to_string(),
            helper: Arc::clone(&helper),
            sender,
            echoes: Arc::clone(&echoes),
        }));
        Arc::new(Self {
            universe,
            helper,
            outgoing: tokio::sync::Mutex::new(receiver),
            echoes,
        })
    }

    pub fn universe(&self) -> &UniverseTransaction {
        &self.universe
    }

    pub fn universe_name(&self) -> &str {
        self.universe.model().universe_class().as_str()
    }

    /// Waits for the next outgoing delta. Cancel safe.
    pub async fn next_delta(&self) -> Option<String> {
        self.outgoing.lock().await.recv().await
    }

    /// Next outgoing delta if one is ready.
    pub fn poll_delta(&self) -> Option<String> {
        self.outgoing.try_lock().ok()?.try_recv().ok()
    }

    /// Decodes a delta from the peer and queues it as an action.
    pub async fn accept(&self, delta: &str) -> Result<(), SyncError> {
        let changes = self.decode(delta)?;
        let objects = changes
            .iter()
            .map(|(object, _, _)| object)
            .collect::<BTreeSet<_>>()
            .len();

        let echoes = Arc::clone(&self.echoes);
        self.universe
            .put(Action::new("apply_delta", move |tx| {
                let mut applied = echoes.lock();
                applied.clear();
                for (object, setable, value) in &changes {
                    tx.set(object, setable.clone(), value.clone())?;
                    applied.insert(Slot::new(object.clone(), setable.clone()), value.clone());
                }
                Ok(())
            }))
            .await?;

        DeltaApplied {
            universe: self.universe_name(),
            objects,
        }
        .log();
        Ok(())
    }

    fn decode(&self, delta: &str) -> Result<Vec<(ObjectId, SetableId, Value)>, SyncError> {
        let json: Json = serde_json::from_str(delta)?;
        let objects = json
            .as_object()
            .ok_or_else(|| SyncError::InvalidDelta("a delta must be a JSON object".to_string()))?;
        let model = self.universe.model();

        let mut changes = Vec::new();
        for (key, properties) in objects {
            let object = self.helper.deserialize_object(model, key)?;
            let properties = properties
                .as_object()
                .ok_or_else(|| SyncError::InvalidDelta(format!("properties of {} must be an object", key)))?;
            for (name, value) in properties {
                let setable = self.helper.deserialize_setable(model, name)?;
                changes.push((object.clone(), setable.id.clone(), self.helper.deserialize_value(value)?));
            }
        }
        Ok(changes)
    }
}
