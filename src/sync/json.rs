// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! JSON encoding of values and whole states.
//!
//! Scalars map to their JSON counterparts. References and sets need a tag:
//!
//! ```json
//! { "$ref": "Order:o1" }
//! { "$set": [1, 2, { "$ref": "Line:l1" }] }
//! ```
//!
//! Lists are plain JSON arrays.

use crate::errors::SyncError;
use crate::model::{Model, ObjectId, SetableId, Value};
use crate::state::State;
use serde_json::{Map, Value as Json};
use std::sync::Arc;

pub const REF_KEY: &str = "$ref";
pub const SET_KEY: &str = "$set";

pub fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::from(*i),
        Value::Str(s) => Json::String(s.to_string()),
        Value::Ref(id) => tagged(REF_KEY, Json::String(id.to_string())),
        Value::List(values) => Json::Array(values.iter().map(value_to_json).collect()),
        Value::Set(values) => tagged(SET_KEY, Json::Array(values.iter().map(value_to_json).collect())),
    }
}

fn tagged(tag: &str, inner: Json) -> Json {
    let mut map = Map::new();
    map.insert(tag.to_string(), inner);
    Json::Object(map)
}

pub fn json_to_value(json: &Json) -> Result<Value, SyncError> {
    match json {
        Json::Null => Ok(Value::Null),
        Json::Bool(b) => Ok(Value::Bool(*b)),
        Json::Number(n) => n
            .as_i64()
            .map(Value::Int)
            .ok_or_else(|| SyncError::InvalidDelta(format!("{} is not an integer", n))),
        Json::String(s) => Ok(Value::str(s)),
        Json::Array(items) => items
            .iter()
            .map(json_to_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        Json::Object(map) => {
            if let Some(id) = map.get(REF_KEY).filter(|_| map.len() == 1) {
                let text = id
                    .as_str()
                    .ok_or_else(|| SyncError::InvalidDelta(format!("{} must be a string", REF_KEY)))?;
                let id: ObjectId = text
                    .parse()
                    .map_err(|_| SyncError::InvalidObjectId(text.to_string()))?;
                return Ok(Value::Ref(id));
            }
            if let Some(Json::Array(items)) = map.get(SET_KEY).filter(|_| map.len() == 1) {
                return items
                    .iter()
                    .map(json_to_value)
                    .collect::<Result<_, _>>()
                    .map(Value::Set);
            }
            Err(SyncError::InvalidDelta(format!("unexpected object {}", json)))
        }
    }
}

/// Every stored property of `state`, keyed by object then setable.
pub fn state_to_json(state: &State) -> Json {
    let mut objects = Map::new();
    for object in state.objects() {
        let properties: Map<String, Json> = state
            .properties(object)
            .map(|(setable, value)| (setable.to_string(), value_to_json(value)))
            .collect();
        objects.insert(object.to_string(), Json::Object(properties));
    }
    Json::Object(objects)
}

/// Rebuilds a state written by [`state_to_json`]. Observer dependencies are
/// not part of a snapshot.
pub fn json_to_state(model: Arc<Model>, json: &Json) -> Result<State, SyncError> {
    let objects = json
        .as_object()
        .ok_or_else(|| SyncError::InvalidDelta("a state must be a JSON object".to_string()))?;

    let mut state = State::new(Arc::clone(&model));
    for (key, properties) in objects {
        let object: ObjectId = key.parse().map_err(|_| SyncError::InvalidObjectId(key.clone()))?;
        if model.class(&object.class).is_none() {
            return Err(SyncError::InvalidObjectId(key.clone()));
        }
        let properties = properties
            .as_object()
            .ok_or_else(|| SyncError::InvalidDelta(format!("properties of {} must be an object", key)))?;
        for (name, value) in properties {
            let setable = SetableId::new(name);
            if model.setable(&setable).is_none() {
                return Err(SyncError::UnknownSetable(name.clone()));
            }
            state = state.set(&object, &setable, json_to_value(value)?);
        }
    }
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MutableClass, Setable};
    use serde_json::json;

    fn model() -> Arc<Model> {
        Arc::new(
            Model::builder("Universe")
                .class(MutableClass::new("Universe").with_setable("items"))
                .class(MutableClass::new("Item").with_setable("name").with_setable("count"))
                .setable(Setable::new("items").default(Value::empty_set()).containment())
                .setable(Setable::new("name"))
                .setable(Setable::new("count").default(Value::Int(0)))
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_tagged_values() {
        let value = Value::set_of([Value::Int(1), Value::from(ObjectId::new("Item", "a"))]);
        let json = value_to_json(&value);

        assert_eq!(json, json!({ "$set": [1, { "$ref": "Item:a" }] }));
        assert_eq!(json_to_value(&json).unwrap(), value);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(json_to_value(&json!(1.5)), Err(SyncError::InvalidDelta(_))));
        assert!(matches!(json_to_value(&json!({ "$ref": "nope" })), Err(SyncError::InvalidObjectId(_))));
        assert!(matches!(json_to_value(&json!({ "a": 1 })), Err(SyncError::InvalidDelta(_))));
    }

    #[test]
    fn test_state_snapshot() {
        let model = model();
        let item = ObjectId::new("Item", "a");
        let state = State::new(Arc::clone(&model))
            .set(&item, &"name".into(), Value::str("first"))
            .set(&item, &"count".into(), Value::Int(2));

        let json = state_to_json(&state);
        assert_eq!(json, json!({ "Item:a": { "count": 2, "name": "first" } }));

        let restored = json_to_state(model, &json).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn test_snapshot_rejects_unknown_names() {
        let model = model();
        let err = json_to_state(Arc::clone(&model), &json!({ "Ghost:a": {} })).unwrap_err();
        assert!(matches!(err, SyncError::InvalidObjectId(_)));

        let err = json_to_state(model, &json!({ "Item:a": { "weight": 3 } })).unwrap_err();
        assert!(matches!(err, SyncError::UnknownSetable(_)));
    }
}
