// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::SyncError;
use crate::model::{Model, ObjectId, Setable, SetableId, Value};

/// Decides what crosses the wire and how values are encoded.
pub trait SerializationHelper: Send + Sync {
    /// Whether changes to `object` are sent at all.
    fn mutable_filter(&self, _object: &ObjectId) -> bool {
        true
    }

    /// Whether changes to `setable` are sent.
    fn setable_filter(&self, setable: &Setable) -> bool;

    fn serialize_value(&self, value: &Value) -> serde_json::Value;

    fn deserialize_value(&self, json: &serde_json::Value) -> Result<Value, SyncError>;

    fn serialize_object(&self, object: &ObjectId) -> String {
        object.to_string()
    }

    /// Parses an object id, rejecting classes the model does not declare.
    fn deserialize_object(&self, model: &Model, text: &str) -> Result<ObjectId, SyncError> {
        let object: ObjectId = text
            .parse()
            .map_err(|_| SyncError::InvalidObjectId(text.to_string()))?;
        if model.class(&object.class).is_none() {
            return Err(SyncError::InvalidObjectId(text.to_string()));
        }
        Ok(object)
    }

    /// Resolves a setable name, rejecting unknown or filtered setables.
    fn deserialize_setable<'m>(&self, model: &'m Model, name: &str) -> Result<&'m Setable, SyncError> {
        model
            .setable(&SetableId::new(name))
            .filter(|setable| self.setable_filter(setable))
            .ok_or_else(|| SyncError::UnknownSetable(name.to_string()))
    }
}
