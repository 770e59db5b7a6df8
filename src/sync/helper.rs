// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::SyncError;
use crate::model::{Setable, Value};
use crate::sync::json::{json_to_value, value_to_json};
use crate::traits::SerializationHelper;

/// Sends every object and every non-plumbing setable, encoded with the
/// tagged JSON of [`crate::sync::json`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultSerializationHelper;

impl SerializationHelper for DefaultSerializationHelper {
    fn setable_filter(&self, setable: &Setable) -> bool {
        !setable.plumbing
    }

    fn serialize_value(&self, value: &Value) -> serde_json::Value {
        value_to_json(value)
    }

    fn deserialize_value(&self, json: &serde_json::Value) -> Result<Value, SyncError> {
        json_to_value(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Model, MutableClass, PARENT};

    #[test]
    fn test_plumbing_is_filtered() {
        let model = Model::builder("Universe")
            .class(MutableClass::new("Universe"))
            .setable(Setable::new("name"))
            .build()
            .unwrap();
        let helper = DefaultSerializationHelper;

        assert!(helper.deserialize_setable(&model, "name").is_ok());
        assert!(matches!(
            helper.deserialize_setable(&model, PARENT),
            Err(SyncError::UnknownSetable(_))
        ));
        assert!(matches!(
            helper.deserialize_object(&model, "Ghost:1"),
            Err(SyncError::InvalidObjectId(_))
        ));
        assert_eq!(
            helper.deserialize_object(&model, "Universe:root").unwrap(),
            model.root()
        );
    }
}
