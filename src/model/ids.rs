// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Separator between the class and the key in the textual form of an [`ObjectId`].
pub const OBJECT_ID_SEPARATOR: char = ':';

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(id: impl AsRef<str>) -> Self {
                Self(Arc::from(id.as_ref()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(Arc::from(id))
            }
        }
    };
}

string_id!(
    /// Identifies a mutable class in a [`Model`](crate::model::Model).
    ClassId
);
string_id!(
    /// Identifies a setable (property) declaration.
    SetableId
);
string_id!(
    /// Identifies an observer (rule) declaration.
    ObserverId
);
string_id!(
    /// Identifies a constant (memoized derivation).
    ConstantId
);

/// Identity of a mutable object: its class plus a key unique within that class.
///
/// Ids are plain values. An object "exists" in a [`State`](crate::state::State)
/// only while it holds at least one non-default property.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId {
    pub class: ClassId,
    pub key: Arc<str>,
}

impl ObjectId {
    pub fn new(class: impl Into<ClassId>, key: impl AsRef<str>) -> Self {
        Self {
            class: class.into(),
            key: Arc::from(key.as_ref()),
        }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.class, OBJECT_ID_SEPARATOR, self.key)
    }
}

/// Error returned when an object id string lacks the `Class:key` shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseObjectIdError(pub String);

impl fmt::Display for ParseObjectIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid object id '{}', expected 'Class{}key'", self.0, OBJECT_ID_SEPARATOR)
    }
}

impl std::error::Error for ParseObjectIdError {}

impl FromStr for ObjectId {
    type Err = ParseObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(OBJECT_ID_SEPARATOR) {
            Some((class, key)) if !class.is_empty() && !key.is_empty() => Ok(ObjectId::new(class, key)),
            _ => Err(ParseObjectIdError(s.to_string())),
        }
    }
}

impl Serialize for ObjectId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_id_display_and_parse() {
        let id = ObjectId::new("Order", "42");
        assert_eq!(id.to_string(), "Order:42");
        assert_eq!("Order:42".parse::<ObjectId>().unwrap(), id);
    }

    #[test]
    fn test_object_id_key_may_contain_separator() {
        let id: ObjectId = "Line:a:b".parse().unwrap();
        assert_eq!(id.class.as_str(), "Line");
        assert_eq!(&*id.key, "a:b");
    }

    #[test]
    fn test_object_id_parse_rejects_missing_key() {
        assert!("Order".parse::<ObjectId>().is_err());
        assert!("Order:".parse::<ObjectId>().is_err());
        assert!(":1".parse::<ObjectId>().is_err());
    }

    #[test]
    fn test_object_ids_order_by_class_then_key() {
        let a = ObjectId::new("A", "2");
        let b = ObjectId::new("B", "1");
        let a1 = ObjectId::new("A", "1");
        assert!(a1 < a);
        assert!(a < b);
    }
}
