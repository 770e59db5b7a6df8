// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::model::ObjectId;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// A property value.
///
/// Values are immutable and totally ordered so that sets of values and whole
/// states compare deterministically. `Ref` points at another mutable object;
/// containment and opposite setables hold `Ref`s or sets of them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Str(Arc<str>),
    Ref(ObjectId),
    List(Vec<Value>),
    Set(BTreeSet<Value>),
}

impl Value {
    pub fn empty_set() -> Self {
        Value::Set(BTreeSet::new())
    }

    pub fn str(text: impl AsRef<str>) -> Self {
        Value::Str(Arc::from(text.as_ref()))
    }

    pub fn set_of<I: IntoIterator<Item = Value>>(values: I) -> Self {
        Value::Set(values.into_iter().collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_ref_id(&self) -> Option<&ObjectId> {
        match self {
            Value::Ref(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&BTreeSet<Value>> {
        match self {
            Value::Set(set) => Some(set),
            _ => None,
        }
    }

    /// All object references held directly by this value.
    pub fn refs(&self) -> BTreeSet<ObjectId> {
        let mut refs = BTreeSet::new();
        self.collect_refs(&mut refs);
        refs
    }

    fn collect_refs(&self, into: &mut BTreeSet<ObjectId>) {
        match self {
            Value::Ref(id) => {
                into.insert(id.clone());
            }
            Value::List(values) => values.iter().for_each(|v| v.collect_refs(into)),
            Value::Set(values) => values.iter().for_each(|v| v.collect_refs(into)),
            _ => {}
        }
    }

    /// Whether `self` is allowed by `scope`: null is always in scope, a set must
    /// be a subset, any other value must be a member.
    pub fn within(&self, scope: &BTreeSet<Value>) -> bool {
        match self {
            Value::Null => true,
            Value::Set(values) => values.is_subset(scope),
            other => scope.contains(other),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Str(s) => write!(f, "\"{}\"", s),
            Value::Ref(id) => write!(f, "@{}", id),
            Value::List(values) => {
                let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Value::Set(values) => {
                let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "{{{}}}", items.join(", "))
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Value::Ref(id)
    }
}
