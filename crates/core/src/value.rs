//! Structured values for kind-interpreted payloads
//!
//! This module defines:
//! - Value: the open structured value stored in a record's subject and
//!   `additional` fields
//! - BlockState: the kind-validated view over a subject value for block
//!   kinds (material name + data value)
//!
//! Values are schema-light on purpose. Each action kind declares what it
//! expects in its payloads and validates at the kind boundary, not at the
//! storage layer.
//!
//! ## Type Equality
//!
//! Different types are NEVER equal, even if they contain the same "value":
//! `Int(1) != Float(1.0)`. Float equality follows IEEE-754 semantics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Open structured value for subject and additional payloads
///
/// A strict subset of JSON. `Map` uses a BTreeMap so serialized payloads are
/// stable across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point (IEEE-754)
    Float(f64),
    /// UTF-8 string
    Text(String),
    /// List of values
    List(Vec<Value>),
    /// Map with string keys
    Map(BTreeMap<String, Value>),
}

// Custom PartialEq implementation for IEEE-754 float semantics
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            // IEEE-754: NaN != NaN, -0.0 == 0.0
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            // Different types are NEVER equal
            _ => false,
        }
    }
}

impl Value {
    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Text(_) => "Text",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as bool if this is a Bool value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64 if this is an Int value
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64 if this is a Float value
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as &str if this is a Text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get as slice if this is a List value
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Get as map if this is a Map value
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key if this is a Map value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|m| m.get(key))
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

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// Material name + data value of a block, the payload of block kinds
///
/// This is the validated view over a subject `Value`. Block kinds build
/// their subjects through `to_value` and read foreign subjects through
/// `from_value`; a subject that does not parse is simply not a block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockState {
    /// Material name as reported by the host runtime (e.g. "sand")
    pub material: String,
    /// Raw data value (orientation, delay, growth stage, ...)
    pub data: u8,
}

impl BlockState {
    /// Create a block state
    pub fn new(material: impl Into<String>, data: u8) -> Self {
        Self {
            material: material.into(),
            data,
        }
    }

    /// Create a block state with data value 0
    pub fn of(material: impl Into<String>) -> Self {
        Self::new(material, 0)
    }

    /// Encode as a subject value
    pub fn to_value(&self) -> Value {
        let mut map = BTreeMap::new();
        map.insert("material".to_string(), Value::Text(self.material.clone()));
        map.insert("data".to_string(), Value::Int(i64::from(self.data)));
        Value::Map(map)
    }

    /// Decode from a subject value, if it has the block shape
    pub fn from_value(value: &Value) -> Option<Self> {
        let material = value.get("material")?.as_text()?.to_string();
        let data = u8::try_from(value.get("data")?.as_int()?).ok()?;
        Some(Self { material, data })
    }
}
