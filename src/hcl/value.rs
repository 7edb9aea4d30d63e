//! Attribute values understood by the block renderer

use indexmap::IndexMap;

use super::block::Block;

/// A value that can appear on the right-hand side of an attribute
///
/// Rendering dispatches on the variant. Everything that is not a mapping,
/// sequence, boolean, nested block or raw string is emitted as a double-quoted
/// string without escaping.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Nested object: `{ key = value ... }`
    Map(IndexMap<String, Value>),
    /// Sequence: `[ value, ... ]`
    List(Vec<Value>),
    /// Lowercase `true`/`false`
    Bool(bool),
    /// Emitted verbatim, without quotes (references, expressions)
    Raw(String),
    /// A complete block embedded as a value
    Block(Box<Block>),
    /// Plain string, double-quoted
    String(String),
    /// Integer, double-quoted like any other scalar
    Int(i64),
    /// Float, double-quoted like any other scalar
    Float(f64),
}

impl Value {
    /// Create an unquoted value
    pub fn raw(s: impl Into<String>) -> Self {
        Value::Raw(s.into())
    }

    /// Short name of the variant, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Map(_) => "mapping",
            Value::List(_) => "sequence",
            Value::Bool(_) => "boolean",
            Value::Raw(_) => "raw string",
            Value::Block(_) => "block",
            Value::String(_) => "string",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
        }
    }

    /// Text of a scalar value, as it would appear between quotes
    ///
    /// Returns None for mappings, sequences, booleans and blocks.
    pub fn as_label(&self) -> Option<String> {
        match self {
            Value::String(s) | Value::Raw(s) => Some(s.clone()),
            Value::Int(n) => Some(n.to_string()),
            Value::Float(f) => Some(f.to_string()),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<u16> for Value {
    fn from(n: u16) -> Self {
        Value::Int(n.into())
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(n.into())
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<Block> for Value {
    fn from(block: Block) -> Self {
        Value::Block(Box::new(block))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<Value>> From<IndexMap<K, V>> for Value {
    fn from(map: IndexMap<K, V>) -> Self {
        Value::Map(map.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
