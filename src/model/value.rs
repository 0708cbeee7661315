//! Resolved value type: what providers return and modules consume.

use std::fmt;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde::ser::SerializeMap;

use super::{ConfigNode, EntityId};
use crate::{Error, Result};

/// Ordered mapping of resolved values.
pub type ValueMap = IndexMap<String, Value>;

/// A fully resolved value.
///
/// Same shape as [`ConfigNode`] plus entity references, which only
/// selector providers produce. Entity references are IDs into the
/// run's registry, never copies of the entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(ValueMap),
    #[serde(serialize_with = "serialize_entity_ref")]
    Entity(EntityId),
}

fn serialize_entity_ref<S: Serializer>(id: &EntityId, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry("entity", &id.0)?;
    map.end()
}

// ============================================================================
// Type checking
// ============================================================================

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "mapping",
            Value::Entity(_) => "entity",
        }
    }

    pub fn is_null(&self) -> bool { matches!(self, Value::Null) }
    pub fn is_numeric(&self) -> bool { matches!(self, Value::Int(_) | Value::Float(_)) }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempt to extract as i64. Floats qualify only when integral.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<EntityId> {
        match self {
            Value::Entity(id) => Some(*id),
            _ => None,
        }
    }

    /// A list of exactly three numbers.
    pub fn as_vector3(&self) -> Option<[f64; 3]> {
        match self.as_list()? {
            [x, y, z] => Some([x.as_float()?, y.as_float()?, z.as_float()?]),
            _ => None,
        }
    }

    /// A list of numbers of any length.
    pub fn as_float_list(&self) -> Option<Vec<f64>> {
        self.as_list()?.iter().map(Value::as_float).collect()
    }

    /// Equality used by selector conditions: numbers compare across
    /// int/float, containers compare element-wise.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                match (self, other) {
                    (Value::Int(a), Value::Int(b)) => a == b,
                    _ => self.as_float() == other.as_float(),
                }
            }
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, v)| b.get(k).is_some_and(|w| v.loose_eq(w)))
            }
            _ => self == other,
        }
    }
}

// ============================================================================
// Conversions (From impls)
// ============================================================================

impl From<bool> for Value { fn from(v: bool) -> Self { Value::Bool(v) } }
impl From<i32> for Value { fn from(v: i32) -> Self { Value::Int(v as i64) } }
impl From<i64> for Value { fn from(v: i64) -> Self { Value::Int(v) } }
impl From<usize> for Value { fn from(v: usize) -> Self { Value::Int(v as i64) } }
impl From<f64> for Value { fn from(v: f64) -> Self { Value::Float(v) } }
impl From<String> for Value { fn from(v: String) -> Self { Value::String(v) } }
impl From<&str> for Value { fn from(v: &str) -> Self { Value::String(v.to_owned()) } }
impl From<EntityId> for Value { fn from(v: EntityId) -> Self { Value::Entity(v) } }
impl From<[f64; 3]> for Value {
    fn from(v: [f64; 3]) -> Self { Value::List(v.iter().map(|c| Value::Float(*c)).collect()) }
}
impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self { Value::List(v.into_iter().map(Into::into).collect()) }
}
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self { v.map(Into::into).unwrap_or(Value::Null) }
}

/// Structural copy of a document node. Provider expressions are copied
/// as plain mappings; use the resolver to evaluate them.
impl From<&ConfigNode> for Value {
    fn from(node: &ConfigNode) -> Self {
        match node {
            ConfigNode::Null => Value::Null,
            ConfigNode::Bool(b) => Value::Bool(*b),
            ConfigNode::Int(i) => Value::Int(*i),
            ConfigNode::Float(f) => Value::Float(*f),
            ConfigNode::String(s) => Value::String(s.clone()),
            ConfigNode::List(items) => Value::List(items.iter().map(Value::from).collect()),
            ConfigNode::Map(map) => Value::Map(
                map.iter().map(|(k, v)| (k.clone(), Value::from(v))).collect(),
            ),
        }
    }
}

// ============================================================================
// Typed extraction
// ============================================================================

/// Convert from Value to concrete types.
pub trait FromValue: Sized {
    fn from_value(val: &Value) -> Result<Self>;
}

fn type_error(expected: &str, val: &Value) -> Error {
    Error::TypeError { expected: expected.into(), got: val.type_name().into() }
}

impl FromValue for Value {
    fn from_value(val: &Value) -> Result<Self> {
        Ok(val.clone())
    }
}

impl FromValue for String {
    fn from_value(val: &Value) -> Result<Self> {
        val.as_str().map(str::to_owned).ok_or_else(|| type_error("string", val))
    }
}

impl FromValue for i64 {
    fn from_value(val: &Value) -> Result<Self> {
        val.as_int().ok_or_else(|| type_error("integer", val))
    }
}

impl FromValue for f64 {
    fn from_value(val: &Value) -> Result<Self> {
        val.as_float().ok_or_else(|| type_error("number", val))
    }
}

impl FromValue for bool {
    fn from_value(val: &Value) -> Result<Self> {
        val.as_bool().ok_or_else(|| type_error("boolean", val))
    }
}

impl FromValue for EntityId {
    fn from_value(val: &Value) -> Result<Self> {
        val.as_entity().ok_or_else(|| type_error("entity", val))
    }
}

impl FromValue for [f64; 3] {
    fn from_value(val: &Value) -> Result<Self> {
        val.as_vector3().ok_or_else(|| type_error("list of 3 numbers", val))
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(val: &Value) -> Result<Self> {
        val.as_list()
            .ok_or_else(|| type_error("list", val))?
            .iter()
            .map(T::from_value)
            .collect()
    }
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v:?}"),
            Value::String(s) => write!(f, "\"{}\"", s.replace('"', "\\\"")),
            Value::List(l) => {
                write!(f, "[")?;
                for (i, v) in l.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Value::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Value::Entity(id) => write!(f, "<entity {id}>"),
        }
    }
}
