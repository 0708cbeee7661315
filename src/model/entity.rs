//! Entity in the scene registry.

use serde::{Deserialize, Serialize};

use super::attribute_map::attr;
use super::{AttributeMap, Value};

/// Opaque entity identifier, stable for the lifetime of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A scene entity: object, light, camera, … identified by its `type` attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub id: EntityId,
    #[serde(flatten)]
    pub attributes: AttributeMap,
}

impl Entity {
    pub fn new(id: EntityId) -> Self {
        Self { id, attributes: AttributeMap::new() }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.get(attr::NAME).and_then(Value::as_str)
    }

    /// The entity's category (`MESH`, `LIGHT`, `CAMERA`, …).
    pub fn kind(&self) -> Option<&str> {
        self.get(attr::TYPE).and_then(Value::as_str)
    }

    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind() == Some(kind)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Upsert an attribute; returns the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.attributes.insert(key.into(), value.into())
    }

    pub fn location(&self) -> Option<[f64; 3]> {
        self.get(attr::LOCATION).and_then(Value::as_vector3)
    }
}
