//! # Module configuration
//!
//! - [`Config`]: typed accessors over a module's resolved config.
//! - [`merge_under`]: layering of `global.all`, `global.<category>` and
//!   module-local config.
//! - [`ItemCollection`]: per-item specs merged over shared defaults.

pub mod merge;
pub mod item_collection;

use crate::model::{EntityId, FromValue, Value, ValueMap};
use crate::{Error, Result};

pub use item_collection::ItemCollection;
pub use merge::merge_under;

/// Resolved configuration handed to a module.
///
/// `get_*` fails when the key is missing or holds the wrong type.
/// `get_*_or` falls back to the default only when the key is missing;
/// a present value of the wrong type is still an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    values: ValueMap,
}

impl Config {
    pub fn new(values: ValueMap) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &ValueMap {
        &self.values
    }

    pub fn into_values(self) -> ValueMap {
        self.values
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    // ========================================================================
    // Typed access
    // ========================================================================

    fn require(&self, key: &str) -> Result<&Value> {
        self.values.get(key).ok_or_else(|| Error::ConfigError {
            key: key.to_string(),
            message: "missing required key".into(),
        })
    }

    /// Any [`FromValue`] type; a wrong type surfaces as `TypeError`.
    pub fn get_as<T: FromValue>(&self, key: &str) -> Result<T> {
        T::from_value(self.require(key)?)
    }

    pub fn get_int(&self, key: &str) -> Result<i64> {
        let v = self.require(key)?;
        v.as_int().ok_or_else(|| wrong_type(key, "an integer", v))
    }

    pub fn get_int_or(&self, key: &str, default: i64) -> Result<i64> {
        if self.has(key) { self.get_int(key) } else { Ok(default) }
    }

    pub fn get_float(&self, key: &str) -> Result<f64> {
        let v = self.require(key)?;
        v.as_float().ok_or_else(|| wrong_type(key, "a number", v))
    }

    pub fn get_float_or(&self, key: &str, default: f64) -> Result<f64> {
        if self.has(key) { self.get_float(key) } else { Ok(default) }
    }

    pub fn get_bool(&self, key: &str) -> Result<bool> {
        let v = self.require(key)?;
        v.as_bool().ok_or_else(|| wrong_type(key, "a boolean", v))
    }

    pub fn get_bool_or(&self, key: &str, default: bool) -> Result<bool> {
        if self.has(key) { self.get_bool(key) } else { Ok(default) }
    }

    pub fn get_string(&self, key: &str) -> Result<&str> {
        let v = self.require(key)?;
        v.as_str().ok_or_else(|| wrong_type(key, "a string", v))
    }

    pub fn get_string_or<'s>(&'s self, key: &str, default: &'s str) -> Result<&'s str> {
        if self.has(key) { self.get_string(key) } else { Ok(default) }
    }

    pub fn get_list(&self, key: &str) -> Result<&[Value]> {
        let v = self.require(key)?;
        v.as_list().ok_or_else(|| wrong_type(key, "a list", v))
    }

    pub fn get_list_or(&self, key: &str) -> Result<&[Value]> {
        if self.has(key) { self.get_list(key) } else { Ok(&[]) }
    }

    pub fn get_map(&self, key: &str) -> Result<&ValueMap> {
        let v = self.require(key)?;
        v.as_map().ok_or_else(|| wrong_type(key, "a mapping", v))
    }

    /// A nested mapping as its own `Config`.
    pub fn sub_config(&self, key: &str) -> Result<Config> {
        self.get_map(key).map(|m| Config::new(m.clone()))
    }

    pub fn get_vector3(&self, key: &str) -> Result<[f64; 3]> {
        let v = self.require(key)?;
        v.as_vector3().ok_or_else(|| wrong_type(key, "a list of 3 numbers", v))
    }

    pub fn get_vector3_or(&self, key: &str, default: [f64; 3]) -> Result<[f64; 3]> {
        if self.has(key) { self.get_vector3(key) } else { Ok(default) }
    }

    /// Entity references, as produced by `getter.Entity`. A single
    /// reference is accepted as a one-element list.
    pub fn get_entities(&self, key: &str) -> Result<Vec<EntityId>> {
        match self.require(key)? {
            Value::Entity(id) => Ok(vec![*id]),
            v @ Value::List(items) => items
                .iter()
                .map(|item| item.as_entity().ok_or_else(|| wrong_type(key, "a list of entities", v)))
                .collect(),
            v => Err(wrong_type(key, "a list of entities", v)),
        }
    }
}

impl From<ValueMap> for Config {
    fn from(values: ValueMap) -> Self {
        Self::new(values)
    }
}

fn wrong_type(key: &str, expected: &str, got: &Value) -> Error {
    Error::ConfigError {
        key: key.to_string(),
        message: format!("expected {expected}, got {}", got.type_name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attributes;

    fn config() -> Config {
        Config::new(attributes([
            ("samples", Value::from(5)),
            ("ratio", Value::from(0.5)),
            ("name", Value::from("cam")),
            ("enabled", Value::from(true)),
            ("location", Value::from(vec![1, 2, 3])),
            ("targets", Value::List(vec![Value::Entity(EntityId(4))])),
            ("nested", Value::Map(attributes([("x", 1)]))),
        ]))
    }

    #[test]
    fn test_typed_getters() {
        let c = config();
        assert_eq!(c.get_int("samples").unwrap(), 5);
        assert_eq!(c.get_float("samples").unwrap(), 5.0);
        assert_eq!(c.get_float("ratio").unwrap(), 0.5);
        assert_eq!(c.get_string("name").unwrap(), "cam");
        assert!(c.get_bool("enabled").unwrap());
        assert_eq!(c.get_vector3("location").unwrap(), [1.0, 2.0, 3.0]);
        assert_eq!(c.get_entities("targets").unwrap(), vec![EntityId(4)]);
        assert_eq!(c.sub_config("nested").unwrap().get_int("x").unwrap(), 1);
        assert_eq!(c.get_as::<String>("name").unwrap(), "cam");
        assert!(matches!(c.get_as::<bool>("name"), Err(Error::TypeError { .. })));
    }

    #[test]
    fn test_defaults_only_for_missing_keys() {
        let c = config();
        assert_eq!(c.get_int_or("max_tries", 10000).unwrap(), 10000);
        assert_eq!(c.get_string_or("mode", "SURFACE").unwrap(), "SURFACE");
        assert!(c.get_list_or("cam_poses").unwrap().is_empty());
        assert!(c.get_int_or("name", 1).is_err());
    }

    #[test]
    fn test_missing_and_mistyped() {
        let c = config();
        assert!(matches!(c.get_int("nope"), Err(Error::ConfigError { .. })));
        assert!(matches!(c.get_int("ratio"), Err(Error::ConfigError { .. })));
        assert!(c.get_entities("name").is_err());
    }
}
