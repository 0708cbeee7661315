//! Selector conditions: the attribute filters used by `getter.Entity`.

use regex::Regex;

use crate::model::{Entity, Value, ValueMap};
use crate::{Error, Result};

/// Wildcard marker for string patterns.
pub const WILDCARD: char = '*';

/// How one declared attribute is compared against an entity attribute.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Loose equality (numbers across int/float, containers element-wise).
    Equals(Value),
    /// A string beginning or ending with `*`; matched against string attributes.
    Pattern { raw: String, regex: Regex },
}

impl Matcher {
    /// Build the matcher for a declared condition value.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(s) if s.starts_with(WILDCARD) || s.ends_with(WILDCARD) => {
                let body: Vec<String> = s.split(WILDCARD).map(regex::escape).collect();
                let pattern = format!("^{}$", body.join(".*"));
                let regex = Regex::new(&pattern).map_err(|e| Error::ConfigError {
                    key: "conditions".into(),
                    message: format!("invalid pattern '{s}': {e}"),
                })?;
                Ok(Matcher::Pattern { raw: s, regex })
            }
            other => Ok(Matcher::Equals(other)),
        }
    }

    pub fn matches(&self, actual: &Value) -> bool {
        match self {
            Matcher::Equals(expected) => expected.loose_eq(actual),
            Matcher::Pattern { regex, .. } => actual.as_str().is_some_and(|s| regex.is_match(s)),
        }
    }
}

/// Conjunction of attribute matchers. Empty conditions match every entity.
#[derive(Debug, Clone, Default)]
pub struct Conditions {
    entries: Vec<(String, Matcher)>,
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a resolved `conditions` mapping.
    pub fn from_map(map: &ValueMap) -> Result<Self> {
        let mut conditions = Self::new();
        for (key, value) in map {
            conditions.entries.push((key.clone(), Matcher::from_value(value.clone())?));
        }
        Ok(conditions)
    }

    /// Builder-style helper, mostly for tests and host code.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<Self> {
        self.entries.push((key.into(), Matcher::from_value(value.into())?));
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Every declared attribute must exist on the entity and match.
    pub fn matches(&self, entity: &Entity) -> bool {
        self.entries
            .iter()
            .all(|(key, matcher)| entity.get(key).is_some_and(|actual| matcher.matches(actual)))
    }
}
