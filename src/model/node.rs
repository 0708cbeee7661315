//! ConfigNode: one node of a parsed pipeline document.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Reserved key that turns a mapping into a provider expression.
pub const PROVIDER_KEY: &str = "provider";

/// Ordered mapping from key to config node. Insertion order is the
/// document's key order and drives resolution order.
pub type ConfigMap = IndexMap<String, ConfigNode>;

/// A value in the document tree, before any provider has been resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigNode {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<ConfigNode>),
    Map(ConfigMap),
}

impl ConfigNode {
    pub fn type_name(&self) -> &'static str {
        match self {
            ConfigNode::Null => "null",
            ConfigNode::Bool(_) => "boolean",
            ConfigNode::Int(_) => "integer",
            ConfigNode::Float(_) => "float",
            ConfigNode::String(_) => "string",
            ConfigNode::List(_) => "list",
            ConfigNode::Map(_) => "mapping",
        }
    }

    pub fn is_null(&self) -> bool { matches!(self, ConfigNode::Null) }

    pub fn is_literal(&self) -> bool {
        !matches!(self, ConfigNode::List(_) | ConfigNode::Map(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigNode::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConfigNode::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ConfigNode]> {
        match self {
            ConfigNode::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ConfigMap> {
        match self {
            ConfigNode::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Name of the provider when this node is a provider expression,
    /// i.e. a mapping whose `provider` key is bound to a string.
    pub fn provider_name(&self) -> Option<&str> {
        self.as_map()?.get(PROVIDER_KEY)?.as_str()
    }

    pub fn is_provider_expr(&self) -> bool {
        self.provider_name().is_some()
    }

    /// Mapping that merges key-by-key: a mapping that is not a provider expression.
    pub fn as_plain_map(&self) -> Option<&ConfigMap> {
        if self.is_provider_expr() { None } else { self.as_map() }
    }
}

impl From<bool> for ConfigNode { fn from(v: bool) -> Self { ConfigNode::Bool(v) } }
impl From<i32> for ConfigNode { fn from(v: i32) -> Self { ConfigNode::Int(v as i64) } }
impl From<i64> for ConfigNode { fn from(v: i64) -> Self { ConfigNode::Int(v) } }
impl From<f64> for ConfigNode { fn from(v: f64) -> Self { ConfigNode::Float(v) } }
impl From<String> for ConfigNode { fn from(v: String) -> Self { ConfigNode::String(v) } }
impl From<&str> for ConfigNode { fn from(v: &str) -> Self { ConfigNode::String(v.to_owned()) } }
impl From<ConfigMap> for ConfigNode { fn from(v: ConfigMap) -> Self { ConfigNode::Map(v) } }
impl<T: Into<ConfigNode>> From<Vec<T>> for ConfigNode {
    fn from(v: Vec<T>) -> Self { ConfigNode::List(v.into_iter().map(Into::into).collect()) }
}

/// Build a `ConfigMap` from `(key, value)` pairs, keeping their order.
pub fn config_map<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> ConfigMap
where
    K: Into<String>,
    V: Into<ConfigNode>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}

impl fmt::Display for ConfigNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::document::to_compact_string(self))
    }
}
