//! AttributeMap: the key-value store on every entity.

use super::{Value, ValueMap};

/// Attribute names to values, in insertion order.
pub type AttributeMap = ValueMap;

/// Well-known attribute names.
pub mod attr {
    /// Reserved: exported entities carry their registry ID under this key.
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const TYPE: &str = "type";
    pub const LOCATION: &str = "location";
    pub const ROTATION: &str = "rotation";
    pub const SCALE: &str = "scale";
}

/// Build an attribute map from `(name, value)` pairs.
pub fn attributes<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> AttributeMap
where
    K: Into<String>,
    V: Into<Value>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}
