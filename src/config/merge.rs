//! Config layering.

use crate::model::{ConfigMap, ConfigNode};

/// Merge `overrides` on top of `base`; keys in `overrides` win.
///
/// Plain mappings present on both sides merge recursively. Anything else,
/// provider expressions included, is replaced wholesale by the override.
/// Keys keep `base` order, with new keys appended in `overrides` order.
pub fn merge_under(base: &ConfigMap, overrides: &ConfigMap) -> ConfigMap {
    let mut out = base.clone();
    for (key, value) in overrides {
        let merged = match (out.get(key).and_then(ConfigNode::as_plain_map), value.as_plain_map()) {
            (Some(below), Some(above)) => ConfigNode::Map(merge_under(below, above)),
            _ => value.clone(),
        };
        out.insert(key.clone(), merged);
    }
    out
}
