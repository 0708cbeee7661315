//! Per-item specs merged over shared default parameters.
//!
//! Modules that take a list of similar items (camera poses, lights, …)
//! let the document state common parameters once:
//!
//! ```text
//! "default_cam_param": {"fov": 1.0},
//! "cam_poses": [{"location": [0, 0, 5]}, {"location": [1, 0, 5], "fov": 0.8}]
//! ```

use crate::model::{ConfigMap, ConfigNode};
use crate::{Error, Result};
use super::merge_under;

#[derive(Debug, Clone, Default)]
pub struct ItemCollection {
    defaults: ConfigMap,
}

impl ItemCollection {
    pub fn new(defaults: ConfigMap) -> Self {
        Self { defaults }
    }

    /// One item spec with the defaults filled in underneath.
    pub fn item(&self, spec: &ConfigMap) -> ConfigMap {
        merge_under(&self.defaults, spec)
    }

    /// Hand each merged item, with its index, to `f` in list order.
    /// `key` names the list in error messages.
    pub fn for_each<F>(&self, key: &str, items: &[ConfigNode], mut f: F) -> Result<()>
    where
        F: FnMut(usize, ConfigMap) -> Result<()>,
    {
        for (i, node) in items.iter().enumerate() {
            let spec = node.as_map().ok_or_else(|| Error::ConfigError {
                key: format!("{key}[{i}]"),
                message: format!("expected a mapping, got {}", node.type_name()),
            })?;
            f(i, self.item(spec))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse;

    #[test]
    fn test_items_inherit_defaults() {
        let defaults = parse("{'fov': 1.0, 'samples': 2}").unwrap().as_map().unwrap().clone();
        let items = parse("[{'samples': 5}, {}]").unwrap();
        let collection = ItemCollection::new(defaults);

        let mut seen = Vec::new();
        collection
            .for_each("cam_poses", items.as_list().unwrap(), |i, item| {
                seen.push((i, item["samples"].as_int().unwrap(), item.contains_key("fov")));
                Ok(())
            })
            .unwrap();
        assert_eq!(seen, vec![(0, 5, true), (1, 2, true)]);
    }

    #[test]
    fn test_non_mapping_item_is_error() {
        let collection = ItemCollection::default();
        let items = parse("[{}, 3]").unwrap();
        let err = collection.for_each("cam_poses", items.as_list().unwrap(), |_, _| Ok(()));
        match err {
            Err(Error::ConfigError { key, .. }) => assert_eq!(key, "cam_poses[1]"),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }
}
