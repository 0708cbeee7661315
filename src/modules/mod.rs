//! # Built-in modules
//!
//! Registry-only pipeline stages. None of them talks to a host
//! application; they populate, mutate and export the entity registry.
//!
//! | Name | Stage |
//! |------|-------|
//! | `loader.EntityLoader` | registers entities from attribute maps |
//! | `lighting.LightLoader` | registers `LIGHT` entities |
//! | `manipulators.EntityManipulator` | sets attributes on selected entities |
//! | `camera.CameraSampler` | samples camera poses under proximity checks |
//! | `writer.EntityWriter` | writes the registry as JSON |

pub mod camera;
pub mod lighting;
pub mod loader;
pub mod manipulator;
pub mod writer;

use crate::model::{ConfigMap, ConfigNode};
use crate::pipeline::ModuleRegistry;
use crate::{Error, Result};

pub use camera::CameraSampler;
pub use lighting::LightLoader;
pub use loader::EntityLoader;
pub use manipulator::EntityManipulator;
pub use writer::EntityWriter;

pub(crate) fn register_builtins(registry: &mut ModuleRegistry) {
    registry.register("loader.EntityLoader", EntityLoader);
    registry.register("lighting.LightLoader", LightLoader);
    registry.register("manipulators.EntityManipulator", EntityManipulator);
    registry.register("camera.CameraSampler", CameraSampler);
    registry.register("writer.EntityWriter", EntityWriter);
}

/// A deferred raw key that must hold a plain mapping, or be absent.
pub(crate) fn raw_map(raw: &ConfigMap, key: &str) -> Result<ConfigMap> {
    match raw.get(key) {
        None | Some(ConfigNode::Null) => Ok(ConfigMap::new()),
        Some(node) => node.as_plain_map().cloned().ok_or_else(|| Error::ConfigError {
            key: key.to_string(),
            message: format!("expected a mapping, got {}", node.type_name()),
        }),
    }
}

/// A deferred raw key that must hold a list, or be absent.
pub(crate) fn raw_list<'a>(raw: &'a ConfigMap, key: &str) -> Result<&'a [ConfigNode]> {
    match raw.get(key) {
        None | Some(ConfigNode::Null) => Ok(&[]),
        Some(node) => node.as_list().ok_or_else(|| Error::ConfigError {
            key: key.to_string(),
            message: format!("expected a list, got {}", node.type_name()),
        }),
    }
}
