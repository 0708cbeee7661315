//! `loader.EntityLoader`

use tracing::info;

use crate::config::Config;
use crate::model::{attr, Value};
use crate::pipeline::{Module, ModuleContext};
use crate::{Error, Result};

/// Default `type` for loaded entities.
pub const DEFAULT_KIND: &str = "MESH";

/// Registers one entity per item of `entities`.
///
/// Each item is an attribute map; `name` is required, `type` defaults to
/// `MESH`, every other key is kept as a custom attribute.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityLoader;

impl Module for EntityLoader {
    fn run(&self, config: &Config, ctx: &mut ModuleContext<'_>) -> Result<()> {
        let items = config.get_list_or("entities")?;
        for (i, item) in items.iter().enumerate() {
            let key = format!("entities[{i}]");
            let mut attributes = item
                .as_map()
                .ok_or_else(|| Error::ConfigError {
                    key: key.clone(),
                    message: format!("expected a mapping, got {}", item.type_name()),
                })?
                .clone();
            if attributes.get(attr::NAME).and_then(Value::as_str).is_none() {
                return Err(Error::ConfigError {
                    key: format!("{key}.{}", attr::NAME),
                    message: "every entity needs a string name".into(),
                });
            }
            if attributes.contains_key(attr::ID) {
                return Err(Error::ConfigError {
                    key: format!("{key}.{}", attr::ID),
                    message: "'id' is assigned by the registry and cannot be loaded".into(),
                });
            }
            attributes.entry(attr::TYPE.to_string()).or_insert_with(|| DEFAULT_KIND.into());
            ctx.registry_mut().register(attributes)?;
        }
        info!(loaded = items.len(), total = ctx.registry().len(), "entities loaded");
        Ok(())
    }
}
