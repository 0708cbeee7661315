//! `lighting.LightLoader`

use tracing::debug;

use crate::config::Config;
use crate::model::{attr, attributes, Value};
use crate::pipeline::{Module, ModuleContext};
use crate::{Error, Result};

pub const LIGHT_KIND: &str = "LIGHT";

const RESERVED: &[&str] = &["name", "type", "light_type", "location", "energy", "color"];

/// Registers a `LIGHT` entity per item of `lights`.
///
/// Per light: `light_type` (default `POINT`), `location` (default origin),
/// `energy` (default 10.0), `color` (default white), `name` (default
/// `Light.NNN`, numbered over all lights in the registry). Other keys are
/// kept as custom attributes.
#[derive(Debug, Clone, Copy, Default)]
pub struct LightLoader;

impl Module for LightLoader {
    fn run(&self, config: &Config, ctx: &mut ModuleContext<'_>) -> Result<()> {
        let lights = config.get_list_or("lights")?;
        let mut numbered = ctx.registry().by_kind(LIGHT_KIND).len();

        for (i, item) in lights.iter().enumerate() {
            let spec = Config::new(
                item.as_map()
                    .ok_or_else(|| Error::ConfigError {
                        key: format!("lights[{i}]"),
                        message: format!("expected a mapping, got {}", item.type_name()),
                    })?
                    .clone(),
            );

            numbered += 1;
            let name = match spec.get(attr::NAME) {
                Some(_) => spec.get_string(attr::NAME)?.to_string(),
                None => format!("Light.{numbered:03}"),
            };
            let mut light = attributes([
                (attr::NAME, Value::from(name)),
                (attr::TYPE, Value::from(LIGHT_KIND)),
                ("light_type", Value::from(spec.get_string_or("light_type", "POINT")?)),
                (attr::LOCATION, Value::from(spec.get_vector3_or(attr::LOCATION, [0.0; 3])?)),
                ("energy", Value::from(spec.get_float_or("energy", 10.0)?)),
                ("color", Value::from(spec.get_vector3_or("color", [1.0; 3])?)),
            ]);
            for (key, value) in spec.values() {
                if !RESERVED.contains(&key.as_str()) {
                    light.insert(key.clone(), value.clone());
                }
            }

            let id = ctx.registry_mut().register(light)?;
            debug!(%id, "light registered");
        }
        Ok(())
    }
}
