//! `manipulators.EntityManipulator`

use tracing::debug;

use crate::config::Config;
use crate::pipeline::{Module, ModuleContext};
use crate::Result;

pub const SELECTOR: &str = "selector";

/// Sets attributes on every entity picked by `selector`.
///
/// All keys of the module's own config except `selector` are attribute
/// assignments. They are resolved once per selected entity, so a sampler
/// draws a fresh value for each one.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityManipulator;

impl Module for EntityManipulator {
    fn run(&self, config: &Config, ctx: &mut ModuleContext<'_>) -> Result<()> {
        let targets = config.get_entities(SELECTOR)?;
        let raw = ctx.raw();
        let assignments: Vec<&str> = ctx
            .local()
            .keys()
            .map(String::as_str)
            .filter(|k| *k != SELECTOR)
            .collect();

        for &id in &targets {
            for &key in &assignments {
                let path = ctx.config_path().key(key);
                let value = match raw.get(key) {
                    Some(node) => ctx.resolve(node, &path)?,
                    None => continue,
                };
                ctx.registry_mut().set_attribute(id, key, value)?;
            }
        }
        debug!(entities = targets.len(), attributes = assignments.len(), "entities manipulated");
        Ok(())
    }

    fn defers(&self, key: &str) -> bool {
        key != SELECTOR
    }
}

#[cfg(test)]
mod tests {
    use crate::Pipeline;
    use crate::model::Value;

    const DOC: &str = "{
        'version': 3,
        'global': {'all': {'output_dir': '/tmp/out'}},
        'modules': [
            {'module': 'loader.EntityLoader', 'config': {'entities': [
                {'name': 'Cube.001'}, {'name': 'Cube.002'}, {'name': 'Camera', 'type': 'CAMERA'}]}},
            {'module': 'manipulators.EntityManipulator', 'config': {
                'selector': {'provider': 'getter.Entity', 'conditions': {'name': 'Cube*'}},
                'location': {'provider': 'sampler.Uniform3d', 'min': [0, 0, 0], 'max': [1, 1, 1]},
                'cf_physics': True}},
        ],
    }";

    #[test]
    fn test_fresh_sample_per_entity() {
        let report = Pipeline::new().run_str(DOC, &[], Some(7)).unwrap();
        let cubes: Vec<_> = report.registry.all().filter(|e| e.is_kind("MESH")).collect();
        let a = cubes[0].location().unwrap();
        let b = cubes[1].location().unwrap();
        assert_ne!(a, b);
        assert!(a.iter().chain(&b).all(|c| (0.0..=1.0).contains(c)));
        assert_eq!(cubes[0].get("cf_physics"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_unselected_and_global_keys_untouched() {
        let report = Pipeline::new().run_str(DOC, &[], Some(7)).unwrap();
        let camera = report.registry.find_by_name("Camera").unwrap();
        assert!(camera.location().is_none());
        assert!(report.registry.all().all(|e| e.get("output_dir").is_none()));
    }
}
