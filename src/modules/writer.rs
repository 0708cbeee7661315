//! `writer.EntityWriter`

use std::fs;
use std::path::Path;

use tracing::info;

use crate::config::Config;
use crate::model::Entity;
use crate::pipeline::{Module, ModuleContext};
use crate::Result;

pub const DEFAULT_FILE_NAME: &str = "entities.json";

/// Writes every registered entity as a pretty-printed JSON array to
/// `<output_dir>/<file_name>`, creating `output_dir` if needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityWriter;

impl Module for EntityWriter {
    fn run(&self, config: &Config, ctx: &mut ModuleContext<'_>) -> Result<()> {
        let dir = Path::new(config.get_string("output_dir")?);
        let file = dir.join(config.get_string_or("file_name", DEFAULT_FILE_NAME)?);

        let entities: Vec<&Entity> = ctx.registry().all().collect();
        fs::create_dir_all(dir)?;
        fs::write(&file, serde_json::to_string_pretty(&entities)?)?;

        info!(path = %file.display(), entities = entities.len(), "entities written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::Pipeline;

    #[test]
    fn test_writes_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested");
        let doc = "{'version': 3,
            'global': {'all': {'output_dir': '<args:0>'}},
            'modules': [
                {'module': 'loader.EntityLoader', 'config': {'entities': [{'name': 'Suzanne'}]}},
                {'module': 'writer.EntityWriter'}]}";
        let arg = out.to_string_lossy().into_owned();
        Pipeline::new().run_str(doc, &[arg.as_str()], Some(1)).unwrap();

        let text = std::fs::read_to_string(out.join("entities.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json[0]["id"], 1);
        assert_eq!(json[0]["name"], "Suzanne");
        assert_eq!(json[0]["type"], "MESH");
    }

    #[test]
    fn test_registry_id_is_the_only_id_key() {
        let dir = tempfile::tempdir().unwrap();
        let doc = "{'version': 3, 'modules': [
            {'module': 'loader.EntityLoader', 'config': {'entities': [{'name': 'A'}]}},
            {'module': 'manipulators.EntityManipulator', 'config': {
                'selector': {'provider': 'getter.Entity', 'conditions': {'name': 'A'}},
                'id': 99}},
            {'module': 'writer.EntityWriter', 'config': {'output_dir': '<args:0>'}}]}";
        let arg = dir.path().to_string_lossy().into_owned();
        assert!(Pipeline::new().run_str(doc, &[arg.as_str()], Some(1)).is_err());
        assert!(!dir.path().join("entities.json").exists());

        let doc = "{'version': 3, 'modules': [
            {'module': 'loader.EntityLoader', 'config': {'entities': [{'name': 'A', 'ids': [1]}]}},
            {'module': 'writer.EntityWriter', 'config': {'output_dir': '<args:0>'}}]}";
        Pipeline::new().run_str(doc, &[arg.as_str()], Some(1)).unwrap();
        let text = std::fs::read_to_string(dir.path().join("entities.json")).unwrap();
        assert_eq!(text.matches("\"id\"").count(), 1);
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json[0]["id"], 1);
        assert_eq!(json[0]["ids"], serde_json::json!([1]));
    }

    #[test]
    fn test_output_dir_required() {
        let err = Pipeline::new()
            .run_str("{'version': 3, 'modules': [{'module': 'writer.EntityWriter'}]}", &[], Some(1));
        assert!(err.is_err());
    }
}
