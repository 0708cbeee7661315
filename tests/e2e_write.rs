//! A complete scene document: load, light, manipulate, sample cameras,
//! write. Output goes to a temp dir passed in as `<args:0>`.

use scenepipe::{Pipeline, RunOptions, Placeholders};

const SCENE: &str = r#"
# Suzanne on a table, one light, three camera poses
{
  "version": 3,
  "setup": {"blender_install_path": "/home_local/<env:USER_NAME>/blender/"},
  "global": {
    "all": {"output_dir": "<args:0>"},
  },
  "modules": [
    {
      "module": "loader.EntityLoader",
      "config": {"entities": [
        {"name": 'Suzanne', "location": [0, 0, 1]},
        {"name": 'Table', "location": [0, 0, 0], "category_id": 2},
      ]},
    },
    {
      "module": "lighting.LightLoader",
      "config": {"lights": [{"light_type": 'POINT', "location": [5, -5, 5], "energy": 1000}]},
    },
    {
      "module": "manipulators.EntityManipulator",
      "config": {
        "selector": {"provider": "getter.Entity", "conditions": {"name": 'Suzanne'}},
        "rotation": {"provider": "sampler.Uniform3d", "min": [0, 0, 0], "max": [0, 0, 6.283185307179586]},
      },
    },
    {
      "module": "camera.CameraSampler",
      "config": {
        "default_cam_param": {"rotation": {"value": [1.2, 0, 0]}},
        "cam_poses": [{
          "number_of_samples": 3,
          "proximity_checks": {"min": 1.0, "avg": {"min": 2.0, "max": 9.0}},
          "location": {"provider": "sampler.Uniform3d", "min": [-5, -5, 1], "max": [5, 5, 4]},
          "rotation": [1.1, 0, 0.3],
        }],
      },
    },
    {"module": "writer.EntityWriter", "config": {"file_name": "scene.json"}},
  ],
}
"#;

fn run_scene(out: &std::path::Path, seed: u64) -> serde_json::Value {
    let placeholders = Placeholders::new(
        vec![out.to_string_lossy().into_owned()],
        [("USER_NAME".to_string(), "ada".to_string())].into_iter().collect(),
    );
    let report = Pipeline::new()
        .run_document(SCENE, &placeholders, RunOptions::seeded(seed))
        .unwrap();
    assert_eq!(report.modules.len(), 5);

    let text = std::fs::read_to_string(out.join("scene.json")).unwrap();
    serde_json::from_str(&text).unwrap()
}

#[test]
fn test_scene_written_with_all_entities() {
    let dir = tempfile::tempdir().unwrap();
    let json = run_scene(dir.path(), 3);
    let entities = json.as_array().unwrap();

    let names: Vec<&str> = entities.iter().map(|e| e["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Suzanne", "Table", "Light.001", "Camera"]);
    assert_eq!(entities[1]["category_id"], 2);
    assert_eq!(entities[2]["type"], "LIGHT");

    let rotation = entities[0]["rotation"].as_array().unwrap();
    assert_eq!(rotation[0], 0.0);
    let z = rotation[2].as_f64().unwrap();
    assert!((0.0..=std::f64::consts::TAU).contains(&z));
}

#[test]
fn test_camera_poses_written() {
    let dir = tempfile::tempdir().unwrap();
    let json = run_scene(dir.path(), 3);
    let camera = &json.as_array().unwrap()[3];
    assert_eq!(camera["type"], "CAMERA");

    let poses = camera["poses"].as_array().unwrap();
    assert_eq!(poses.len(), 3);
    for (frame, pose) in poses.iter().enumerate() {
        assert_eq!(pose["frame"], frame);
        assert_eq!(pose["rotation"], serde_json::json!([1.1, 0.0, 0.3]));
        let z = pose["location"][2].as_f64().unwrap();
        assert!((1.0..=4.0).contains(&z));
    }
}

#[test]
fn test_same_seed_same_file() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    assert_eq!(run_scene(a.path(), 17), run_scene(b.path(), 17));
}
