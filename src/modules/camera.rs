//! `camera.CameraSampler`: camera poses sampled under proximity checks.
//!
//! ```text
//! {"module": "camera.CameraSampler", "config": {
//!   "default_cam_param": {"rotation": [1.2, 0, 0]},
//!   "cam_poses": [{
//!     "number_of_samples": 5,
//!     "proximity_checks": {"min": 1.0, "avg": {"min": 2.0, "max": 8.0}},
//!     "location": {"provider": "sampler.Uniform3d", "min": [-5, -5, 1], "max": [5, 5, 3]}
//!   }]
//! }}
//! ```
//!
//! Every pose spec is merged over `default_cam_param`. For each spec the
//! module keeps drawing a pose until `number_of_samples` poses pass the
//! checks or `max_tries` draws are spent. A pose is every key of the spec
//! that does not steer sampling: `location`, `rotation` and intrinsics such
//! as `fov`, resolved in document order on each try.
//!
//! Distances are measured from the sampled location to the location of
//! every `MESH` entity. With `min_interest_score`, the meshes closer than
//! the `max` proximity bound (all meshes without one) are scored by their
//! `coarse_grained_class`; see [`InterestScore`].

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::config::{Config, ItemCollection};
use crate::model::{attr, attributes, ConfigMap, Entity, EntityId, KeyPath, Value, ValueMap};
use crate::pipeline::{Module, ModuleContext};
use crate::registry::EntityRegistry;
use crate::{Error, Result};
use super::{raw_list, raw_map};

pub const CAMERA_KIND: &str = "CAMERA";
pub const POSES: &str = "poses";
pub const FRAME: &str = "frame";
pub const COARSE_GRAINED_CLASS: &str = "coarse_grained_class";

const DEFAULT_MAX_TRIES: i64 = 10_000;
const DEFAULT_SPECIAL_OBJECTS_WEIGHT: f64 = 2.0;

/// Keys that steer sampling. They are resolved once per pose spec.
const CONTROL_KEYS: &[&str] = &[
    "number_of_samples",
    "max_tries",
    "proximity_checks",
    "min_interest_score",
    "special_objects",
    "special_objects_weight",
];

/// Pose keys would overwrite these on the pose record or the camera entity.
const RESERVED_POSE_KEYS: &[&str] = &[FRAME, POSES, attr::ID, attr::NAME, attr::TYPE];

#[derive(Debug, Clone, Copy, Default)]
pub struct CameraSampler;

impl Module for CameraSampler {
    fn run(&self, _config: &Config, ctx: &mut ModuleContext<'_>) -> Result<()> {
        let raw = ctx.raw();
        let defaults = raw_map(raw, "default_cam_param")?;
        let specs = raw_list(raw, "cam_poses")?;
        let camera = scene_camera(ctx.registry_mut())?;

        ItemCollection::new(defaults).for_each("cam_poses", specs, |i, spec| {
            let path = ctx.config_path().key("cam_poses").index(i);
            sample_poses(ctx, camera, &spec, &path)
        })
    }

    fn deferred_keys(&self) -> &[&'static str] {
        &["cam_poses", "default_cam_param"]
    }
}

/// The first `CAMERA` entity, registered as `Camera` when there is none.
fn scene_camera(registry: &mut EntityRegistry) -> Result<EntityId> {
    if let Some(camera) = registry.by_kind(CAMERA_KIND).first() {
        return Ok(camera.id);
    }
    registry.register(attributes([
        (attr::NAME, Value::from("Camera")),
        (attr::TYPE, Value::from(CAMERA_KIND)),
        (attr::LOCATION, Value::from([0.0; 3])),
        (attr::ROTATION, Value::from([0.0; 3])),
        (POSES, Value::List(Vec::new())),
    ]))
}

fn sample_poses(
    ctx: &mut ModuleContext<'_>,
    camera: EntityId,
    spec: &ConfigMap,
    path: &KeyPath,
) -> Result<()> {
    let settings = resolve_keys(ctx, spec, path, CONTROL_KEYS)?;
    let wanted = settings.get_int_or("number_of_samples", 1)?;
    let max_tries = settings.get_int_or("max_tries", DEFAULT_MAX_TRIES)?;
    let checks = ProximityChecks::parse(settings.get("proximity_checks"), &path.to_string())?;
    let interest = InterestScore::from_config(&settings, path)?;
    if !spec.contains_key(attr::LOCATION) {
        return Err(Error::ConfigError {
            key: format!("{path}.{}", attr::LOCATION),
            message: "missing required key".into(),
        });
    }

    let pose_keys: Vec<&str> =
        spec.keys().map(String::as_str).filter(|k| !CONTROL_KEYS.contains(k)).collect();
    if let Some(key) = pose_keys.iter().find(|k| RESERVED_POSE_KEYS.contains(*k)) {
        return Err(Error::ConfigError {
            key: format!("{path}.{key}"),
            message: "reserved name, cannot be a camera parameter".into(),
        });
    }

    let meshes: Vec<Mesh> = ctx.registry().by_kind("MESH").into_iter().filter_map(Mesh::of).collect();

    let mut tries = 0;
    let mut accepted = 0;
    while accepted < wanted {
        if tries >= max_tries {
            warn!(path = %path, tries, accepted, wanted, "maximum number of tries reached");
            break;
        }
        tries += 1;

        let pose = resolve_keys(ctx, spec, path, &pose_keys)?;
        let location = pose.get_vector3(attr::LOCATION)?;
        let rotation = pose.get_vector3_or(attr::ROTATION, [0.0; 3])?;

        let distances: Vec<f64> = meshes.iter().map(|m| distance(location, m.location)).collect();
        if checks.accepts(&distances) && interest.accepts(&meshes, &distances, checks.max) {
            let intrinsics = pose
                .into_values()
                .into_iter()
                .filter(|(k, _)| k != attr::LOCATION && k != attr::ROTATION)
                .collect();
            append_pose(ctx.registry_mut(), camera, location, rotation, intrinsics)?;
            accepted += 1;
        }
    }
    debug!(path = %path, tries, accepted, "camera poses sampled");
    Ok(())
}

/// Resolve the listed keys of a merged spec, in the order given; absent
/// keys are skipped.
fn resolve_keys(
    ctx: &mut ModuleContext<'_>,
    spec: &ConfigMap,
    path: &KeyPath,
    keys: &[&str],
) -> Result<Config> {
    let mut values = ValueMap::new();
    for &key in keys {
        if let Some(node) = spec.get(key) {
            values.insert(key.to_string(), ctx.resolve(node, &path.clone().key(key))?);
        }
    }
    Ok(Config::new(values))
}

/// Appends `{frame, location, rotation, ..intrinsics}` to the camera's
/// pose log and makes it the camera's current state.
fn append_pose(
    registry: &mut EntityRegistry,
    camera: EntityId,
    location: [f64; 3],
    rotation: [f64; 3],
    intrinsics: ValueMap,
) -> Result<()> {
    let entity = registry.get_mut(camera)?;
    let mut poses = match entity.get(POSES) {
        Some(Value::List(poses)) => poses.clone(),
        _ => Vec::new(),
    };
    let mut record = attributes([
        (FRAME, Value::from(poses.len())),
        (attr::LOCATION, Value::from(location)),
        (attr::ROTATION, Value::from(rotation)),
    ]);
    record.extend(intrinsics.iter().map(|(k, v)| (k.clone(), v.clone())));
    poses.push(Value::Map(record));

    entity.set(POSES, Value::List(poses));
    entity.set(attr::LOCATION, location);
    entity.set(attr::ROTATION, rotation);
    for (key, value) in intrinsics {
        entity.set(key, value);
    }
    Ok(())
}

fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    a.iter().zip(&b).map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt()
}

/// A `MESH` entity as the pose checks see it.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub location: [f64; 3],
    pub class: Option<String>,
}

impl Mesh {
    /// `None` for entities without a location.
    pub fn of(entity: &Entity) -> Option<Self> {
        Some(Self {
            location: entity.location()?,
            class: entity.get(COARSE_GRAINED_CLASS).and_then(Value::as_str).map(str::to_string),
        })
    }
}

// ============================================================================
// Proximity checks
// ============================================================================

/// Conjunction of distance thresholds. Every bound is exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProximityChecks {
    /// Every distance must exceed this.
    pub min: Option<f64>,
    /// Every distance must stay below this.
    pub max: Option<f64>,
    pub avg: Option<(f64, f64)>,
    pub var: Option<(f64, f64)>,
}

impl ProximityChecks {
    pub fn parse(value: Option<&Value>, path: &str) -> Result<Self> {
        let key = format!("{path}.proximity_checks");
        let map = match value {
            None | Some(Value::Null) => return Ok(Self::default()),
            Some(Value::Map(map)) => map,
            Some(other) => {
                return Err(Error::ConfigError {
                    key,
                    message: format!("expected a mapping, got {}", other.type_name()),
                });
            }
        };

        let fail = |op: &str, message: &str| Error::ConfigError {
            key: format!("{key}.{op}"),
            message: message.to_string(),
        };
        let mut checks = Self::default();
        for (op, threshold) in map {
            match op.as_str() {
                "min" | "max" => {
                    let bound =
                        threshold.as_float().ok_or_else(|| fail(op, "threshold must be a number"))?;
                    if op == "min" { checks.min = Some(bound) } else { checks.max = Some(bound) }
                }
                "avg" | "var" => {
                    let interval = threshold
                        .as_map()
                        .and_then(|m| Some((m.get("min")?.as_float()?, m.get("max")?.as_float()?)))
                        .ok_or_else(|| fail(op, "needs a {min, max} interval of numbers"))?;
                    if op == "avg" { checks.avg = Some(interval) } else { checks.var = Some(interval) }
                }
                _ => return Err(fail(op, "unknown operator, expected min, max, avg or var")),
            }
        }
        Ok(checks)
    }

    pub fn accepts(&self, distances: &[f64]) -> bool {
        if self.min.is_some_and(|min| distances.iter().any(|d| *d <= min)) {
            return false;
        }
        if self.max.is_some_and(|max| distances.iter().any(|d| *d >= max)) {
            return false;
        }

        let n = distances.len().max(1) as f64;
        let avg = distances.iter().sum::<f64>() / n;
        let var = distances.iter().map(|d| d * d).sum::<f64>() / n - avg * avg;
        let inside = |(lo, hi): (f64, f64), x: f64| lo < x && x < hi;
        self.avg.is_none_or(|i| inside(i, avg)) && self.var.is_none_or(|i| inside(i, var))
    }
}

// ============================================================================
// Interest score
// ============================================================================

/// Scene-coverage threshold for a pose.
///
/// Every mesh in range adds 1 to the raw score, or `special_objects_weight`
/// when its `coarse_grained_class` is listed in `special_objects`. The raw
/// score is divided by the number of meshes in the scene and scaled by a
/// class-variety factor: the number of distinct classes in range over 3,
/// times `1 - n / total` for each class seen `n` times. Views dominated by
/// one class, or showing unclassified meshes only, score low.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterestScore {
    /// Poses scoring below this are rejected; 0 disables the check.
    pub min_score: f64,
    pub special_objects: Vec<String>,
    pub special_weight: f64,
}

impl InterestScore {
    pub fn from_config(settings: &Config, path: &KeyPath) -> Result<Self> {
        let special_objects: Vec<String> = settings
            .get_list_or("special_objects")?
            .iter()
            .map(|class| {
                class.as_str().map(str::to_string).ok_or_else(|| Error::ConfigError {
                    key: format!("{path}.special_objects"),
                    message: format!("expected class names, got {}", class.type_name()),
                })
            })
            .collect::<Result<_>>()?;
        Ok(Self {
            min_score: settings.get_float_or("min_interest_score", 0.0)?,
            special_objects,
            special_weight: settings
                .get_float_or("special_objects_weight", DEFAULT_SPECIAL_OBJECTS_WEIGHT)?,
        })
    }

    /// Score of the meshes closer than `range` (all of them when `None`).
    /// `distances[i]` belongs to `meshes[i]`.
    pub fn score(&self, meshes: &[Mesh], distances: &[f64], range: Option<f64>) -> f64 {
        if meshes.is_empty() {
            return 0.0;
        }
        let total = meshes.len() as f64;
        let mut raw = 0.0;
        let mut hits: IndexMap<&str, usize> = IndexMap::new();
        for (mesh, d) in meshes.iter().zip(distances) {
            if range.is_some_and(|r| *d >= r) {
                continue;
            }
            match mesh.class.as_deref() {
                Some(class) => {
                    *hits.entry(class).or_default() += 1;
                    raw += if self.special_objects.iter().any(|s| s == class) {
                        self.special_weight
                    } else {
                        1.0
                    };
                }
                None => raw += 1.0,
            }
        }
        let variety = hits
            .values()
            .fold(hits.len() as f64 / 3.0, |v, &n| v * (1.0 - n as f64 / total));
        variety * raw / total
    }

    pub fn accepts(&self, meshes: &[Mesh], distances: &[f64], range: Option<f64>) -> bool {
        self.min_score <= 0.0 || self.score(meshes, distances, range) >= self.min_score
    }
}
