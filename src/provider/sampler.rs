//! `sampler.*` providers: draw from the run's random source.
//!
//! Every draw happens in a fixed order (x, y, z for vectors), so a given
//! seed always yields the same values.

use crate::model::Value;
use crate::Result;
use super::{Params, ProviderContext};

/// `sampler.Uniform3d {min, max}`: one independent uniform draw per axis.
pub fn uniform3d(params: &Params, ctx: &mut ProviderContext<'_>) -> Result<Value> {
    let min = ctx.vector3(params, "min")?;
    let max = ctx.vector3(params, "max")?;
    for axis in 0..3 {
        if min[axis] > max[axis] {
            return Err(ctx.error(format!(
                "min[{axis}] = {} exceeds max[{axis}] = {}",
                min[axis], max[axis]
            )));
        }
    }
    let mut out = [0.0; 3];
    for axis in 0..3 {
        out[axis] = ctx.rng.uniform(min[axis], max[axis]);
    }
    Ok(Value::from(out))
}

/// `sampler.Value {type, min, max}`: a single scalar of type
/// `float` (default), `int` (inclusive bounds) or `bool` (fair coin).
pub fn value(params: &Params, ctx: &mut ProviderContext<'_>) -> Result<Value> {
    match ctx.str_or(params, "type", "float")? {
        "float" => {
            let (min, max) = (ctx.float(params, "min")?, ctx.float(params, "max")?);
            if min > max {
                return Err(ctx.error(format!("min = {min} exceeds max = {max}")));
            }
            Ok(Value::Float(ctx.rng.uniform(min, max)))
        }
        "int" => {
            let (min, max) = (ctx.int(params, "min")?, ctx.int(params, "max")?);
            if min > max {
                return Err(ctx.error(format!("min = {min} exceeds max = {max}")));
            }
            Ok(Value::Int(ctx.rng.uniform_int(min, max)))
        }
        "bool" => Ok(Value::Bool(ctx.rng.coin())),
        other => Err(ctx.error(format!(
            "unknown type '{other}', expected 'float', 'int' or 'bool'"
        ))),
    }
}

/// `sampler.Sphere {center, radius, mode}`: a point on the sphere
/// surface (`SURFACE`) or uniformly inside the ball (`INTERIOR`, default).
pub fn sphere(params: &Params, ctx: &mut ProviderContext<'_>) -> Result<Value> {
    let center = ctx.vector3(params, "center")?;
    let radius = ctx.float(params, "radius")?;
    if radius < 0.0 {
        return Err(ctx.error(format!("radius must be non-negative, got {radius}")));
    }
    let interior = match ctx.str_or(params, "mode", "INTERIOR")? {
        "SURFACE" => false,
        "INTERIOR" => true,
        other => {
            return Err(ctx.error(format!(
                "unknown mode '{other}', expected 'SURFACE' or 'INTERIOR'"
            )));
        }
    };
    let dir = ctx.rng.unit_vector();
    let distance = if interior { radius * ctx.rng.next_f64().cbrt() } else { radius };
    Ok(Value::from(offset(center, dir, distance)))
}

fn offset(center: [f64; 3], dir: [f64; 3], distance: f64) -> [f64; 3] {
    [
        center[0] + dir[0] * distance,
        center[1] + dir[1] * distance,
        center[2] + dir[2] * distance,
    ]
}

/// `sampler.Choice {elements}`: one element picked uniformly.
pub fn choice(params: &Params, ctx: &mut ProviderContext<'_>) -> Result<Value> {
    let elements = ctx.list(params, "elements")?;
    if elements.is_empty() {
        return Err(ctx.error("'elements' must not be empty"));
    }
    let i = ctx.rng.index(elements.len());
    Ok(elements[i].clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{KeyPath, attributes};
    use crate::random::RandomSource;
    use crate::registry::EntityRegistry;

    fn call(
        f: fn(&Params, &mut ProviderContext<'_>) -> Result<Value>,
        params: Params,
        rng: &mut RandomSource,
    ) -> Result<Value> {
        let registry = EntityRegistry::new();
        let path = KeyPath::root();
        let mut ctx = ProviderContext::new("test", &path, &registry, rng, None);
        f(&params, &mut ctx)
    }

    #[test]
    fn test_uniform3d_within_bounds() {
        let mut rng = RandomSource::seeded(42);
        let params = attributes([("min", vec![0, 1, 2]), ("max", vec![1, 2, 3])]);
        for _ in 0..50 {
            let v = call(uniform3d, params.clone(), &mut rng).unwrap().as_vector3().unwrap();
            for axis in 0..3 {
                let lo = axis as f64;
                assert!((lo..=lo + 1.0).contains(&v[axis]), "{v:?}");
            }
        }
        assert_eq!(rng.draws(), 150);
    }

    #[test]
    fn test_uniform3d_reproducible() {
        let params = attributes([("min", vec![0, 1, 2]), ("max", vec![1, 2, 3])]);
        let a = call(uniform3d, params.clone(), &mut RandomSource::seeded(9)).unwrap();
        let b = call(uniform3d, params, &mut RandomSource::seeded(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_uniform3d_rejects_inverted_bounds() {
        let params = attributes([("min", vec![0, 5, 0]), ("max", vec![1, 2, 3])]);
        let err = call(uniform3d, params, &mut RandomSource::seeded(0)).unwrap_err();
        assert!(err.to_string().contains("min[1]"), "{err}");
    }

    #[test]
    fn test_uniform3d_requires_three_components() {
        let params = attributes([("min", vec![0, 0]), ("max", vec![1, 1])]);
        assert!(call(uniform3d, params, &mut RandomSource::seeded(0)).is_err());
    }

    #[test]
    fn test_value_types() {
        let mut rng = RandomSource::seeded(5);
        let int = call(
            value,
            attributes([("type", Value::from("int")), ("min", 3.into()), ("max", 4.into())]),
            &mut rng,
        ).unwrap();
        assert!(matches!(int, Value::Int(3 | 4)));

        let float = call(value, attributes([("min", 0.5), ("max", 0.75)]), &mut rng).unwrap();
        assert!((0.5..=0.75).contains(&float.as_float().unwrap()));

        let coin = call(value, attributes([("type", "bool")]), &mut rng).unwrap();
        assert!(coin.as_bool().is_some());

        assert!(call(value, attributes([("type", "str")]), &mut rng).is_err());
    }

    #[test]
    fn test_sphere_surface_distance() {
        let mut rng = RandomSource::seeded(8);
        let params = attributes([
            ("center", Value::from(vec![1, 1, 1])),
            ("radius", Value::from(2.0)),
            ("mode", Value::from("SURFACE")),
        ]);
        let p = call(sphere, params, &mut rng).unwrap().as_vector3().unwrap();
        let d = ((p[0] - 1.0).powi(2) + (p[1] - 1.0).powi(2) + (p[2] - 1.0).powi(2)).sqrt();
        assert!((d - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_sphere_interior_inside_ball() {
        let mut rng = RandomSource::seeded(8);
        let params = attributes([("center", Value::from(vec![0, 0, 0])), ("radius", Value::from(1.5))]);
        for _ in 0..50 {
            let p = call(sphere, params.clone(), &mut rng).unwrap().as_vector3().unwrap();
            assert!((p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt() <= 1.5 + 1e-9);
        }
    }

    #[test]
    fn test_choice() {
        let mut rng = RandomSource::seeded(2);
        let params = attributes([("elements", vec!["a", "b", "c"])]);
        let picked = call(choice, params, &mut rng).unwrap();
        assert!(["a", "b", "c"].contains(&picked.as_str().unwrap()));

        let empty = attributes([("elements", Vec::<Value>::new())]);
        assert!(call(choice, empty, &mut rng).is_err());
    }
}
