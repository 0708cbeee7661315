//! `math.*` providers: pure arithmetic over resolved values.

use crate::model::Value;
use crate::Result;
use super::{Params, ProviderContext};

/// `math.Sum {elements}`: sum of numbers, or element-wise sum of equally
/// long number lists. Integer-only input stays integral.
pub fn sum(params: &Params, ctx: &mut ProviderContext<'_>) -> Result<Value> {
    let elements = ctx.list(params, "elements")?;
    let Some(first) = elements.first() else {
        return Err(ctx.error("'elements' must not be empty"));
    };

    if first.is_numeric() {
        let mut int_sum: Option<i64> = Some(0);
        let mut float_sum = 0.0;
        for (i, e) in elements.iter().enumerate() {
            match e {
                Value::Int(n) => int_sum = int_sum.and_then(|acc| acc.checked_add(*n)),
                Value::Float(_) => int_sum = None,
                other => {
                    return Err(ctx.error(format!(
                        "elements[{i}] is {}, expected a number like elements[0]",
                        other.type_name()
                    )));
                }
            }
            float_sum += e.as_float().unwrap_or_default();
        }
        return Ok(int_sum.map_or(Value::Float(float_sum), Value::Int));
    }

    let width = first.as_float_list().map(|v| v.len()).ok_or_else(|| {
        ctx.error(format!("elements[0] is {}, expected a number or number list", first.type_name()))
    })?;
    let mut acc = vec![0.0; width];
    for (i, e) in elements.iter().enumerate() {
        let v = e.as_float_list().filter(|v| v.len() == width).ok_or_else(|| {
            ctx.error(format!("elements[{i}] must be a list of {width} numbers"))
        })?;
        for (a, x) in acc.iter_mut().zip(v) {
            *a += x;
        }
    }
    Ok(Value::from(acc))
}

/// `math.Scale {value, factor}`: multiply a number or each element of a
/// number list by `factor`.
pub fn scale(params: &Params, ctx: &mut ProviderContext<'_>) -> Result<Value> {
    let value = ctx.param(params, "value")?;
    let factor = ctx.param(params, "factor")?;
    if !factor.is_numeric() {
        return Err(ctx.error(format!("'factor' must be a number, got {}", factor.type_name())));
    }

    match value {
        Value::Int(_) | Value::Float(_) => Ok(multiply(value, factor)),
        Value::List(items) if items.iter().all(Value::is_numeric) => {
            Ok(Value::List(items.iter().map(|v| multiply(v, factor)).collect()))
        }
        other => Err(ctx.error(format!(
            "'value' must be a number or number list, got {}",
            other.type_name()
        ))),
    }
}

fn multiply(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => match x.checked_mul(*y) {
            Some(p) => Value::Int(p),
            None => Value::Float(*x as f64 * *y as f64),
        },
        _ => Value::Float(a.as_float().unwrap_or_default() * b.as_float().unwrap_or_default()),
    }
}
