//! `getter.*` providers: query the entity registry.

use crate::model::{EntityId, Value, ValueMap};
use crate::registry::Conditions;
use crate::Result;
use super::{Params, ProviderContext};

/// `getter.Entity {conditions, index, random_samples}`
///
/// Returns the entities matching every condition, in registration order,
/// as a list of entity references. No match yields an empty list.
/// `index` narrows the result to one match (negative counts from the end;
/// out of range yields an empty list). `random_samples` draws that many
/// distinct matches from the random source.
pub fn entity(params: &Params, ctx: &mut ProviderContext<'_>) -> Result<Value> {
    let empty = ValueMap::new();
    let conditions = match params.get("conditions") {
        None | Some(Value::Null) => &empty,
        Some(Value::Map(map)) => map,
        Some(other) => {
            return Err(ctx.error(format!(
                "parameter 'conditions' must be a mapping, got {}",
                other.type_name()
            )));
        }
    };
    let conditions = Conditions::from_map(conditions)?;
    let index = ctx.int_opt(params, "index")?;
    let samples = ctx.int_opt(params, "random_samples")?;

    let matched: Vec<EntityId> = ctx.registry.select(&conditions).iter().map(|e| e.id).collect();
    tracing::debug!(
        conditions = conditions.len(),
        matched = matched.len(),
        "getter.Entity selection"
    );

    let picked = match (index, samples) {
        (Some(_), Some(_)) => {
            return Err(ctx.error("'index' and 'random_samples' are mutually exclusive"));
        }
        (Some(i), None) => {
            let len = matched.len() as i64;
            let i = if i < 0 { len + i } else { i };
            if (0..len).contains(&i) { vec![matched[i as usize]] } else { Vec::new() }
        }
        (None, Some(n)) => {
            if n < 0 {
                return Err(ctx.error(format!("'random_samples' must be non-negative, got {n}")));
            }
            ctx.rng
                .distinct_indices(matched.len(), n as usize)
                .into_iter()
                .map(|i| matched[i])
                .collect()
        }
        (None, None) => matched,
    };

    Ok(Value::List(picked.into_iter().map(Value::Entity).collect()))
}

/// `getter.Attribute {entities, name}`: the named attribute of each entity.
pub fn attribute(params: &Params, ctx: &mut ProviderContext<'_>) -> Result<Value> {
    let entities = ctx.list(params, "entities")?;
    let name = ctx.str_or(params, "name", "")?;
    if name.is_empty() {
        return Err(ctx.error("missing required parameter 'name'"));
    }

    let mut out = Vec::with_capacity(entities.len());
    for item in entities {
        let id = item.as_entity().ok_or_else(|| {
            ctx.error(format!("'entities' must hold entity references, got {}", item.type_name()))
        })?;
        let entity = ctx.registry.get(id)?;
        let value = entity
            .get(name)
            .ok_or_else(|| ctx.error(format!("entity {id} has no attribute '{name}'")))?;
        out.push(value.clone());
    }
    Ok(Value::List(out))
}
