//! # Provider Resolution Engine
//!
//! A tree-walking evaluator that turns a [`ConfigNode`] into a [`Value`]:
//!
//! 1. literals pass through unchanged;
//! 2. sequences resolve element by element, in order;
//! 3. mappings without a `provider` key resolve value by value;
//! 4. mappings with a `provider` key are provider expressions: every
//!    parameter is resolved first (rules 1–4, so providers nest to any
//!    depth), then the named provider is invoked with the results.
//!
//! The walk is depth-first in document key order. Samplers consume the
//! random source in exactly that order, which is what makes two runs with
//! the same seed and document produce identical values.

use tracing::debug;

use crate::model::*;
use crate::provider::{Params, ProviderContext, ProviderKind, ProviderRegistry};
use crate::random::RandomSource;
use crate::registry::EntityRegistry;
use crate::{Error, Result};

/// Everything resolution needs, threaded explicitly through the walk.
pub struct ResolutionContext<'a> {
    pub providers: &'a ProviderRegistry,
    pub registry: &'a EntityRegistry,
    pub rng: &'a mut RandomSource,
    /// Fully merged config of the module being resolved, for providers
    /// that look at sibling keys.
    pub module_config: Option<&'a ConfigMap>,
}

impl<'a> ResolutionContext<'a> {
    pub fn new(
        providers: &'a ProviderRegistry,
        registry: &'a EntityRegistry,
        rng: &'a mut RandomSource,
    ) -> Self {
        Self { providers, registry, rng, module_config: None }
    }

    pub fn with_module_config(mut self, config: &'a ConfigMap) -> Self {
        self.module_config = Some(config);
        self
    }
}

/// Resolve a node, reporting errors relative to the document root.
pub fn resolve(node: &ConfigNode, ctx: &mut ResolutionContext<'_>) -> Result<Value> {
    let mut path = KeyPath::root();
    resolve_at(node, &mut path, ctx)
}

/// Resolve a node located at `path`.
pub fn resolve_at(
    node: &ConfigNode,
    path: &mut KeyPath,
    ctx: &mut ResolutionContext<'_>,
) -> Result<Value> {
    match node {
        ConfigNode::List(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                path.push_index(i);
                let value = resolve_at(item, path, ctx);
                path.pop();
                out.push(value?);
            }
            Ok(Value::List(out))
        }
        ConfigNode::Map(map) => match node.provider_name() {
            Some(name) => invoke(name, map, path, ctx),
            None => Ok(Value::Map(resolve_map_at(map, &[], path, ctx)?)),
        },
        literal => Ok(Value::from(literal)),
    }
}

/// Resolve every value of a plain mapping, skipping `skip` keys.
pub fn resolve_map_at(
    map: &ConfigMap,
    skip: &[&str],
    path: &mut KeyPath,
    ctx: &mut ResolutionContext<'_>,
) -> Result<ValueMap> {
    let mut out = ValueMap::with_capacity(map.len());
    for (key, value) in map {
        if skip.contains(&key.as_str()) {
            continue;
        }
        path.push_key(key.as_str());
        let resolved = resolve_at(value, path, ctx);
        path.pop();
        out.insert(key.clone(), resolved?);
    }
    Ok(out)
}

fn invoke(
    name: &str,
    expr: &ConfigMap,
    path: &mut KeyPath,
    ctx: &mut ResolutionContext<'_>,
) -> Result<Value> {
    let provider = ctx
        .providers
        .get(name)
        .cloned()
        .ok_or_else(|| Error::UnknownProvider {
            name: name.to_string(),
            path: path.to_string(),
        })?;

    let params: Params = resolve_map_at(expr, &[PROVIDER_KEY], path, ctx)?;

    let draws_before = ctx.rng.draws();
    let mut pctx = ProviderContext::new(
        name,
        path,
        ctx.registry,
        &mut *ctx.rng,
        ctx.module_config,
    );
    let value = (*provider)(&params, &mut pctx)?;
    debug!(
        provider = name,
        kind = %ProviderKind::of(name),
        path = %path,
        draws = ctx.rng.draws() - draws_before,
        "resolved provider"
    );
    Ok(value)
}
