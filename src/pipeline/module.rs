//! The module contract and the name → implementation table.

use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;

use crate::config::Config;
use crate::model::{ConfigMap, ConfigNode, KeyPath, Value, ValueMap};
use crate::provider::ProviderRegistry;
use crate::random::RandomSource;
use crate::registry::EntityRegistry;
use crate::resolve::{self, ResolutionContext};
use crate::Result;

// ============================================================================
// Module trait
// ============================================================================

/// One pipeline stage.
///
/// `run` receives the module's merged and resolved config. It may read and
/// write the entity registry through `ctx`; external side effects happen
/// at most once per listed occurrence.
pub trait Module: Send + Sync {
    fn run(&self, config: &Config, ctx: &mut ModuleContext<'_>) -> Result<()>;

    /// Keys the executor leaves unresolved. The module evaluates them
    /// itself via [`ModuleContext::resolve_key`], typically once per
    /// entity or pose so samplers draw fresh values each time.
    fn deferred_keys(&self) -> &[&'static str] {
        &[]
    }

    /// Whether the executor skips `key`. Override for open-ended key sets.
    fn defers(&self, key: &str) -> bool {
        self.deferred_keys().contains(&key)
    }
}

impl<F> Module for F
where
    F: Fn(&Config, &mut ModuleContext<'_>) -> Result<()> + Send + Sync,
{
    fn run(&self, config: &Config, ctx: &mut ModuleContext<'_>) -> Result<()> {
        self(config, ctx)
    }
}

// ============================================================================
// ModuleContext
// ============================================================================

/// What a running module can reach: the registry, the random stream,
/// its raw merged config and the resolver.
pub struct ModuleContext<'a> {
    index: usize,
    name: &'a str,
    raw: &'a ConfigMap,
    local: &'a ConfigMap,
    providers: &'a ProviderRegistry,
    registry: &'a mut EntityRegistry,
    rng: &'a mut RandomSource,
}

impl<'a> ModuleContext<'a> {
    pub(crate) fn new(
        index: usize,
        name: &'a str,
        raw: &'a ConfigMap,
        local: &'a ConfigMap,
        providers: &'a ProviderRegistry,
        registry: &'a mut EntityRegistry,
        rng: &'a mut RandomSource,
    ) -> Self {
        Self { index, name, raw, local, providers, registry, rng }
    }

    /// 0-based position in the pipeline.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        self.name
    }

    /// Merged config before resolution, deferred keys included.
    pub fn raw(&self) -> &'a ConfigMap {
        self.raw
    }

    /// The module's own `config` mapping, without global layers.
    pub fn local(&self) -> &'a ConfigMap {
        self.local
    }

    pub fn registry(&self) -> &EntityRegistry {
        &*self.registry
    }

    pub fn registry_mut(&mut self) -> &mut EntityRegistry {
        &mut *self.registry
    }

    pub fn rng(&mut self) -> &mut RandomSource {
        &mut *self.rng
    }

    /// Document path of this module's config, e.g. `modules[2].config`.
    pub fn config_path(&self) -> KeyPath {
        KeyPath::root().key("modules").index(self.index).key("config")
    }

    /// Resolve a node against the current registry state. `path` is used
    /// in error messages only.
    pub fn resolve(&mut self, node: &ConfigNode, path: &KeyPath) -> Result<Value> {
        let mut path = path.clone();
        let mut rctx = ResolutionContext::new(self.providers, &*self.registry, &mut *self.rng)
            .with_module_config(self.raw);
        resolve::resolve_at(node, &mut path, &mut rctx)
    }

    /// Resolve one key of the raw config; `None` when the key is absent.
    pub fn resolve_key(&mut self, key: &str) -> Result<Option<Value>> {
        let raw = self.raw;
        match raw.get(key) {
            Some(node) => {
                let path = self.config_path().key(key);
                self.resolve(node, &path).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Resolve every value of a raw mapping, e.g. one merged pose spec.
    pub fn resolve_map(&mut self, map: &ConfigMap, path: &KeyPath) -> Result<ValueMap> {
        let mut path = path.clone();
        let mut rctx = ResolutionContext::new(self.providers, &*self.registry, &mut *self.rng)
            .with_module_config(self.raw);
        resolve::resolve_map_at(map, &[], &mut path, &mut rctx)
    }
}

// ============================================================================
// ModuleRegistry
// ============================================================================

/// Name → module table, filled before a run and read-only during it.
#[derive(Clone, Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, Arc<dyn Module>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in stage.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::modules::register_builtins(&mut registry);
        registry
    }

    /// Add or replace a module.
    pub fn register<M>(&mut self, name: impl Into<String>, module: M)
    where
        M: Module + 'static,
    {
        self.modules.insert(name.into(), Arc::new(module));
    }

    /// Add or replace a module given as a closure.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&Config, &mut ModuleContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.register(name, f);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Module>> {
        self.modules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRegistry").field("modules", &self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attributes;

    #[test]
    fn test_closures_are_modules() {
        let mut modules = ModuleRegistry::new();
        modules.register_fn("test.Noop", |_, _| Ok(()));
        assert!(modules.contains("test.Noop"));
        assert!(modules.get("test.Missing").is_none());
        assert_eq!(modules.get("test.Noop").unwrap().deferred_keys().len(), 0);
    }

    #[test]
    fn test_builtins_registered() {
        let modules = ModuleRegistry::with_builtins();
        assert_eq!(
            modules.names(),
            vec![
                "camera.CameraSampler",
                "lighting.LightLoader",
                "loader.EntityLoader",
                "manipulators.EntityManipulator",
                "writer.EntityWriter",
            ]
        );
    }

    #[test]
    fn test_context_resolves_against_live_registry() {
        let providers = ProviderRegistry::with_builtins();
        let mut registry = EntityRegistry::new();
        let mut rng = RandomSource::seeded(1);
        let raw = crate::document::parse(
            "{'sel': {'provider': 'getter.Entity', 'conditions': {'name': 'Cube'}}}",
        )
        .unwrap()
        .as_map()
        .unwrap()
        .clone();

        let mut ctx = ModuleContext::new(0, "test", &raw, &raw, &providers, &mut registry, &mut rng);
        assert_eq!(ctx.resolve_key("sel").unwrap(), Some(Value::List(vec![])));

        let id = ctx.registry_mut().register(attributes([("name", "Cube")])).unwrap();
        assert_eq!(ctx.resolve_key("sel").unwrap(), Some(Value::List(vec![Value::Entity(id)])));
        assert_eq!(ctx.resolve_key("missing").unwrap(), None);
    }
}
