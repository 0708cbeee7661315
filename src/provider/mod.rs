//! # Providers
//!
//! A provider is a named function that turns resolved parameters into a
//! value: a random sample, a filtered set of entities, a computed number.
//! Documents invoke one with a mapping carrying a `provider` key:
//!
//! ```text
//! {"provider": "sampler.Uniform3d", "min": [0, 0, 0], "max": [1, 1, 1]}
//! ```
//!
//! Implementations are registered by name in a [`ProviderRegistry`] that is
//! built at startup and read-only while the pipeline runs. Host code adds
//! new kinds through [`ProviderRegistry::register`] without touching the
//! resolver.

pub mod sampler;
pub mod getter;
pub mod math;

use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;

use crate::model::*;
use crate::random::RandomSource;
use crate::registry::EntityRegistry;
use crate::{Error, Result};

/// Resolved parameters of a provider invocation (everything but `provider`).
pub type Params = ValueMap;

/// Signature every provider implementation satisfies.
pub type ProviderFn =
    Arc<dyn Fn(&Params, &mut ProviderContext<'_>) -> Result<Value> + Send + Sync>;

// ============================================================================
// Provider kinds
// ============================================================================

/// Family of a provider, taken from its name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// `sampler.*`: consumes the random source.
    Sampler,
    /// `getter.*`: queries the entity registry.
    Getter,
    /// `math.*`: pure combinators.
    Math,
    /// Anything registered under another prefix.
    Custom,
}

impl ProviderKind {
    pub fn of(name: &str) -> Self {
        match name.split_once('.').map(|(prefix, _)| prefix) {
            Some("sampler") => ProviderKind::Sampler,
            Some("getter") => ProviderKind::Getter,
            Some("math") => ProviderKind::Math,
            _ => ProviderKind::Custom,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProviderKind::Sampler => "sampler",
            ProviderKind::Getter => "getter",
            ProviderKind::Math => "math",
            ProviderKind::Custom => "custom",
        };
        f.write_str(s)
    }
}

// ============================================================================
// Invocation context
// ============================================================================

/// What a provider may touch while it runs.
pub struct ProviderContext<'a> {
    /// Read-only view of the run's entities.
    pub registry: &'a EntityRegistry,
    /// The run's single random stream.
    pub rng: &'a mut RandomSource,
    /// Fully merged config of the enclosing module, when there is one.
    pub module_config: Option<&'a ConfigMap>,
    name: &'a str,
    path: &'a KeyPath,
}

impl<'a> ProviderContext<'a> {
    pub(crate) fn new(
        name: &'a str,
        path: &'a KeyPath,
        registry: &'a EntityRegistry,
        rng: &'a mut RandomSource,
        module_config: Option<&'a ConfigMap>,
    ) -> Self {
        Self { registry, rng, module_config, name, path }
    }

    /// Name the provider was invoked under.
    pub fn name(&self) -> &str {
        self.name
    }

    pub fn path(&self) -> &KeyPath {
        self.path
    }

    /// A `ProviderError` pointing at this invocation.
    pub fn error(&self, message: impl Into<String>) -> Error {
        Error::ProviderError {
            provider: self.name.to_string(),
            path: self.path.to_string(),
            message: message.into(),
        }
    }

    // ========================================================================
    // Parameter access
    // ========================================================================

    pub fn param<'p>(&self, params: &'p Params, key: &str) -> Result<&'p Value> {
        params
            .get(key)
            .ok_or_else(|| self.error(format!("missing required parameter '{key}'")))
    }

    pub fn float(&self, params: &Params, key: &str) -> Result<f64> {
        let v = self.param(params, key)?;
        v.as_float().ok_or_else(|| self.wrong_type(key, "a number", v))
    }

    pub fn float_or(&self, params: &Params, key: &str, default: f64) -> Result<f64> {
        if params.contains_key(key) { self.float(params, key) } else { Ok(default) }
    }

    pub fn int(&self, params: &Params, key: &str) -> Result<i64> {
        let v = self.param(params, key)?;
        v.as_int().ok_or_else(|| self.wrong_type(key, "an integer", v))
    }

    pub fn int_opt(&self, params: &Params, key: &str) -> Result<Option<i64>> {
        match params.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.int(params, key).map(Some),
        }
    }

    pub fn str_or<'p>(&self, params: &'p Params, key: &str, default: &'p str) -> Result<&'p str> {
        match params.get(key) {
            None => Ok(default),
            Some(v) => v.as_str().ok_or_else(|| self.wrong_type(key, "a string", v)),
        }
    }

    pub fn vector3(&self, params: &Params, key: &str) -> Result<[f64; 3]> {
        let v = self.param(params, key)?;
        v.as_vector3().ok_or_else(|| self.wrong_type(key, "a list of 3 numbers", v))
    }

    pub fn list<'p>(&self, params: &'p Params, key: &str) -> Result<&'p [Value]> {
        let v = self.param(params, key)?;
        v.as_list().ok_or_else(|| self.wrong_type(key, "a list", v))
    }

    fn wrong_type(&self, key: &str, expected: &str, got: &Value) -> Error {
        self.error(format!("parameter '{key}' must be {expected}, got {}", got.type_name()))
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Name → implementation lookup table.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, ProviderFn>,
}

impl ProviderRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in sampler, getter and math provider.
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        reg.register("sampler.Uniform3d", sampler::uniform3d);
        reg.register("sampler.Value", sampler::value);
        reg.register("sampler.Sphere", sampler::sphere);
        reg.register("sampler.Choice", sampler::choice);
        reg.register("getter.Entity", getter::entity);
        reg.register("getter.Attribute", getter::attribute);
        reg.register("math.Sum", math::sum);
        reg.register("math.Scale", math::scale);
        reg
    }

    /// Register (or replace) a provider.
    pub fn register<F>(&mut self, name: impl Into<String>, provider: F)
    where
        F: Fn(&Params, &mut ProviderContext<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        self.providers.insert(name.into(), Arc::new(provider));
    }

    pub fn get(&self, name: &str) -> Option<&ProviderFn> {
        self.providers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry").field("providers", &self.names()).finish()
    }
}
