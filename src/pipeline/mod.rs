//! # Pipeline Executor
//!
//! Turns a parsed, placeholder-free document into a [`PipelineSpec`] and
//! runs it:
//!
//! 1. every module name is checked against the [`ModuleRegistry`] before
//!    anything runs;
//! 2. for each module, in document order: `global.all`, then
//!    `global.<category>`, then the module's own config are merged;
//! 3. the merged tree is resolved (deferred keys skipped);
//! 4. the module runs against the run-scoped entity registry.
//!
//! Any failure in steps 3–4 aborts the run, wrapped in
//! [`Error::ModuleError`] with the module's index and name.

pub mod module;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{merge_under, Config};
use crate::model::{ConfigMap, ConfigNode, KeyPath};
use crate::provider::ProviderRegistry;
use crate::random::RandomSource;
use crate::registry::EntityRegistry;
use crate::resolve::{self, ResolutionContext};
use crate::{Error, Result};

pub use module::{Module, ModuleContext, ModuleRegistry};

/// The only accepted document `version`.
pub const CONFIG_VERSION: i64 = 3;

/// `global` sub-key merged under every module.
pub const GLOBAL_ALL: &str = "all";

const TOP_LEVEL_KEYS: &[&str] = &["version", "setup", "global", "modules"];

// ============================================================================
// PipelineSpec
// ============================================================================

/// One entry of the `modules` list.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleInvocation {
    pub name: String,
    pub config: ConfigMap,
}

impl ModuleInvocation {
    /// Name prefix before the first `.`, e.g. `camera` for
    /// `camera.CameraSampler`.
    pub fn category(&self) -> &str {
        self.name.split_once('.').map_or(self.name.as_str(), |(category, _)| category)
    }
}

/// A validated document: immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSpec {
    pub version: i64,
    /// Host bootstrap parameters, kept verbatim.
    pub setup: ConfigNode,
    pub global_all: ConfigMap,
    pub global_by_category: IndexMap<String, ConfigMap>,
    pub modules: Vec<ModuleInvocation>,
}

impl PipelineSpec {
    pub fn from_document(doc: &ConfigNode) -> Result<Self> {
        let top = doc.as_map().ok_or_else(|| structure("<root>", "document must be a mapping"))?;

        for key in top.keys().filter(|k| !TOP_LEVEL_KEYS.contains(&k.as_str())) {
            warn!(key = %key, "ignoring unknown top-level key");
        }

        let version = top
            .get("version")
            .ok_or_else(|| structure("version", "missing required key"))?
            .as_int()
            .ok_or_else(|| structure("version", "must be an integer"))?;
        if version != CONFIG_VERSION {
            return Err(structure(
                "version",
                format!("unsupported version {version}, expected {CONFIG_VERSION}"),
            ));
        }

        let setup = top.get("setup").cloned().unwrap_or(ConfigNode::Null);

        let mut global_all = ConfigMap::new();
        let mut global_by_category = IndexMap::new();
        if let Some(global) = top.get("global") {
            let global = global
                .as_plain_map()
                .ok_or_else(|| structure("global", "must be a mapping"))?;
            for (scope, node) in global {
                let map = node
                    .as_plain_map()
                    .ok_or_else(|| structure(&format!("global.{scope}"), "must be a mapping"))?
                    .clone();
                if scope == GLOBAL_ALL {
                    global_all = map;
                } else {
                    global_by_category.insert(scope.clone(), map);
                }
            }
        }

        let list = top
            .get("modules")
            .ok_or_else(|| structure("modules", "missing required key"))?
            .as_list()
            .ok_or_else(|| structure("modules", "must be a list"))?;
        let modules = list
            .iter()
            .enumerate()
            .map(|(i, entry)| parse_invocation(i, entry))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { version, setup, global_all, global_by_category, modules })
    }

    /// `global.all` < `global.<category>` < module config.
    pub fn merged_config(&self, index: usize) -> Option<ConfigMap> {
        let invocation = self.modules.get(index)?;
        let mut merged = self.global_all.clone();
        if let Some(category) = self.global_by_category.get(invocation.category()) {
            merged = merge_under(&merged, category);
        }
        Some(merge_under(&merged, &invocation.config))
    }

    /// Fails with `UnknownModule` for the first name that has no
    /// registered implementation.
    pub fn validate(&self, modules: &ModuleRegistry) -> Result<()> {
        match self.modules.iter().enumerate().find(|(_, m)| !modules.contains(&m.name)) {
            Some((index, m)) => Err(Error::UnknownModule { name: m.name.clone(), index }),
            None => Ok(()),
        }
    }
}

fn parse_invocation(index: usize, entry: &ConfigNode) -> Result<ModuleInvocation> {
    let key = format!("modules[{index}]");
    let map = entry.as_map().ok_or_else(|| structure(&key, "must be a mapping"))?;
    let name = map
        .get("module")
        .and_then(ConfigNode::as_str)
        .ok_or_else(|| structure(&format!("{key}.module"), "missing module name"))?;
    let config = match map.get("config") {
        None | Some(ConfigNode::Null) => ConfigMap::new(),
        Some(node) => node
            .as_plain_map()
            .ok_or_else(|| structure(&format!("{key}.config"), "must be a mapping"))?
            .clone(),
    };
    Ok(ModuleInvocation { name: name.to_string(), config })
}

fn structure(key: &str, message: impl Into<String>) -> Error {
    Error::ConfigError { key: key.to_string(), message: message.into() }
}

// ============================================================================
// Run options & report
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Fixed seed for a reproducible run; `None` draws a fresh one.
    pub seed: Option<u64>,
}

impl RunOptions {
    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleReport {
    pub index: usize,
    pub name: String,
    pub elapsed_ms: i64,
    /// Registry size after the module returned.
    pub entity_count: usize,
}

/// Outcome of a completed run. Owns the run's entity registry.
#[derive(Debug)]
pub struct RunReport {
    pub seed: u64,
    pub started_at: DateTime<Utc>,
    pub modules: Vec<ModuleReport>,
    pub registry: EntityRegistry,
}

// ============================================================================
// Executor
// ============================================================================

/// Run every module of `spec` in order.
pub fn execute(
    spec: &PipelineSpec,
    providers: &ProviderRegistry,
    modules: &ModuleRegistry,
    options: RunOptions,
) -> Result<RunReport> {
    spec.validate(modules)?;

    let mut rng = match options.seed {
        Some(seed) => RandomSource::seeded(seed),
        None => RandomSource::from_entropy(),
    };
    let started_at = Utc::now();
    info!(seed = rng.seed(), modules = spec.modules.len(), "pipeline started");

    let mut registry = EntityRegistry::new();
    let mut reports = Vec::with_capacity(spec.modules.len());

    for (index, invocation) in spec.modules.iter().enumerate() {
        let name = invocation.name.as_str();
        let module = modules
            .get(name)
            .ok_or_else(|| Error::UnknownModule { name: name.to_string(), index })?;
        let merged = spec.merged_config(index).unwrap_or_default();

        info!(index, module = name, "running module");
        let begin = Utc::now();

        run_module(index, invocation, module.as_ref(), &merged, providers, &mut registry, &mut rng)
            .map_err(|source| Error::ModuleError {
                index,
                module: name.to_string(),
                source: Box::new(source),
            })?;

        let elapsed_ms = (Utc::now() - begin).num_milliseconds();
        info!(index, module = name, elapsed_ms, entities = registry.len(), "module finished");
        reports.push(ModuleReport {
            index,
            name: name.to_string(),
            elapsed_ms,
            entity_count: registry.len(),
        });
    }

    info!(seed = rng.seed(), entities = registry.len(), "pipeline finished");
    Ok(RunReport { seed: rng.seed(), started_at, modules: reports, registry })
}

fn run_module(
    index: usize,
    invocation: &ModuleInvocation,
    module: &dyn Module,
    merged: &ConfigMap,
    providers: &ProviderRegistry,
    registry: &mut EntityRegistry,
    rng: &mut RandomSource,
) -> Result<()> {
    let skip: Vec<&str> = merged.keys().map(String::as_str).filter(|k| module.defers(k)).collect();
    let mut path = KeyPath::root().key("modules").index(index).key("config");
    let values = {
        let mut rctx = ResolutionContext::new(providers, registry, rng).with_module_config(merged);
        resolve::resolve_map_at(merged, &skip, &mut path, &mut rctx)?
    };
    let mut ctx = ModuleContext::new(
        index,
        &invocation.name,
        merged,
        &invocation.config,
        providers,
        registry,
        rng,
    );
    module.run(&Config::new(values), &mut ctx)
}
