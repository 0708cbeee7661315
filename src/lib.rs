//! # scenepipe: declarative procedural-scene pipelines
//!
//! Runs pipeline documents: an ordered list of named modules (load
//! objects, place lights, manipulate entities, sample cameras, write
//! output), each configured by a tree that mixes literals with nested
//! *provider* expressions resolved at execution time.
//!
//! ## Design Principles
//!
//! 1. **Pure front end**: text → [`ConfigNode`] → placeholder pass → [`PipelineSpec`]
//!    are pure functions; nothing runs until the spec is complete
//! 2. **Explicit context**: resolution threads registry, random source and
//!    merged config through a context object, never through globals
//! 3. **Run-scoped state**: each run owns a fresh [`EntityRegistry`] and a
//!    single seeded [`RandomSource`]
//! 4. **Open registration**: providers and modules are looked up by name in
//!    tables filled before the run
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scenepipe::{Pipeline, Placeholders, RunOptions};
//!
//! # fn example() -> scenepipe::Result<()> {
//! let pipeline = Pipeline::new();
//! let text = std::fs::read_to_string("config.json")?;
//! let spec = pipeline.load(&text, &Placeholders::from_process(vec!["/out".into()]))?;
//! let report = pipeline.run(&spec, RunOptions::seeded(42))?;
//!
//! for entity in report.registry.all() {
//!     println!("{} {:?}", entity.id, entity.name());
//! }
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod document;
pub mod placeholder;
pub mod registry;
pub mod random;
pub mod provider;
pub mod resolve;
pub mod config;
pub mod pipeline;
pub mod modules;

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{
    ConfigNode, ConfigMap, Value, ValueMap, FromValue, Entity, EntityId, AttributeMap, KeyPath,
};

// ============================================================================
// Re-exports: Engine
// ============================================================================

pub use placeholder::{Placeholders, substitute_placeholders};
pub use registry::{Conditions, EntityRegistry};
pub use random::RandomSource;
pub use provider::{Params, ProviderContext, ProviderKind, ProviderRegistry};
pub use resolve::{resolve, ResolutionContext};
pub use config::{Config, ItemCollection};
pub use pipeline::{
    Module, ModuleContext, ModuleInvocation, ModuleRegistry, ModuleReport, PipelineSpec,
    RunOptions, RunReport, CONFIG_VERSION,
};

// ============================================================================
// Top-level Pipeline handle
// ============================================================================

/// The primary entry point: provider and module tables plus the
/// parse → substitute → build → execute sequence.
#[derive(Debug, Clone)]
pub struct Pipeline {
    providers: ProviderRegistry,
    modules: ModuleRegistry,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// Every built-in provider and module registered.
    pub fn new() -> Self {
        Self {
            providers: ProviderRegistry::with_builtins(),
            modules: ModuleRegistry::with_builtins(),
        }
    }

    /// Nothing registered.
    pub fn empty() -> Self {
        Self { providers: ProviderRegistry::new(), modules: ModuleRegistry::new() }
    }

    pub fn register_provider<F>(&mut self, name: impl Into<String>, provider: F) -> &mut Self
    where
        F: Fn(&Params, &mut ProviderContext<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        self.providers.register(name, provider);
        self
    }

    pub fn register_module<M>(&mut self, name: impl Into<String>, module: M) -> &mut Self
    where
        M: Module + 'static,
    {
        self.modules.register(name, module);
        self
    }

    pub fn register_module_fn<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&Config, &mut ModuleContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.modules.register_fn(name, f);
        self
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    pub fn modules(&self) -> &ModuleRegistry {
        &self.modules
    }

    /// Parse a document, substitute placeholders and build the spec.
    /// Fails before any module could run.
    pub fn load(&self, text: &str, placeholders: &Placeholders) -> Result<PipelineSpec> {
        // Phase 1: Parse
        let doc = document::parse(text)?;

        // Phase 2: Substitute
        let doc = placeholders.substitute(&doc)?;

        // Phase 3: Build
        PipelineSpec::from_document(&doc)
    }

    /// [`load`](Self::load) plus module-name validation, without running.
    pub fn check(&self, text: &str, placeholders: &Placeholders) -> Result<PipelineSpec> {
        let spec = self.load(text, placeholders)?;
        spec.validate(&self.modules)?;
        Ok(spec)
    }

    /// Execute a built spec.
    pub fn run(&self, spec: &PipelineSpec, options: RunOptions) -> Result<RunReport> {
        pipeline::execute(spec, &self.providers, &self.modules, options)
    }

    /// Load and run a document in one go.
    pub fn run_document(
        &self,
        text: &str,
        placeholders: &Placeholders,
        options: RunOptions,
    ) -> Result<RunReport> {
        let spec = self.load(text, placeholders)?;
        self.run(&spec, options)
    }

    /// Load and run with positional arguments only (no environment).
    pub fn run_str(&self, text: &str, args: &[&str], seed: Option<u64>) -> Result<RunReport> {
        let placeholders =
            Placeholders::new(args.iter().map(|a| a.to_string()).collect(), Default::default());
        self.run_document(text, &placeholders, RunOptions { seed })
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Parse error at line {line}, column {column}: {message}")]
    ParseError { line: usize, column: usize, message: String },

    #[error("Placeholder error at {path}: {message}")]
    PlaceholderError { path: String, message: String },

    #[error("Unknown provider '{name}' at {path}")]
    UnknownProvider { name: String, path: String },

    #[error("Unknown module '{name}' at modules[{index}]")]
    UnknownModule { name: String, index: usize },

    #[error("Provider '{provider}' failed at {path}: {message}")]
    ProviderError { provider: String, path: String, message: String },

    #[error("Config error at '{key}': {message}")]
    ConfigError { key: String, message: String },

    #[error("Type error: expected {expected}, got {got}")]
    TypeError { expected: String, got: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Module '{module}' (modules[{index}]) failed: {source}")]
    ModuleError {
        index: usize,
        module: String,
        #[source]
        source: Box<Error>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
