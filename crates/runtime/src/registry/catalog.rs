//! Startup loading of action modules.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use interaction_core::{ActionManifest, ManifestError};
use serde::Serialize;
use thiserror::Error;

use super::{ActionModule, RegistryError};

/// Constructor for a module known at compile time.
pub type ModuleFactory = fn() -> Arc<dyn ActionModule>;

type Loader = Box<dyn FnOnce() -> Result<Arc<dyn ActionModule>, LoadError> + Send>;

/// Manifest-level overrides applied on top of a module's own metadata.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ModuleOverrides {
    pub cooldown_seconds: Option<f64>,
    pub requires_alive: Option<bool>,
}

/// A module waiting to be loaded into the registry.
///
/// The loader runs inside the registry's isolation boundary, so a failing or
/// panicking constructor only costs its own entry.
pub struct ModuleCandidate {
    source: String,
    loader: Loader,
    overrides: ModuleOverrides,
}

impl ModuleCandidate {
    pub fn new(
        source: impl Into<String>,
        loader: impl FnOnce() -> Result<Arc<dyn ActionModule>, LoadError> + Send + 'static,
    ) -> Self {
        Self {
            source: source.into(),
            loader: Box::new(loader),
            overrides: ModuleOverrides::default(),
        }
    }

    /// Candidate wrapping an already constructed module.
    pub fn from_module(source: impl Into<String>, module: Arc<dyn ActionModule>) -> Self {
        Self::new(source, move || Ok(module))
    }

    /// Candidate that fails at load time with `error`.
    pub fn failed(source: impl Into<String>, error: LoadError) -> Self {
        Self::new(source, move || Err(error))
    }

    pub fn with_overrides(mut self, overrides: ModuleOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub(super) fn into_parts(self) -> (String, Loader, ModuleOverrides) {
        (self.source, self.loader, self.overrides)
    }
}

impl fmt::Debug for ModuleCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleCandidate")
            .field("source", &self.source)
            .field("overrides", &self.overrides)
            .finish_non_exhaustive()
    }
}

/// Why a module was skipped during loading.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    #[error("no module named {0:?} in the catalog")]
    UnknownModule(String),

    #[error(transparent)]
    InvalidEntry(#[from] ManifestError),

    #[error("module failed to load: {0}")]
    Failed(String),

    #[error("module panicked while loading: {0}")]
    Panicked(String),

    #[error("module reported an empty action name")]
    EmptyName,

    #[error(transparent)]
    Rejected(#[from] RegistryError),
}

/// One skipped module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadFailure {
    pub source: String,
    pub reason: String,
}

/// Outcome of a bulk load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub loaded: usize,
    pub failed: usize,
    pub failures: Vec<LoadFailure>,
}

impl LoadSummary {
    pub(super) fn record_failure(&mut self, source: String, error: &LoadError) {
        self.failed += 1;
        self.failures.push(LoadFailure {
            source,
            reason: error.to_string(),
        });
    }
}

/// Compile-time table of action modules, keyed by manifest name.
#[derive(Clone, Default)]
pub struct ModuleCatalog {
    factories: BTreeMap<String, ModuleFactory>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, factory: ModuleFactory) -> &mut Self {
        self.factories.insert(name.into(), factory);
        self
    }

    pub fn with(mut self, name: impl Into<String>, factory: ModuleFactory) -> Self {
        self.register(name, factory);
        self
    }

    /// Resolves every enabled manifest entry into a load candidate.
    ///
    /// Invalid or unknown entries still produce a candidate, one that fails
    /// when loaded, so they show up in the [`LoadSummary`].
    pub fn candidates(&self, manifest: &ActionManifest) -> Vec<ModuleCandidate> {
        manifest
            .enabled()
            .map(|entry| {
                let source = format!("manifest:{}", entry.name);
                if let Err(err) = entry.validate() {
                    return ModuleCandidate::failed(source, err.into());
                }
                let Some(factory) = self.factories.get(entry.name.trim()).copied() else {
                    return ModuleCandidate::failed(
                        source,
                        LoadError::UnknownModule(entry.name.clone()),
                    );
                };
                ModuleCandidate::new(source, move || Ok(factory())).with_overrides(
                    ModuleOverrides {
                        cooldown_seconds: entry.cooldown_seconds,
                        requires_alive: entry.requires_alive,
                    },
                )
            })
            .collect()
    }
}

impl fmt::Debug for ModuleCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}
