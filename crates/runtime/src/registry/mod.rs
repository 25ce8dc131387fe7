//! Action registry: name → handler metadata.
//!
//! The registry is the only place handler code runs. Every invocation is
//! isolated so an erroring or panicking handler becomes an ordinary
//! [`HandlerFailure`] value instead of unwinding into the dispatcher.
//!
//! # Population
//!
//! - [`ActionRegistry::register`] stores one record at runtime
//! - [`ActionRegistry::load_from`] bulk-loads [`ModuleCandidate`]s, usually
//!   produced by a [`ModuleCatalog`] from the startup manifest
//!
//! Re-registering a name replaces the whole record; nothing is merged.

mod catalog;
mod module;

pub use catalog::{
    LoadError, LoadFailure, LoadSummary, ModuleCandidate, ModuleCatalog, ModuleFactory,
    ModuleOverrides,
};
pub use module::{ActionHandler, ActionModule, HandlerError, PermissionHook};

use std::any::Any;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use interaction_core::{ActorSnapshot, EntityId};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use module::{ModuleExecute, ModulePermission};

/// Label recorded for actions registered directly through [`ActionRegistry::register`].
pub const RUNTIME_SOURCE: &str = "runtime";

/// Registration payload. Everything except the execute handler is optional.
#[derive(Clone, Default)]
pub struct ActionData {
    execute: Option<Arc<dyn ActionHandler>>,
    validate_permission: Option<Arc<dyn PermissionHook>>,
    cooldown_seconds: Option<f64>,
    requires_alive: Option<bool>,
    source: Option<String>,
}

impl ActionData {
    pub fn new(execute: impl ActionHandler + 'static) -> Self {
        Self {
            execute: Some(Arc::new(execute)),
            ..Self::default()
        }
    }

    /// Payload with no execute handler; registering it always fails.
    pub fn without_handler() -> Self {
        Self::default()
    }

    /// Builds the payload for a module, wiring its optional metadata.
    pub fn from_module(module: Arc<dyn ActionModule>) -> Self {
        let validate_permission = module
            .has_permission_hook()
            .then(|| Arc::new(ModulePermission(Arc::clone(&module))) as Arc<dyn PermissionHook>);
        Self {
            cooldown_seconds: module.cooldown_seconds(),
            requires_alive: module.requires_alive(),
            validate_permission,
            execute: Some(Arc::new(ModuleExecute(module))),
            source: None,
        }
    }

    pub fn with_permission(mut self, hook: impl PermissionHook + 'static) -> Self {
        self.validate_permission = Some(Arc::new(hook));
        self
    }

    pub fn with_cooldown(mut self, seconds: f64) -> Self {
        self.cooldown_seconds = Some(seconds);
        self
    }

    pub fn with_requires_alive(mut self, requires_alive: bool) -> Self {
        self.requires_alive = Some(requires_alive);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// A registered action with defaults filled in.
pub struct ActionRecord {
    pub name: String,
    pub execute: Arc<dyn ActionHandler>,
    pub validate_permission: Option<Arc<dyn PermissionHook>>,
    pub cooldown: Duration,
    pub requires_alive: bool,
    pub source: String,
}

impl ActionRecord {
    /// Runs the custom permission hook, if any.
    ///
    /// Returns `false` only when the hook explicitly answers `false`. A
    /// missing, erroring or panicking hook does not object.
    pub fn hook_permits(&self, actor: &ActorSnapshot, root: EntityId) -> bool {
        let Some(hook) = &self.validate_permission else {
            return true;
        };
        match panic::catch_unwind(AssertUnwindSafe(|| hook.validate_permission(actor, root))) {
            Ok(Ok(allowed)) => allowed,
            Ok(Err(err)) => {
                debug!(
                    target: "interaction::dispatch",
                    action = %self.name,
                    error = %err,
                    "permission hook failed, ignoring"
                );
                true
            }
            Err(payload) => {
                debug!(
                    target: "interaction::dispatch",
                    action = %self.name,
                    panic = %panic_message(payload.as_ref()),
                    "permission hook panicked, ignoring"
                );
                true
            }
        }
    }
}

impl fmt::Debug for ActionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRecord")
            .field("name", &self.name)
            .field("has_permission_hook", &self.validate_permission.is_some())
            .field("cooldown", &self.cooldown)
            .field("requires_alive", &self.requires_alive)
            .field("source", &self.source)
            .finish()
    }
}

/// Rejected registration. The registry is left untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("action name is empty")]
    EmptyName,

    #[error("action {name:?} has no execute handler")]
    MissingExecute { name: String },

    #[error("action {name:?} has invalid cooldown {seconds}")]
    InvalidCooldown { name: String, seconds: f64 },
}

/// Why [`ActionRegistry::invoke`] did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerFailure {
    #[error("action {0:?} is not registered")]
    Unregistered(String),

    #[error("action {action:?} failed: {source}")]
    Failed {
        action: String,
        #[source]
        source: HandlerError,
    },

    #[error("action {action:?} panicked: {message}")]
    Panicked { action: String, message: String },
}

/// Mapping from action name to [`ActionRecord`].
pub struct ActionRegistry {
    records: RwLock<HashMap<String, Arc<ActionRecord>>>,
    default_cooldown: Duration,
}

impl ActionRegistry {
    pub fn new(default_cooldown: Duration) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            default_cooldown,
        }
    }

    /// Stores `data` under `name`, replacing any previous record.
    pub fn register(&self, name: &str, data: ActionData) -> Result<(), RegistryError> {
        let record = self.build_record(name, data).inspect_err(|err| {
            warn!(target: "interaction::registry", action = name, error = %err, "registration rejected");
        })?;

        info!(
            target: "interaction::registry",
            action = name,
            source = %record.source,
            cooldown_ms = record.cooldown.as_millis() as u64,
            requires_alive = record.requires_alive,
            "action registered"
        );

        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.insert(name.to_string(), Arc::new(record));
        Ok(())
    }

    /// Loads every candidate, isolating failures.
    ///
    /// A candidate is skipped (and counted as failed) if its loader errors or
    /// panics, if the module reports an empty name, or if its metadata is
    /// invalid. The remaining candidates are still loaded.
    pub fn load_from(&self, candidates: impl IntoIterator<Item = ModuleCandidate>) -> LoadSummary {
        let mut summary = LoadSummary::default();

        for candidate in candidates {
            let source = candidate.source().to_string();
            match self.load_candidate(candidate) {
                Ok(name) => {
                    debug!(target: "interaction::registry", action = %name, %source, "module loaded");
                    summary.loaded += 1;
                }
                Err(err) => {
                    warn!(target: "interaction::registry", %source, error = %err, "module skipped");
                    summary.record_failure(source, &err);
                }
            }
        }

        info!(
            target: "interaction::registry",
            loaded = summary.loaded,
            failed = summary.failed,
            "action modules loaded"
        );
        summary
    }

    pub fn exists(&self, name: &str) -> bool {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    pub fn get_data(&self, name: &str) -> Option<Arc<ActionRecord>> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Registered cooldown for `name`, if the action is known.
    pub fn cooldown_of(&self, name: &str) -> Option<Duration> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map(|record| record.cooldown)
    }

    /// Registered action names (diagnostics only).
    pub fn list_all(&self) -> BTreeSet<String> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs the handler for `name`; `true` only if it completed without error.
    pub fn execute(&self, name: &str, actor: &ActorSnapshot, root: EntityId) -> bool {
        self.invoke(name, actor, root).is_ok()
    }

    /// Runs the handler for `name`, reporting why it did not complete.
    ///
    /// The record is cloned out before the handler runs, so a handler may
    /// itself register or replace actions.
    pub fn invoke(
        &self,
        name: &str,
        actor: &ActorSnapshot,
        root: EntityId,
    ) -> Result<(), HandlerFailure> {
        let Some(record) = self.get_data(name) else {
            warn!(target: "interaction::registry", action = name, "execute called for unregistered action");
            return Err(HandlerFailure::Unregistered(name.to_string()));
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| record.execute.execute(actor, root)));
        let failure = match outcome {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(source)) => HandlerFailure::Failed {
                action: name.to_string(),
                source,
            },
            Err(payload) => HandlerFailure::Panicked {
                action: name.to_string(),
                message: panic_message(payload.as_ref()),
            },
        };

        error!(
            target: "interaction::dispatch",
            action = name,
            actor = %actor.id,
            root = %root,
            error = %failure,
            "action handler failed"
        );
        Err(failure)
    }

    /// Teardown hook for test isolation.
    pub fn clear(&self) {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn build_record(&self, name: &str, data: ActionData) -> Result<ActionRecord, RegistryError> {
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        let execute = data.execute.ok_or_else(|| RegistryError::MissingExecute {
            name: name.to_string(),
        })?;
        let cooldown = match data.cooldown_seconds {
            None => self.default_cooldown,
            Some(seconds) => Duration::try_from_secs_f64(seconds).map_err(|_| {
                RegistryError::InvalidCooldown {
                    name: name.to_string(),
                    seconds,
                }
            })?,
        };

        Ok(ActionRecord {
            name: name.to_string(),
            execute,
            validate_permission: data.validate_permission,
            cooldown,
            requires_alive: data.requires_alive.unwrap_or(true),
            source: data.source.unwrap_or_else(|| RUNTIME_SOURCE.to_string()),
        })
    }

    fn load_candidate(&self, candidate: ModuleCandidate) -> Result<String, LoadError> {
        let (source, loader, overrides) = candidate.into_parts();

        let module = panic::catch_unwind(AssertUnwindSafe(loader))
            .map_err(|payload| LoadError::Panicked(panic_message(payload.as_ref())))??;

        let name = module.name().trim().to_string();
        if name.is_empty() {
            return Err(LoadError::EmptyName);
        }

        let mut data = ActionData::from_module(module).with_source(source);
        if let Some(seconds) = overrides.cooldown_seconds {
            data = data.with_cooldown(seconds);
        }
        if let Some(requires_alive) = overrides.requires_alive {
            data = data.with_requires_alive(requires_alive);
        }

        self.register(&name, data)?;
        Ok(name)
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new(Duration::from_secs_f64(
            interaction_core::GatekeeperConfig::DEFAULT_COOLDOWN_SECS,
        ))
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interaction_core::ActorId;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn actor() -> ActorSnapshot {
        ActorSnapshot::new(ActorId(1), "Alice")
    }

    fn ok_handler() -> ActionData {
        ActionData::new(|_: &ActorSnapshot, _: EntityId| -> Result<(), HandlerError> { Ok(()) })
    }

    #[test]
    fn register_fills_defaults() {
        let registry = ActionRegistry::default();
        registry.register("Sit", ok_handler()).unwrap();

        let record = registry.get_data("Sit").unwrap();
        assert_eq!(record.cooldown, Duration::from_millis(500));
        assert!(record.requires_alive);
        assert!(record.validate_permission.is_none());
        assert_eq!(record.source, RUNTIME_SOURCE);
        assert!(registry.exists("Sit"));
        assert!(!registry.exists("sit"));
    }

    #[test]
    fn rejected_registration_keeps_prior_record() {
        let registry = ActionRegistry::default();
        registry
            .register("Sit", ok_handler().with_cooldown(3.0))
            .unwrap();

        assert_eq!(
            registry.register("Sit", ActionData::without_handler()),
            Err(RegistryError::MissingExecute {
                name: "Sit".to_string()
            })
        );
        assert_eq!(registry.register("", ok_handler()), Err(RegistryError::EmptyName));
        assert!(matches!(
            registry.register("Sit", ok_handler().with_cooldown(-1.0)),
            Err(RegistryError::InvalidCooldown { .. })
        ));

        assert_eq!(registry.cooldown_of("Sit"), Some(Duration::from_secs(3)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn reregistration_replaces_whole_record() {
        let registry = ActionRegistry::default();
        registry
            .register(
                "Arrest",
                ok_handler()
                    .with_cooldown(5.0)
                    .with_requires_alive(false)
                    .with_permission(|_: &ActorSnapshot, _: EntityId| -> Result<bool, HandlerError> {
                        Ok(false)
                    }),
            )
            .unwrap();
        registry.register("Arrest", ok_handler()).unwrap();

        let record = registry.get_data("Arrest").unwrap();
        assert_eq!(record.cooldown, Duration::from_millis(500));
        assert!(record.requires_alive);
        assert!(record.validate_permission.is_none());
    }

    #[test]
    fn execute_isolates_errors_and_panics() {
        let registry = ActionRegistry::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        registry
            .register(
                "Count",
                ActionData::new(move |_: &ActorSnapshot, _: EntityId| -> Result<(), HandlerError> {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
            )
            .unwrap();
        registry
            .register(
                "Broken",
                ActionData::new(|_: &ActorSnapshot, _: EntityId| -> Result<(), HandlerError> {
                    Err("door jammed".into())
                }),
            )
            .unwrap();
        registry
            .register(
                "Explode",
                ActionData::new(|_: &ActorSnapshot, _: EntityId| -> Result<(), HandlerError> {
                    panic!("kaboom")
                }),
            )
            .unwrap();

        assert!(registry.execute("Count", &actor(), EntityId(1)));
        assert!(!registry.execute("Broken", &actor(), EntityId(1)));
        assert_eq!(
            registry.invoke("Explode", &actor(), EntityId(1)),
            Err(HandlerFailure::Panicked {
                action: "Explode".to_string(),
                message: "kaboom".to_string()
            })
        );
        assert_eq!(
            registry.invoke("Missing", &actor(), EntityId(1)),
            Err(HandlerFailure::Unregistered("Missing".to_string()))
        );
        // Still serving after the panic.
        assert!(registry.execute("Count", &actor(), EntityId(1)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn hook_only_vetoes_on_explicit_false() {
        let registry = ActionRegistry::default();
        registry
            .register(
                "Deny",
                ok_handler().with_permission(|_: &ActorSnapshot, _: EntityId| -> Result<bool, HandlerError> {
                        Ok(false)
                    }),
            )
            .unwrap();
        registry
            .register(
                "Erroring",
                ok_handler().with_permission(|_: &ActorSnapshot, _: EntityId| -> Result<bool, HandlerError> {
                    Err(HandlerError::new("lookup failed"))
                }),
            )
            .unwrap();
        registry.register("Plain", ok_handler()).unwrap();

        let actor = actor();
        assert!(!registry.get_data("Deny").unwrap().hook_permits(&actor, EntityId(1)));
        assert!(registry.get_data("Erroring").unwrap().hook_permits(&actor, EntityId(1)));
        assert!(registry.get_data("Plain").unwrap().hook_permits(&actor, EntityId(1)));
    }

    #[test]
    fn list_all_is_sorted() {
        let registry = ActionRegistry::default();
        registry.register("Sit", ok_handler()).unwrap();
        registry.register("Arrest", ok_handler()).unwrap();

        let names: Vec<_> = registry.list_all().into_iter().collect();
        assert_eq!(names, ["Arrest", "Sit"]);
    }
}
