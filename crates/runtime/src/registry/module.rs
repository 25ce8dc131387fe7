//! Contracts implemented by action plugins.

use std::sync::Arc;

use interaction_core::{ActorSnapshot, EntityId};
use thiserror::Error;

/// Failure reported by handler or hook code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Performs an action's effect on the world.
pub trait ActionHandler: Send + Sync {
    fn execute(&self, actor: &ActorSnapshot, root: EntityId) -> Result<(), HandlerError>;
}

impl<F> ActionHandler for F
where
    F: Fn(&ActorSnapshot, EntityId) -> Result<(), HandlerError> + Send + Sync,
{
    fn execute(&self, actor: &ActorSnapshot, root: EntityId) -> Result<(), HandlerError> {
        self(actor, root)
    }
}

/// Action-specific permission check run before the attribute restrictions.
///
/// Only `Ok(false)` vetoes; errors are treated as "no objection".
pub trait PermissionHook: Send + Sync {
    fn validate_permission(&self, actor: &ActorSnapshot, root: EntityId)
    -> Result<bool, HandlerError>;
}

impl<F> PermissionHook for F
where
    F: Fn(&ActorSnapshot, EntityId) -> Result<bool, HandlerError> + Send + Sync,
{
    fn validate_permission(
        &self,
        actor: &ActorSnapshot,
        root: EntityId,
    ) -> Result<bool, HandlerError> {
        self(actor, root)
    }
}

/// A self-describing action plugin.
///
/// Implementing this trait is the compile-time equivalent of exposing a name
/// and an execute function; everything else is optional metadata.
pub trait ActionModule: Send + Sync + 'static {
    /// Name clients use to request the action. Must not be empty.
    fn name(&self) -> &str;

    fn execute(&self, actor: &ActorSnapshot, root: EntityId) -> Result<(), HandlerError>;

    /// Whether [`validate_permission`](Self::validate_permission) should be consulted.
    fn has_permission_hook(&self) -> bool {
        false
    }

    fn validate_permission(
        &self,
        _actor: &ActorSnapshot,
        _root: EntityId,
    ) -> Result<bool, HandlerError> {
        Ok(true)
    }

    /// Overrides the registry's default cooldown, in seconds.
    fn cooldown_seconds(&self) -> Option<f64> {
        None
    }

    /// Overrides the default liveness requirement (alive).
    fn requires_alive(&self) -> Option<bool> {
        None
    }
}

pub(super) struct ModuleExecute(pub(super) Arc<dyn ActionModule>);

impl ActionHandler for ModuleExecute {
    fn execute(&self, actor: &ActorSnapshot, root: EntityId) -> Result<(), HandlerError> {
        self.0.execute(actor, root)
    }
}

pub(super) struct ModulePermission(pub(super) Arc<dyn ActionModule>);

impl PermissionHook for ModulePermission {
    fn validate_permission(
        &self,
        actor: &ActorSnapshot,
        root: EntityId,
    ) -> Result<bool, HandlerError> {
        self.0.validate_permission(actor, root)
    }
}
