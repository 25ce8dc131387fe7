//! Actions offered by this server.
//!
//! Each module only reports what it would do; the demo world has no
//! simulation to mutate.

use std::sync::Arc;

use interaction_core::{ActorSnapshot, EntityId};
use interaction_runtime::{ActionModule, HandlerError, ModuleCatalog};
use tracing::info;

/// Every module this binary can load, keyed by manifest name.
pub fn catalog() -> ModuleCatalog {
    ModuleCatalog::new()
        .with("Arrest", || Arc::new(Arrest) as Arc<dyn ActionModule>)
        .with("OpenDoor", || Arc::new(OpenDoor) as Arc<dyn ActionModule>)
        .with("Sit", || Arc::new(Sit) as Arc<dyn ActionModule>)
        .with("Respawn", || Arc::new(Respawn) as Arc<dyn ActionModule>)
}

pub struct Arrest;

impl ActionModule for Arrest {
    fn name(&self) -> &str {
        "Arrest"
    }

    fn execute(&self, actor: &ActorSnapshot, root: EntityId) -> Result<(), HandlerError> {
        info!(target: "interaction::actions", officer = %actor.name, %root, "suspect detained");
        Ok(())
    }

    fn has_permission_hook(&self) -> bool {
        true
    }

    /// Teamless actors never arrest, whatever the root allows.
    fn validate_permission(
        &self,
        actor: &ActorSnapshot,
        _root: EntityId,
    ) -> Result<bool, HandlerError> {
        Ok(actor.team_name().is_some())
    }

    fn cooldown_seconds(&self) -> Option<f64> {
        Some(1.0)
    }
}

pub struct OpenDoor;

impl ActionModule for OpenDoor {
    fn name(&self) -> &str {
        "OpenDoor"
    }

    fn execute(&self, actor: &ActorSnapshot, root: EntityId) -> Result<(), HandlerError> {
        info!(target: "interaction::actions", actor = %actor.name, door = %root, "door toggled");
        Ok(())
    }
}

pub struct Sit;

impl ActionModule for Sit {
    fn name(&self) -> &str {
        "Sit"
    }

    fn execute(&self, actor: &ActorSnapshot, root: EntityId) -> Result<(), HandlerError> {
        if actor.avatar.as_ref().and_then(|avatar| avatar.anchor).is_none() {
            return Err(HandlerError::new("avatar has no body to seat"));
        }
        info!(target: "interaction::actions", actor = %actor.name, seat = %root, "actor seated");
        Ok(())
    }
}

pub struct Respawn;

impl ActionModule for Respawn {
    fn name(&self) -> &str {
        "Respawn"
    }

    fn execute(&self, actor: &ActorSnapshot, root: EntityId) -> Result<(), HandlerError> {
        info!(target: "interaction::actions", actor = %actor.name, beacon = %root, "actor respawned");
        Ok(())
    }

    fn requires_alive(&self) -> Option<bool> {
        Some(false)
    }
}
