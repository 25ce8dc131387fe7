//! Traits describing read-only access to the simulated world.
//!
//! The gatekeeper never mutates the world. Everything it needs to know about
//! entities and actors flows through these oracles, so tests and the demo
//! server can substitute in-memory worlds for the real simulation.
use crate::attributes::AttributeMap;
use crate::state::{ActorId, ActorSnapshot, EntityId, Position};

/// Entity hierarchy, metadata and geometry.
pub trait WorldOracle: Send + Sync {
    /// Returns true if `entity` still exists anywhere.
    fn exists(&self, entity: EntityId) -> bool;

    /// Returns true if `entity` exists and descends from the world root.
    ///
    /// Detached or destroyed entities are not reachable.
    fn is_reachable(&self, entity: EntityId) -> bool;

    /// Parent of `entity`, or `None` at the top of the hierarchy.
    fn parent(&self, entity: EntityId) -> Option<EntityId>;

    /// Current attribute bag, or `None` if the entity is gone.
    fn attributes(&self, entity: EntityId) -> Option<AttributeMap>;

    /// World position of `entity`.
    ///
    /// Parts report their own position; models report their primary part's.
    /// `None` when neither is available.
    fn position(&self, entity: EntityId) -> Option<Position>;

    /// Actor that owns `entity` (for example, parts of their avatar).
    fn owner(&self, _entity: EntityId) -> Option<ActorId> {
        None
    }
}

/// Connected actors.
pub trait ActorOracle: Send + Sync {
    /// Current view of `actor`, or `None` if they are not connected.
    fn actor(&self, actor: ActorId) -> Option<ActorSnapshot>;
}
