//! Interaction root resolution.

use std::sync::Arc;

use interaction_core::{EntityId, GatekeeperConfig, WorldOracle};

use crate::cache::AttributeCache;

/// Finds the entity that declares the actions offered for a clicked target.
///
/// Clients usually hit a leaf part (a door handle, a chair leg); the actions
/// live on the nearest ancestor carrying `ActionText`, `ObjectText` or
/// `Action1`. The walk inspects at most `max_depth` nodes, the target
/// included, which also bounds pathological or cyclic hierarchies.
pub struct RootResolver {
    cache: Arc<AttributeCache>,
    world: Arc<dyn WorldOracle>,
    max_depth: usize,
}

impl RootResolver {
    pub fn new(cache: Arc<AttributeCache>, world: Arc<dyn WorldOracle>) -> Self {
        Self::with_max_depth(cache, world, GatekeeperConfig::MAX_ROOT_DEPTH)
    }

    pub fn with_max_depth(
        cache: Arc<AttributeCache>,
        world: Arc<dyn WorldOracle>,
        max_depth: usize,
    ) -> Self {
        Self {
            cache,
            world,
            max_depth,
        }
    }

    /// Returns `entity` itself or its nearest qualifying ancestor.
    pub fn resolve(&self, entity: EntityId) -> Option<EntityId> {
        let mut current = entity;
        for _ in 0..self.max_depth {
            if self.cache.get(current).is_interaction_root() {
                return Some(current);
            }
            current = self.world.parent(current)?;
        }
        None
    }
}
