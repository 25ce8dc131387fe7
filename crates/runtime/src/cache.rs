//! Short-lived memo of entity attribute snapshots.
//!
//! A burst of interaction checks tends to read the same handful of entities
//! many times within a frame or two. [`AttributeCache`] keeps each parsed
//! [`AttributeSnapshot`] for `cache_lifetime` and re-reads the world once an
//! entry is older than that. Stale entries are never served; they linger only
//! until the periodic sweep or an explicit invalidation removes them.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use interaction_core::{ActorId, AttributeSnapshot, EntityId, WorldOracle};
use tracing::debug;

use crate::clock::Clock;

#[derive(Debug, Clone)]
struct CacheEntry {
    attrs: Arc<AttributeSnapshot>,
    captured_at: Duration,
    owner: Option<ActorId>,
}

/// Shared TTL cache keyed by entity.
pub struct AttributeCache {
    entries: RwLock<HashMap<EntityId, CacheEntry>>,
    world: Arc<dyn WorldOracle>,
    clock: Arc<dyn Clock>,
    lifetime: Duration,
    empty: Arc<AttributeSnapshot>,
}

impl AttributeCache {
    pub fn new(world: Arc<dyn WorldOracle>, clock: Arc<dyn Clock>, lifetime: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            world,
            clock,
            lifetime,
            empty: Arc::new(AttributeSnapshot::empty()),
        }
    }

    /// Returns the entity's attributes, re-reading the world if the cached
    /// copy is missing or at least `lifetime` old.
    ///
    /// Entities the world no longer knows yield an empty snapshot, which is
    /// not cached.
    pub fn get(&self, entity: EntityId) -> Arc<AttributeSnapshot> {
        let now = self.clock.now();
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = entries.get(&entity)
                && now.saturating_sub(entry.captured_at) < self.lifetime
            {
                return Arc::clone(&entry.attrs);
            }
        }

        let Some(raw) = self.world.attributes(entity) else {
            return Arc::clone(&self.empty);
        };
        let attrs = Arc::new(AttributeSnapshot::from_map(raw));
        let entry = CacheEntry {
            attrs: Arc::clone(&attrs),
            captured_at: now,
            owner: self.world.owner(entity),
        };

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(entity, entry);
        attrs
    }

    /// Drops the entry for a destroyed entity.
    pub fn forget(&self, entity: EntityId) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(&entity).is_some()
    }

    /// Drops every entry whose entity belonged to `actor`.
    pub fn forget_owned_by(&self, actor: ActorId) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| entry.owner != Some(actor));
        before - entries.len()
    }

    /// Purges entries older than `max_age` or whose entity no longer exists.
    ///
    /// Existence is checked against a snapshot of the keys without holding the
    /// lock; removal re-checks each entry's age so one refreshed in between
    /// survives.
    pub fn sweep(&self, max_age: Duration) -> usize {
        let now = self.clock.now();
        let candidates: Vec<(EntityId, Duration)> = {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            entries
                .iter()
                .map(|(entity, entry)| (*entity, entry.captured_at))
                .collect()
        };

        let doomed: Vec<(EntityId, Duration)> = candidates
            .into_iter()
            .filter(|(entity, captured_at)| {
                now.saturating_sub(*captured_at) >= max_age || !self.world.exists(*entity)
            })
            .collect();
        if doomed.is_empty() {
            return 0;
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let mut removed = 0;
        for (entity, captured_at) in doomed {
            if entries
                .get(&entity)
                .is_some_and(|entry| entry.captured_at == captured_at)
            {
                entries.remove(&entity);
                removed += 1;
            }
        }

        debug!(
            target: "interaction::cache",
            removed,
            remaining = entries.len(),
            "cache sweep"
        );
        removed
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Teardown hook for test isolation.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
