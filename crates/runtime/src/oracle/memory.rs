//! In-memory oracle implementations for tests and local runs.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use interaction_core::{
    ActorId, ActorOracle, ActorSnapshot, AttributeMap, AttributeValue, EntityId, Position,
    WorldOracle,
};

use super::{RankLookupError, RankOracle};

#[derive(Debug, Default, Clone)]
struct EntityNode {
    parent: Option<EntityId>,
    attributes: AttributeMap,
    position: Option<Position>,
    primary_part: Option<EntityId>,
    owner: Option<ActorId>,
}

/// Mutable entity tree rooted at [`InMemoryWorld::ROOT`].
///
/// Counts attribute reads so tests can observe cache behaviour.
pub struct InMemoryWorld {
    nodes: RwLock<HashMap<EntityId, EntityNode>>,
    attribute_reads: AtomicUsize,
}

impl InMemoryWorld {
    /// The world root every reachable entity descends from.
    pub const ROOT: EntityId = EntityId(0);

    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(Self::ROOT, EntityNode::default());
        Self {
            nodes: RwLock::new(nodes),
            attribute_reads: AtomicUsize::new(0),
        }
    }

    /// Adds (or re-parents) `entity` under `parent`; `None` leaves it detached.
    pub fn add_entity(&self, entity: EntityId, parent: Option<EntityId>) {
        let mut nodes = self.nodes.write().unwrap_or_else(PoisonError::into_inner);
        nodes.entry(entity).or_default().parent = parent;
    }

    pub fn set_attribute(&self, entity: EntityId, key: &str, value: impl Into<AttributeValue>) {
        let mut nodes = self.nodes.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(node) = nodes.get_mut(&entity) {
            node.attributes.insert(key.to_string(), value.into());
        }
    }

    pub fn remove_attribute(&self, entity: EntityId, key: &str) {
        let mut nodes = self.nodes.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(node) = nodes.get_mut(&entity) {
            node.attributes.remove(key);
        }
    }

    pub fn set_position(&self, entity: EntityId, position: Position) {
        self.with_node(entity, |node| node.position = Some(position));
    }

    /// Makes `part` the position source of the model `entity`.
    pub fn set_primary_part(&self, entity: EntityId, part: EntityId) {
        self.with_node(entity, |node| node.primary_part = Some(part));
    }

    pub fn set_owner(&self, entity: EntityId, owner: ActorId) {
        self.with_node(entity, |node| node.owner = Some(owner));
    }

    /// Removes `entity`. Its descendants stay but are no longer reachable.
    pub fn destroy(&self, entity: EntityId) {
        let mut nodes = self.nodes.write().unwrap_or_else(PoisonError::into_inner);
        nodes.remove(&entity);
    }

    /// Number of [`WorldOracle::attributes`] calls served so far.
    pub fn attribute_reads(&self) -> usize {
        self.attribute_reads.load(Ordering::SeqCst)
    }

    fn with_node(&self, entity: EntityId, f: impl FnOnce(&mut EntityNode)) {
        let mut nodes = self.nodes.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(node) = nodes.get_mut(&entity) {
            f(node);
        }
    }
}

impl Default for InMemoryWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldOracle for InMemoryWorld {
    fn exists(&self, entity: EntityId) -> bool {
        let nodes = self.nodes.read().unwrap_or_else(PoisonError::into_inner);
        nodes.contains_key(&entity)
    }

    fn is_reachable(&self, entity: EntityId) -> bool {
        let nodes = self.nodes.read().unwrap_or_else(PoisonError::into_inner);
        let mut current = entity;
        // Bounded by the node count so a parent cycle cannot loop forever.
        for _ in 0..=nodes.len() {
            if current == Self::ROOT {
                return nodes.contains_key(&current);
            }
            match nodes.get(&current).and_then(|node| node.parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
        false
    }

    fn parent(&self, entity: EntityId) -> Option<EntityId> {
        let nodes = self.nodes.read().unwrap_or_else(PoisonError::into_inner);
        nodes.get(&entity).and_then(|node| node.parent)
    }

    fn attributes(&self, entity: EntityId) -> Option<AttributeMap> {
        self.attribute_reads.fetch_add(1, Ordering::SeqCst);
        let nodes = self.nodes.read().unwrap_or_else(PoisonError::into_inner);
        nodes.get(&entity).map(|node| node.attributes.clone())
    }

    fn position(&self, entity: EntityId) -> Option<Position> {
        let nodes = self.nodes.read().unwrap_or_else(PoisonError::into_inner);
        let node = nodes.get(&entity)?;
        node.position.or_else(|| {
            node.primary_part
                .and_then(|part| nodes.get(&part))
                .and_then(|part| part.position)
        })
    }

    fn owner(&self, entity: EntityId) -> Option<ActorId> {
        let nodes = self.nodes.read().unwrap_or_else(PoisonError::into_inner);
        nodes.get(&entity).and_then(|node| node.owner)
    }
}

/// Connected actors keyed by id.
#[derive(Default)]
pub struct InMemoryActors {
    actors: RwLock<HashMap<ActorId, ActorSnapshot>>,
}

impl InMemoryActors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the actor's snapshot.
    pub fn upsert(&self, actor: ActorSnapshot) {
        let mut actors = self.actors.write().unwrap_or_else(PoisonError::into_inner);
        actors.insert(actor.id, actor);
    }

    pub fn update(&self, id: ActorId, f: impl FnOnce(&mut ActorSnapshot)) {
        let mut actors = self.actors.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(actor) = actors.get_mut(&id) {
            f(actor);
        }
    }

    pub fn remove(&self, id: ActorId) -> Option<ActorSnapshot> {
        let mut actors = self.actors.write().unwrap_or_else(PoisonError::into_inner);
        actors.remove(&id)
    }
}

impl ActorOracle for InMemoryActors {
    fn actor(&self, actor: ActorId) -> Option<ActorSnapshot> {
        let actors = self.actors.read().unwrap_or_else(PoisonError::into_inner);
        actors.get(&actor).cloned()
    }
}

/// Fixed rank table with switchable per-group failures.
///
/// Each lookup yields once to the scheduler before answering, like a remote
/// call would.
#[derive(Default)]
pub struct StaticRanks {
    ranks: RwLock<HashMap<(ActorId, u64), u64>>,
    failing_groups: RwLock<HashSet<u64>>,
    lookups: AtomicUsize,
}

impl StaticRanks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_rank(&self, actor: ActorId, group_id: u64, rank: u64) {
        let mut ranks = self.ranks.write().unwrap_or_else(PoisonError::into_inner);
        ranks.insert((actor, group_id), rank);
    }

    /// Makes every lookup against `group_id` fail until [`recover_group`](Self::recover_group).
    pub fn fail_group(&self, group_id: u64) {
        let mut failing = self
            .failing_groups
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        failing.insert(group_id);
    }

    pub fn recover_group(&self, group_id: u64) {
        let mut failing = self
            .failing_groups
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        failing.remove(&group_id);
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RankOracle for StaticRanks {
    async fn rank_in_group(
        &self,
        actor: &ActorSnapshot,
        group_id: u64,
    ) -> Result<u64, RankLookupError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        let failing = self
            .failing_groups
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&group_id);
        if failing {
            return Err(RankLookupError::Unavailable(format!("group {}", group_id)));
        }

        let ranks = self.ranks.read().unwrap_or_else(PoisonError::into_inner);
        Ok(ranks.get(&(actor.id, group_id)).copied().unwrap_or(0))
    }
}
