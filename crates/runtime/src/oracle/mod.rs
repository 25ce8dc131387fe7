//! Runtime access to the world-simulation collaborator.
//!
//! [`OracleManager`] bundles the read-only `interaction-core` oracles with the
//! asynchronous group-rank service so every component receives the same view
//! of the world. The in-memory implementations in [`memory`] back the tests
//! and the demo server.
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use interaction_core::{ActorOracle, ActorSnapshot, WorldOracle};
use thiserror::Error;

pub use memory::{InMemoryActors, InMemoryWorld, StaticRanks};

/// Failure reported by an external rank service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RankLookupError {
    #[error("rank service unavailable: {0}")]
    Unavailable(String),
}

/// External group-rank lookup. May yield while awaiting a remote service.
#[async_trait]
pub trait RankOracle: Send + Sync {
    /// Rank of `actor` in `group_id`; actors outside the group report rank 0.
    async fn rank_in_group(
        &self,
        actor: &ActorSnapshot,
        group_id: u64,
    ) -> Result<u64, RankLookupError>;
}

/// Manages all oracle implementations and provides unified access
#[derive(Clone)]
pub struct OracleManager {
    world: Arc<dyn WorldOracle>,
    actors: Arc<dyn ActorOracle>,
    ranks: Arc<dyn RankOracle>,
}

impl OracleManager {
    /// Creates a new oracle manager
    pub fn new(
        world: Arc<dyn WorldOracle>,
        actors: Arc<dyn ActorOracle>,
        ranks: Arc<dyn RankOracle>,
    ) -> Self {
        Self {
            world,
            actors,
            ranks,
        }
    }

    pub fn world(&self) -> &Arc<dyn WorldOracle> {
        &self.world
    }

    pub fn actors(&self) -> &Arc<dyn ActorOracle> {
        &self.actors
    }

    pub fn ranks(&self) -> &Arc<dyn RankOracle> {
        &self.ranks
    }
}
