//! Per-actor, per-action throttling.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use interaction_core::ActorId;

use crate::clock::Clock;
use crate::registry::ActionRegistry;

const SHARD_COUNT: usize = 16;

type ActorStamps = HashMap<String, Duration>;

/// Last-invocation store enforcing a minimum interval between repeats.
///
/// State is sharded by actor so unrelated actors never contend. Within a
/// shard, [`check_and_stamp`](Self::check_and_stamp) holds the lock across both
/// the check and the write, so two racing requests for the same pair cannot
/// both pass.
pub struct CooldownThrottle {
    shards: Box<[Mutex<HashMap<ActorId, ActorStamps>>]>,
    registry: Arc<ActionRegistry>,
    clock: Arc<dyn Clock>,
    default_cooldown: Duration,
}

impl CooldownThrottle {
    pub fn new(
        registry: Arc<ActionRegistry>,
        clock: Arc<dyn Clock>,
        default_cooldown: Duration,
    ) -> Self {
        Self {
            shards: (0..SHARD_COUNT).map(|_| Mutex::default()).collect(),
            registry,
            clock,
            default_cooldown,
        }
    }

    /// Returns `true` if `action` is still cooling down for `actor`.
    ///
    /// When it is not, `now` is recorded as the new last invocation before
    /// returning `false`. A call landing exactly `cooldown` after the previous
    /// stamp is allowed. Writing a stamp also drops the actor's expired ones,
    /// so an actor holds at most one entry per action still cooling down.
    pub fn check_and_stamp(&self, actor: ActorId, action: &str) -> bool {
        let cooldown = self.cooldown_of(action);
        let now = self.clock.now();

        let mut shard = self.shard(actor).lock().unwrap_or_else(PoisonError::into_inner);
        let stamps = shard.entry(actor).or_default();
        match stamps.get_mut(action) {
            Some(last) => {
                if now.saturating_sub(*last) < cooldown {
                    return true;
                }
                *last = now.max(*last);
            }
            None => {
                stamps.insert(action.to_string(), now);
            }
        }
        stamps.retain(|name, last| {
            name == action || now.saturating_sub(*last) < self.cooldown_of(name)
        });
        false
    }

    fn cooldown_of(&self, action: &str) -> Duration {
        self.registry
            .cooldown_of(action)
            .unwrap_or(self.default_cooldown)
    }

    /// Last recorded invocation of `action` by `actor`.
    pub fn last_invocation(&self, actor: ActorId, action: &str) -> Option<Duration> {
        let shard = self.shard(actor).lock().unwrap_or_else(PoisonError::into_inner);
        shard.get(&actor)?.get(action).copied()
    }

    /// Drops all state for a departing actor.
    pub fn forget_actor(&self, actor: ActorId) -> bool {
        let mut shard = self.shard(actor).lock().unwrap_or_else(PoisonError::into_inner);
        shard.remove(&actor).is_some()
    }

    /// Number of actions with a recorded stamp for `actor`.
    pub fn tracked_actions(&self, actor: ActorId) -> usize {
        let shard = self.shard(actor).lock().unwrap_or_else(PoisonError::into_inner);
        shard.get(&actor).map_or(0, HashMap::len)
    }

    /// Number of actors with recorded state.
    pub fn tracked_actors(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.lock().unwrap_or_else(PoisonError::into_inner).len())
            .sum()
    }

    /// Teardown hook for test isolation.
    pub fn clear(&self) {
        for shard in self.shards.iter() {
            shard.lock().unwrap_or_else(PoisonError::into_inner).clear();
        }
    }

    fn shard(&self, actor: ActorId) -> &Mutex<HashMap<ActorId, ActorStamps>> {
        let index = (actor.0 % self.shards.len() as u64) as usize;
        &self.shards[index]
    }
}
