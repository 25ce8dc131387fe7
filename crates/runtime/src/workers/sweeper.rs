//! Periodic purge of stale attribute cache entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

use crate::cache::AttributeCache;

/// Background task calling [`AttributeCache::sweep`] on a fixed interval.
pub struct CacheSweeper {
    cache: Arc<AttributeCache>,
    interval: Duration,
    max_age: Duration,
    shutdown_rx: oneshot::Receiver<()>,
}

impl CacheSweeper {
    pub fn new(
        cache: Arc<AttributeCache>,
        interval: Duration,
        max_age: Duration,
        shutdown_rx: oneshot::Receiver<()>,
    ) -> Self {
        Self {
            cache,
            interval: interval.max(Duration::from_millis(1)),
            max_age,
            shutdown_rx,
        }
    }

    /// Sweeps every `interval` until the shutdown signal fires or its sender
    /// is dropped.
    pub async fn run(mut self) {
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.cache.sweep(self.max_age);
                }
                _ = &mut self.shutdown_rx => break,
            }
        }

        debug!(target: "interaction::cache", "cache sweeper stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::oracle::InMemoryWorld;
    use interaction_core::EntityId;

    #[tokio::test(start_paused = true)]
    async fn sweeps_on_interval_and_stops_on_signal() {
        let world = Arc::new(InMemoryWorld::new());
        world.add_entity(EntityId(1), Some(InMemoryWorld::ROOT));
        world.set_attribute(EntityId(1), "Action1", "Sit");
        let clock = Arc::new(ManualClock::new());
        let cache = Arc::new(AttributeCache::new(
            world.clone(),
            clock.clone(),
            Duration::from_secs(1),
        ));
        cache.get(EntityId(1));
        assert_eq!(cache.len(), 1);

        let (tx, rx) = oneshot::channel();
        let sweeper = CacheSweeper::new(
            cache.clone(),
            Duration::from_secs(60),
            Duration::from_secs(10),
            rx,
        );
        let handle = tokio::spawn(sweeper.run());

        clock.advance(Duration::from_secs(11));
        time::sleep(Duration::from_secs(61)).await;
        assert!(cache.is_empty());

        tx.send(()).unwrap();
        handle.await.unwrap();
    }
}
