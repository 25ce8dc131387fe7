#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use interaction_core::{
    ActorId, ActorSnapshot, AvatarState, EntityId, GatekeeperConfig, Position,
};
use interaction_runtime::{
    ActionData, Gatekeeper, GatekeeperEvent, HandlerError, InMemoryActors, InMemoryWorld,
    ManualClock, ModuleCandidate, OracleManager, StaticRanks,
};
use tokio::sync::broadcast;

pub const ALICE: ActorId = ActorId(1);
pub const BOB: ActorId = ActorId(2);

/// A door model at the origin: `DOOR` carries the actions, `HANDLE` is the
/// part clients click.
pub const DOOR: EntityId = EntityId(10);
pub const HANDLE: EntityId = EntityId(11);

/// In-memory world plus a gatekeeper wired to it, with a manual clock and the
/// sweeper disabled.
pub struct Harness {
    pub world: Arc<InMemoryWorld>,
    pub actors: Arc<InMemoryActors>,
    pub ranks: Arc<StaticRanks>,
    pub clock: Arc<ManualClock>,
    pub gatekeeper: Gatekeeper,
}

impl Harness {
    pub async fn new(modules: Vec<ModuleCandidate>) -> Self {
        Self::with_config(GatekeeperConfig::default(), modules).await
    }

    pub async fn with_config(mut config: GatekeeperConfig, modules: Vec<ModuleCandidate>) -> Self {
        config.enable_sweeper = false;

        let world = Arc::new(InMemoryWorld::new());
        world.add_entity(DOOR, Some(InMemoryWorld::ROOT));
        world.add_entity(HANDLE, Some(DOOR));
        world.set_position(DOOR, Position::ORIGIN);
        world.set_attribute(DOOR, "ObjectText", "Door");

        let actors = Arc::new(InMemoryActors::new());
        let ranks = Arc::new(StaticRanks::new());
        let clock = Arc::new(ManualClock::new());

        let gatekeeper = Gatekeeper::builder()
            .config(config)
            .oracles(OracleManager::new(
                world.clone(),
                actors.clone(),
                ranks.clone(),
            ))
            .clock(clock.clone())
            .modules(modules)
            .build()
            .await
            .expect("gatekeeper should build");

        Self {
            world,
            actors,
            ranks,
            clock,
            gatekeeper,
        }
    }

    /// Declares `actions` as slots 1.. on the door.
    pub fn declare(&self, actions: &[&str]) {
        for (index, action) in actions.iter().enumerate() {
            self.world
                .set_attribute(DOOR, &format!("Action{}", index + 1), *action);
        }
    }

    pub fn restrict(&self, slot: usize, expression: &str) {
        self.world
            .set_attribute(DOOR, &format!("Action{slot}_Restrict"), expression);
    }

    /// Adds a healthy actor standing `distance` units from the door.
    pub fn spawn(&self, id: ActorId, name: &str, distance: f64) -> ActorSnapshot {
        let actor = ActorSnapshot::new(id, name)
            .with_avatar(AvatarState::new(100.0, Position::new(distance, 0.0, 0.0)));
        self.actors.upsert(actor.clone());
        actor
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GatekeeperEvent> {
        self.gatekeeper.subscribe_events()
    }
}

/// Handler that counts its invocations.
pub fn counting(calls: &Arc<AtomicUsize>) -> ActionData {
    let calls = calls.clone();
    ActionData::new(move |_: &ActorSnapshot, _: EntityId| -> Result<(), HandlerError> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
}

pub fn count(calls: &Arc<AtomicUsize>) -> usize {
    calls.load(Ordering::SeqCst)
}

/// Drains every event currently buffered on `rx`.
pub fn drain(rx: &mut broadcast::Receiver<GatekeeperEvent>) -> Vec<GatekeeperEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
