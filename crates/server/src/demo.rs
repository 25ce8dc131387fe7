//! Scripted session against a small in-memory world.

use std::sync::Arc;
use std::time::Duration;

use interaction_core::{ActorId, ActorSnapshot, AvatarState, EntityId, Position};
use interaction_runtime::{
    DispatchOutcome, Gatekeeper, InMemoryActors, InMemoryWorld, InteractionRequest, StaticRanks,
};
use tracing::info;

const JAIL_DOOR: EntityId = EntityId(1);
const JAIL_DOOR_HANDLE: EntityId = EntityId(2);
const BENCH: EntityId = EntityId(3);
const BENCH_SEAT: EntityId = EntityId(4);
const SUSPECT: EntityId = EntityId(5);
const BEACON: EntityId = EntityId(6);

const OFFICER: ActorId = ActorId(1);
const CIVILIAN: ActorId = ActorId(2);
const GHOST: ActorId = ActorId(3);

pub const SECURITY_GROUP: u64 = 7;

/// World and actor fixtures used by the scripted session.
pub struct DemoWorld {
    pub world: Arc<InMemoryWorld>,
    pub actors: Arc<InMemoryActors>,
    pub ranks: Arc<StaticRanks>,
}

impl DemoWorld {
    pub fn new() -> Self {
        let world = Arc::new(InMemoryWorld::new());

        world.add_entity(JAIL_DOOR, Some(InMemoryWorld::ROOT));
        world.add_entity(JAIL_DOOR_HANDLE, Some(JAIL_DOOR));
        world.set_position(JAIL_DOOR, Position::new(10.0, 0.0, 0.0));
        world.set_attribute(JAIL_DOOR, "ObjectText", "Cell Door");
        world.set_attribute(JAIL_DOOR, "Action1", "OpenDoor");
        world.set_attribute(JAIL_DOOR, "Action1_Restrict", format!("rank:{SECURITY_GROUP}:10"));

        world.add_entity(BENCH, Some(InMemoryWorld::ROOT));
        world.add_entity(BENCH_SEAT, Some(BENCH));
        world.set_position(BENCH_SEAT, Position::new(0.0, 0.0, 3.0));
        world.set_primary_part(BENCH, BENCH_SEAT);
        world.set_attribute(BENCH, "Action1", "Sit");

        world.add_entity(SUSPECT, Some(InMemoryWorld::ROOT));
        world.set_position(SUSPECT, Position::new(5.0, 0.0, 0.0));
        world.set_attribute(SUSPECT, "ActionText", "Suspect");
        world.set_attribute(SUSPECT, "Action1", "Arrest");
        world.set_attribute(SUSPECT, "Action1_Restrict", "team:Police");

        world.add_entity(BEACON, Some(InMemoryWorld::ROOT));
        world.set_position(BEACON, Position::ORIGIN);
        world.set_attribute(BEACON, "Action1", "Respawn");

        let actors = Arc::new(InMemoryActors::new());
        actors.upsert(
            ActorSnapshot::new(OFFICER, "Alice")
                .with_team("Police")
                .with_avatar(AvatarState::new(100.0, Position::ORIGIN)),
        );
        actors.upsert(
            ActorSnapshot::new(CIVILIAN, "Bob")
                .with_team("Civilians")
                .with_avatar(AvatarState::new(100.0, Position::new(60.0, 0.0, 0.0))),
        );
        actors.upsert(
            ActorSnapshot::new(GHOST, "Carol").with_avatar(AvatarState::new(0.0, Position::ORIGIN)),
        );

        let ranks = Arc::new(StaticRanks::new());
        ranks.set_rank(OFFICER, SECURITY_GROUP, 20);

        Self {
            world,
            actors,
            ranks,
        }
    }
}

impl Default for DemoWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs a fixed sequence of requests, pausing between some of them so
/// cooldowns can expire.
pub async fn run_script(gatekeeper: &Gatekeeper) {
    let steps: [(ActorId, EntityId, &str, Duration); 9] = [
        (OFFICER, SUSPECT, "Arrest", Duration::ZERO),
        (OFFICER, SUSPECT, "Arrest", Duration::ZERO),
        (CIVILIAN, SUSPECT, "Arrest", Duration::ZERO),
        (OFFICER, JAIL_DOOR_HANDLE, "OpenDoor", Duration::ZERO),
        (OFFICER, BENCH_SEAT, "Sit", Duration::ZERO),
        (OFFICER, BENCH_SEAT, "Fly", Duration::ZERO),
        (GHOST, BEACON, "Sit", Duration::ZERO),
        (GHOST, BEACON, "Respawn", Duration::ZERO),
        (OFFICER, SUSPECT, "Arrest", Duration::from_secs(1)),
    ];

    for (actor, target, action, wait) in steps {
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
        let request = InteractionRequest::new(actor, target, action);
        match gatekeeper.dispatch(&request).await {
            DispatchOutcome::Dispatched { root, success } => {
                info!(%actor, %target, action, %root, success, "request dispatched");
            }
            DispatchOutcome::Rejected(rejection) => {
                info!(%actor, %target, action, reason = %rejection, "request rejected");
            }
        }
    }
}
