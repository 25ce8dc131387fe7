//! Gate-by-gate behaviour of the dispatch pipeline.

mod common;

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::time::Duration;

use common::{ALICE, BOB, DOOR, HANDLE, Harness, count, counting, drain};
use interaction_core::{ActorId, ActorSnapshot, ActorStatus, AvatarState, EntityId, Position};
use interaction_runtime::{
    ActionData, Denial, DispatchOutcome, GatekeeperEvent, HandlerError, InMemoryWorld,
    InteractionRequest, Rejection, SecurityKind,
};

async fn harness_with(actions: &[&str]) -> (Harness, Arc<AtomicUsize>) {
    let harness = Harness::new(Vec::new()).await;
    let calls = Arc::new(AtomicUsize::new(0));
    for action in actions {
        harness
            .gatekeeper
            .registry()
            .register(action, counting(&calls))
            .unwrap();
    }
    harness.declare(actions);
    (harness, calls)
}

async fn dispatch(
    harness: &Harness,
    actor: ActorId,
    target: EntityId,
    action: &str,
) -> DispatchOutcome {
    harness
        .gatekeeper
        .dispatch(&InteractionRequest::new(actor, target, action))
        .await
}

fn security_kinds(events: Vec<GatekeeperEvent>) -> Vec<SecurityKind> {
    events
        .into_iter()
        .filter_map(|event| match event {
            GatekeeperEvent::Security(event) => Some(event.kind),
            _ => None,
        })
        .collect()
}

fn rejected(outcome: DispatchOutcome) -> Rejection {
    match outcome {
        DispatchOutcome::Rejected(rejection) => rejection,
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_requests_are_security_events() {
    let (harness, calls) = harness_with(&["Open"]).await;
    harness.spawn(ALICE, "Alice", 1.0);
    harness.world.add_entity(EntityId(99), None);
    let mut events = harness.subscribe();

    assert_eq!(
        rejected(dispatch(&harness, ActorId(42), HANDLE, "Open").await),
        Rejection::UnknownActor
    );
    assert_eq!(
        rejected(dispatch(&harness, ALICE, EntityId(99), "Open").await),
        Rejection::UnreachableTarget
    );
    assert_eq!(
        rejected(dispatch(&harness, ALICE, HANDLE, "").await),
        Rejection::InvalidActionName { len: 0 }
    );
    assert_eq!(
        rejected(dispatch(&harness, ALICE, HANDLE, &"x".repeat(101)).await),
        Rejection::InvalidActionName { len: 101 }
    );

    assert_eq!(
        security_kinds(drain(&mut events)),
        [
            SecurityKind::UnknownActor,
            SecurityKind::UnreachableTarget,
            SecurityKind::InvalidActionName,
            SecurityKind::InvalidActionName,
        ]
    );
    assert_eq!(count(&calls), 0);
}

#[tokio::test]
async fn hundred_byte_action_name_passes_sanity() {
    let (harness, _calls) = harness_with(&["Open"]).await;
    harness.spawn(ALICE, "Alice", 1.0);

    let outcome = dispatch(&harness, ALICE, HANDLE, &"x".repeat(100)).await;
    assert_eq!(rejected(outcome), Rejection::ActionNotDeclared);
}

#[tokio::test]
async fn restrained_and_punitive_actors_are_ineligible() {
    let (harness, calls) = harness_with(&["Open"]).await;
    let mut events = harness.subscribe();

    let arrested = harness
        .spawn(ActorId(1), "A", 1.0)
        .with_status(ActorStatus::ARRESTED);
    let cuffed = harness
        .spawn(ActorId(2), "B", 1.0)
        .with_status(ActorStatus::CUFFED);
    let prisoner = harness.spawn(ActorId(3), "C", 1.0).with_team("Prisoners");
    for actor in [arrested, cuffed, prisoner] {
        let id = actor.id;
        harness.actors.upsert(actor);
        assert_eq!(
            rejected(dispatch(&harness, id, HANDLE, "Open").await),
            Rejection::Incapacitated
        );
    }

    assert!(drain(&mut events).is_empty());
    assert_eq!(count(&calls), 0);
}

#[tokio::test]
async fn avatar_and_liveness_requirements() {
    let (harness, _calls) = harness_with(&["Open"]).await;
    let revives = Arc::new(AtomicUsize::new(0));
    harness
        .gatekeeper
        .registry()
        .register("Respawn", counting(&revives).with_requires_alive(false))
        .unwrap();
    harness.declare(&["Open", "Respawn"]);

    harness.actors.upsert(ActorSnapshot::new(ALICE, "Alice"));
    assert_eq!(
        rejected(dispatch(&harness, ALICE, HANDLE, "Open").await),
        Rejection::NoAvatar
    );

    harness.actors.upsert(
        ActorSnapshot::new(BOB, "Bob").with_avatar(AvatarState::new(0.0, Position::ORIGIN)),
    );
    assert_eq!(
        rejected(dispatch(&harness, BOB, HANDLE, "Open").await),
        Rejection::Dead
    );
    assert!(dispatch(&harness, BOB, HANDLE, "Respawn").await.succeeded());
    assert_eq!(count(&revives), 1);
}

#[tokio::test]
async fn distance_boundary_and_anomaly() {
    let (harness, calls) = harness_with(&["Open"]).await;
    let mut events = harness.subscribe();

    harness.spawn(ActorId(1), "AtLimit", 20.0);
    harness.spawn(ActorId(2), "JustOver", 20.01);
    harness.spawn(ActorId(3), "FarAway", 45.0);

    assert!(dispatch(&harness, ActorId(1), HANDLE, "Open").await.succeeded());

    match rejected(dispatch(&harness, ActorId(2), HANDLE, "Open").await) {
        Rejection::OutOfRange {
            distance,
            suspicious,
        } => {
            assert!((distance - 20.01).abs() < 1e-9);
            assert!(!suspicious);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(security_kinds(drain(&mut events)).is_empty());

    assert!(matches!(
        rejected(dispatch(&harness, ActorId(3), HANDLE, "Open").await),
        Rejection::OutOfRange {
            suspicious: true,
            ..
        }
    ));
    let anomalies: Vec<_> = drain(&mut events)
        .into_iter()
        .filter_map(|event| match event {
            GatekeeperEvent::Security(event) => Some(event),
            _ => None,
        })
        .collect();
    assert_eq!(anomalies.len(), 1);
    assert_eq!(anomalies[0].kind, SecurityKind::DistanceAnomaly);
    assert_eq!(anomalies[0].distance, Some(45.0));
    assert_eq!(count(&calls), 1);
}

#[tokio::test]
async fn missing_positions_are_rejected() {
    let (harness, _calls) = harness_with(&["Open"]).await;
    harness.actors.upsert(ActorSnapshot::new(ALICE, "Alice").with_avatar(AvatarState {
        health: 100.0,
        anchor: None,
    }));
    assert_eq!(
        rejected(dispatch(&harness, ALICE, HANDLE, "Open").await),
        Rejection::NoPositionAnchor
    );

    let chair = EntityId(20);
    harness.world.add_entity(chair, Some(InMemoryWorld::ROOT));
    harness.world.set_attribute(chair, "Action1", "Open");
    harness.spawn(BOB, "Bob", 1.0);
    assert_eq!(
        rejected(dispatch(&harness, BOB, chair, "Open").await),
        Rejection::NoRootPosition
    );
}

#[tokio::test]
async fn root_position_falls_back_to_primary_part() {
    let (harness, calls) = harness_with(&["Open"]).await;
    let chair = EntityId(20);
    let seat = EntityId(21);
    harness.world.add_entity(chair, Some(InMemoryWorld::ROOT));
    harness.world.add_entity(seat, Some(chair));
    harness.world.set_attribute(chair, "Action1", "Open");
    harness.world.set_position(seat, Position::new(100.0, 0.0, 0.0));
    harness.world.set_primary_part(chair, seat);
    harness.spawn(ALICE, "Alice", 95.0);

    assert!(dispatch(&harness, ALICE, seat, "Open").await.succeeded());
    assert_eq!(count(&calls), 1);
}

#[tokio::test]
async fn target_without_interaction_root_is_rejected_quietly() {
    let (harness, _calls) = harness_with(&["Open"]).await;
    let rock = EntityId(30);
    harness.world.add_entity(rock, Some(InMemoryWorld::ROOT));
    harness.spawn(ALICE, "Alice", 1.0);
    let mut events = harness.subscribe();

    assert_eq!(
        rejected(dispatch(&harness, ALICE, rock, "Open").await),
        Rejection::NoInteractionRoot
    );
    assert!(drain(&mut events).is_empty());
}

#[tokio::test]
async fn undeclared_and_unregistered_actions() {
    let (harness, calls) = harness_with(&["Open"]).await;
    harness.declare(&["Open", "Knock"]);
    harness.spawn(ALICE, "Alice", 1.0);
    let mut events = harness.subscribe();

    assert_eq!(
        rejected(dispatch(&harness, ALICE, HANDLE, "Teleport").await),
        Rejection::ActionNotDeclared
    );
    assert_eq!(
        security_kinds(drain(&mut events)),
        [SecurityKind::UndeclaredAction]
    );

    assert_eq!(
        rejected(dispatch(&harness, ALICE, HANDLE, "Knock").await),
        Rejection::ActionNotRegistered
    );
    assert!(drain(&mut events).is_empty());
    assert_eq!(count(&calls), 0);
}

#[tokio::test]
async fn permission_hook_only_vetoes_on_false() {
    let harness = Harness::new(Vec::new()).await;
    let registry = harness.gatekeeper.registry();
    registry
        .register(
            "Lock",
            ActionData::new(|_: &ActorSnapshot, _: EntityId| -> Result<(), HandlerError> {
                Ok(())
            })
            .with_permission(|actor: &ActorSnapshot, _: EntityId| -> Result<bool, HandlerError> {
                Ok(actor.name == "Alice")
            }),
        )
        .unwrap();
    registry
        .register(
            "Knock",
            ActionData::new(|_: &ActorSnapshot, _: EntityId| -> Result<(), HandlerError> {
                Ok(())
            })
            .with_permission(|_: &ActorSnapshot, _: EntityId| -> Result<bool, HandlerError> {
                Err(HandlerError::new("ownership service offline"))
            }),
        )
        .unwrap();
    harness.declare(&["Lock", "Knock"]);
    harness.spawn(ALICE, "Alice", 1.0);
    harness.spawn(BOB, "Bob", 1.0);

    assert!(dispatch(&harness, ALICE, HANDLE, "Lock").await.succeeded());
    assert_eq!(
        rejected(dispatch(&harness, BOB, HANDLE, "Lock").await),
        Rejection::PermissionHookDenied
    );
    assert!(dispatch(&harness, BOB, HANDLE, "Knock").await.succeeded());
}

#[tokio::test]
async fn hook_and_restriction_must_both_pass() {
    let harness = Harness::new(Vec::new()).await;
    harness
        .gatekeeper
        .registry()
        .register(
            "Lock",
            ActionData::new(|_: &ActorSnapshot, _: EntityId| -> Result<(), HandlerError> {
                Ok(())
            })
            .with_permission(|_: &ActorSnapshot, _: EntityId| -> Result<bool, HandlerError> {
                Ok(true)
            }),
        )
        .unwrap();
    harness.declare(&["Lock"]);
    harness.restrict(1, "player:Alice");
    harness.spawn(BOB, "Bob", 1.0);

    assert_eq!(
        rejected(dispatch(&harness, BOB, HANDLE, "Lock").await),
        Rejection::PermissionDenied(Denial::NotListed)
    );
}

#[tokio::test]
async fn rank_restriction_through_pipeline() {
    let (harness, calls) = harness_with(&["Open"]).await;
    harness.restrict(1, "rank:5:50");
    harness.spawn(ALICE, "Alice", 1.0);
    harness.spawn(BOB, "Bob", 1.0);
    harness.ranks.set_rank(ALICE, 5, 50);
    harness.ranks.set_rank(BOB, 5, 10);

    assert!(dispatch(&harness, ALICE, HANDLE, "Open").await.succeeded());
    assert!(matches!(
        rejected(dispatch(&harness, BOB, HANDLE, "Open").await),
        Rejection::PermissionDenied(Denial::RankTooLow { rank: 10, .. })
    ));

    harness.advance(Duration::from_secs(1));
    harness.ranks.fail_group(5);
    assert!(matches!(
        rejected(dispatch(&harness, ALICE, HANDLE, "Open").await),
        Rejection::PermissionDenied(Denial::RankLookupFailed { group_id: 5, .. })
    ));
    assert_eq!(count(&calls), 1);
}

#[tokio::test]
async fn failing_handlers_are_isolated() {
    let harness = Harness::new(Vec::new()).await;
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = harness.gatekeeper.registry();
    registry
        .register(
            "Explode",
            ActionData::new(|_: &ActorSnapshot, _: EntityId| -> Result<(), HandlerError> {
                panic!("handler blew up")
            }),
        )
        .unwrap();
    registry
        .register(
            "Jam",
            ActionData::new(|_: &ActorSnapshot, _: EntityId| -> Result<(), HandlerError> {
                Err("door jammed".into())
            }),
        )
        .unwrap();
    registry.register("Open", counting(&calls)).unwrap();
    harness.declare(&["Explode", "Jam", "Open"]);
    harness.spawn(ALICE, "Alice", 1.0);

    assert_eq!(
        dispatch(&harness, ALICE, HANDLE, "Explode").await,
        DispatchOutcome::Dispatched {
            root: DOOR,
            success: false
        }
    );
    assert_eq!(
        dispatch(&harness, ALICE, HANDLE, "Jam").await,
        DispatchOutcome::Dispatched {
            root: DOOR,
            success: false
        }
    );
    assert!(dispatch(&harness, ALICE, HANDLE, "Open").await.succeeded());
    assert_eq!(count(&calls), 1);
}

#[tokio::test]
async fn cooldown_is_stamped_even_when_a_later_gate_rejects() {
    let (harness, calls) = harness_with(&["Open"]).await;
    harness.spawn(ALICE, "Alice", 25.0);

    assert!(matches!(
        rejected(dispatch(&harness, ALICE, HANDLE, "Open").await),
        Rejection::OutOfRange { .. }
    ));

    harness.spawn(ALICE, "Alice", 1.0);
    assert_eq!(
        rejected(dispatch(&harness, ALICE, HANDLE, "Open").await),
        Rejection::OnCooldown
    );

    harness.advance(Duration::from_millis(500));
    assert!(dispatch(&harness, ALICE, HANDLE, "Open").await.succeeded());
    assert_eq!(count(&calls), 1);
}

#[tokio::test]
async fn concurrent_duplicates_dispatch_once() {
    let (harness, calls) = harness_with(&["Open"]).await;
    harness.restrict(1, "rank:5:1");
    harness.spawn(ALICE, "Alice", 1.0);
    harness.ranks.set_rank(ALICE, 5, 1);

    let request = InteractionRequest::new(ALICE, HANDLE, "Open");
    let (a, b) = tokio::join!(
        harness.gatekeeper.dispatch(&request),
        harness.gatekeeper.dispatch(&request)
    );

    let successes = [a, b].iter().filter(|outcome| outcome.succeeded()).count();
    assert_eq!(successes, 1);
    assert_eq!(count(&calls), 1);
}

#[tokio::test]
async fn departure_clears_cooldowns() {
    let (harness, calls) = harness_with(&["Open"]).await;
    harness.spawn(ALICE, "Alice", 1.0);

    assert!(dispatch(&harness, ALICE, HANDLE, "Open").await.succeeded());
    assert_eq!(
        rejected(dispatch(&harness, ALICE, HANDLE, "Open").await),
        Rejection::OnCooldown
    );

    harness.gatekeeper.on_actor_departed(ALICE);
    assert!(dispatch(&harness, ALICE, HANDLE, "Open").await.succeeded());
    assert_eq!(count(&calls), 2);
}

#[tokio::test]
async fn attribute_edits_become_visible_after_cache_lifetime() {
    let (harness, calls) = harness_with(&["Open"]).await;
    harness.spawn(ALICE, "Alice", 1.0);

    assert!(dispatch(&harness, ALICE, HANDLE, "Open").await.succeeded());
    harness.restrict(1, "team:Police");

    harness.advance(Duration::from_millis(500));
    assert!(dispatch(&harness, ALICE, HANDLE, "Open").await.succeeded());

    harness.advance(Duration::from_millis(500));
    assert!(matches!(
        rejected(dispatch(&harness, ALICE, HANDLE, "Open").await),
        Rejection::PermissionDenied(Denial::WrongTeam { .. })
    ));

    harness.gatekeeper.on_entity_destroyed(DOOR);
    assert_eq!(count(&calls), 2);
}
