//! The dispatch pipeline.
//!
//! A request passes nine gates in a fixed order and the first failing gate
//! ends it:
//!
//! 1. sanity (actor known, target in the world, action name length)
//! 2. eligibility (not restrained, avatar present, alive when required)
//! 3. cooldown, stamped before anything that can yield
//! 4. interaction root resolution
//! 5. distance between the avatar and the root
//! 6. the action is declared on the root
//! 7. the action has a registered handler
//! 8. the action's own permission hook, then the root's restriction
//! 9. handler invocation
//!
//! No error escapes [`Dispatcher::dispatch`]; every outcome is a
//! [`DispatchOutcome`] value.

mod rejection;

pub use rejection::{Rejection, Severity};

use std::sync::Arc;

use interaction_core::{ActorId, ActorSnapshot, EntityId, GatekeeperConfig};
use tracing::{info, warn};

use crate::cache::AttributeCache;
use crate::clock::Clock;
use crate::cooldown::CooldownThrottle;
use crate::events::{DispatchRecord, EventBus, GatekeeperEvent, SecurityEvent, SecurityKind};
use crate::oracle::OracleManager;
use crate::permission::PermissionEvaluator;
use crate::registry::ActionRegistry;
use crate::resolver::RootResolver;

/// A client's request to perform `action` on `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionRequest {
    pub actor: ActorId,
    pub target: EntityId,
    pub action: String,
}

impl InteractionRequest {
    pub fn new(actor: ActorId, target: EntityId, action: impl Into<String>) -> Self {
        Self {
            actor,
            target,
            action: action.into(),
        }
    }
}

/// What happened to a request.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// The handler ran; `success` is false if it failed or panicked.
    Dispatched { root: EntityId, success: bool },
    Rejected(Rejection),
}

impl DispatchOutcome {
    /// True only when the handler ran and completed.
    pub fn succeeded(&self) -> bool {
        matches!(self, DispatchOutcome::Dispatched { success: true, .. })
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            DispatchOutcome::Rejected(rejection) => Some(rejection),
            DispatchOutcome::Dispatched { .. } => None,
        }
    }
}

/// Owns every gate component and runs requests through them.
pub struct Dispatcher {
    oracles: OracleManager,
    config: GatekeeperConfig,
    cache: Arc<AttributeCache>,
    resolver: RootResolver,
    evaluator: PermissionEvaluator,
    throttle: CooldownThrottle,
    registry: Arc<ActionRegistry>,
    events: EventBus,
}

impl Dispatcher {
    pub fn new(
        oracles: OracleManager,
        config: GatekeeperConfig,
        clock: Arc<dyn Clock>,
        registry: Arc<ActionRegistry>,
        events: EventBus,
    ) -> Self {
        let cache = Arc::new(AttributeCache::new(
            oracles.world().clone(),
            clock.clone(),
            config.cache_lifetime(),
        ));
        let resolver = RootResolver::new(cache.clone(), oracles.world().clone());
        let evaluator = PermissionEvaluator::new(cache.clone(), oracles.ranks().clone());
        let throttle = CooldownThrottle::new(registry.clone(), clock, config.default_cooldown());

        Self {
            oracles,
            config,
            cache,
            resolver,
            evaluator,
            throttle,
            registry,
            events,
        }
    }

    pub fn cache(&self) -> &Arc<AttributeCache> {
        &self.cache
    }

    pub fn throttle(&self) -> &CooldownThrottle {
        &self.throttle
    }

    pub fn registry(&self) -> &Arc<ActionRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &GatekeeperConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Runs `request` through every gate and, if all pass, its handler.
    pub async fn dispatch(&self, request: &InteractionRequest) -> DispatchOutcome {
        match self.run_gates(request).await {
            Ok((actor, root)) => self.invoke(request, &actor, root),
            Err(rejection) => {
                if rejection.severity() == Severity::Configuration {
                    warn!(
                        target: "interaction::dispatch",
                        actor = %request.actor,
                        action = %request.action,
                        "action declared on a root but not registered"
                    );
                }
                DispatchOutcome::Rejected(rejection)
            }
        }
    }

    async fn run_gates(
        &self,
        request: &InteractionRequest,
    ) -> Result<(ActorSnapshot, EntityId), Rejection> {
        let actor = self.check_sanity(request)?;
        self.check_eligibility(&actor, &request.action)?;

        if self.throttle.check_and_stamp(actor.id, &request.action) {
            return Err(Rejection::OnCooldown);
        }

        let root = self
            .resolver
            .resolve(request.target)
            .ok_or(Rejection::NoInteractionRoot)?;

        self.check_distance(request, &actor, root)?;

        if !self.cache.get(root).declares(&request.action) {
            return Err(self.flag(
                SecurityEvent::new(
                    SecurityKind::UndeclaredAction,
                    request.actor,
                    request.target,
                    &request.action,
                ),
                Rejection::ActionNotDeclared,
            ));
        }

        let record = self
            .registry
            .get_data(&request.action)
            .ok_or(Rejection::ActionNotRegistered)?;

        if !record.hook_permits(&actor, root) {
            return Err(Rejection::PermissionHookDenied);
        }
        self.evaluator
            .evaluate(&actor, root, &request.action)
            .await?;

        Ok((actor, root))
    }

    fn check_sanity(&self, request: &InteractionRequest) -> Result<ActorSnapshot, Rejection> {
        let security = |kind| {
            SecurityEvent::new(kind, request.actor, request.target, &request.action)
        };

        let Some(actor) = self.oracles.actors().actor(request.actor) else {
            return Err(self.flag(security(SecurityKind::UnknownActor), Rejection::UnknownActor));
        };
        if !self.oracles.world().is_reachable(request.target) {
            return Err(self.flag(
                security(SecurityKind::UnreachableTarget),
                Rejection::UnreachableTarget,
            ));
        }
        let len = request.action.len();
        if len == 0 || len > GatekeeperConfig::MAX_ACTION_NAME_LEN {
            return Err(self.flag(
                security(SecurityKind::InvalidActionName),
                Rejection::InvalidActionName { len },
            ));
        }
        Ok(actor)
    }

    fn check_eligibility(&self, actor: &ActorSnapshot, action: &str) -> Result<(), Rejection> {
        if actor.is_restrained()
            || actor
                .team_name()
                .is_some_and(|team| self.config.is_punitive_team(team))
        {
            return Err(Rejection::Incapacitated);
        }
        let avatar = actor.avatar.as_ref().ok_or(Rejection::NoAvatar)?;
        let requires_alive = self
            .registry
            .get_data(action)
            .is_none_or(|record| record.requires_alive);
        if requires_alive && !avatar.is_alive() {
            return Err(Rejection::Dead);
        }
        Ok(())
    }

    fn check_distance(
        &self,
        request: &InteractionRequest,
        actor: &ActorSnapshot,
        root: EntityId,
    ) -> Result<(), Rejection> {
        let anchor = actor
            .avatar
            .as_ref()
            .and_then(|avatar| avatar.anchor)
            .ok_or(Rejection::NoPositionAnchor)?;
        let position = self
            .oracles
            .world()
            .position(root)
            .ok_or(Rejection::NoRootPosition)?;

        let max = self.config.max_interaction_distance;
        let distance = anchor.distance(&position);
        if distance <= max {
            return Ok(());
        }

        let suspicious = distance > max * 2.0;
        let rejection = Rejection::OutOfRange {
            distance,
            suspicious,
        };
        if suspicious {
            return Err(self.flag(
                SecurityEvent::new(
                    SecurityKind::DistanceAnomaly,
                    request.actor,
                    request.target,
                    &request.action,
                )
                .with_distance(distance),
                rejection,
            ));
        }
        Err(rejection)
    }

    fn invoke(
        &self,
        request: &InteractionRequest,
        actor: &ActorSnapshot,
        root: EntityId,
    ) -> DispatchOutcome {
        let success = self.registry.execute(&request.action, actor, root);

        info!(
            target: "interaction::dispatch",
            actor = %actor.id,
            action = %request.action,
            root = %root,
            success,
            "action dispatched"
        );
        self.events.publish(GatekeeperEvent::Dispatched(DispatchRecord {
            actor: actor.id,
            action: request.action.clone(),
            root,
            success,
        }));

        DispatchOutcome::Dispatched { root, success }
    }

    /// Logs and publishes a security observation, returning `rejection`.
    fn flag(&self, event: SecurityEvent, rejection: Rejection) -> Rejection {
        warn!(
            target: "interaction::security",
            kind = event.kind.as_ref(),
            actor = %event.actor,
            target_entity = %event.target,
            action = %event.action,
            distance = event.distance,
            reason = %rejection,
            "suspicious interaction request"
        );
        self.events.publish(GatekeeperEvent::Security(event));
        rejection
    }
}
