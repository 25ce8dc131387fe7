//! Observability events published by the gatekeeper.
//!
//! Logs are the primary sink; these events carry the same facts in a typed,
//! serializable form so an embedding server can forward them (for example to
//! an anti-cheat pipeline) without parsing log lines.

use serde::Serialize;
use strum::{AsRefStr, IntoStaticStr};
use tokio::sync::broadcast;

use interaction_core::{ActorId, EntityId};

use crate::registry::LoadSummary;

/// Everything the gatekeeper reports to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatekeeperEvent {
    Security(SecurityEvent),
    Dispatched(DispatchRecord),
    RegistryLoaded(LoadSummary),
}

/// Category of a security-tier observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SecurityKind {
    UnknownActor,
    UnreachableTarget,
    InvalidActionName,
    DistanceAnomaly,
    UndeclaredAction,
}

/// A request that looked malformed or adversarial.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecurityEvent {
    pub kind: SecurityKind,
    pub actor: ActorId,
    pub target: EntityId,
    /// Requested action name, truncated for oversized input.
    pub action: String,
    /// Measured distance for spatial anomalies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl SecurityEvent {
    /// Longest action name carried verbatim in an event.
    pub const ACTION_PREVIEW_LEN: usize = 64;

    pub fn new(kind: SecurityKind, actor: ActorId, target: EntityId, action: &str) -> Self {
        Self {
            kind,
            actor,
            target,
            action: preview(action),
            distance: None,
        }
    }

    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = Some(distance);
        self
    }
}

/// Outcome of a request that reached the handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchRecord {
    pub actor: ActorId,
    pub action: String,
    pub root: EntityId,
    pub success: bool,
}

/// Best-effort broadcast of [`GatekeeperEvent`]s.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<GatekeeperEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publishes `event`; having no subscribers is normal.
    pub fn publish(&self, event: GatekeeperEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GatekeeperEvent> {
        self.tx.subscribe()
    }
}

fn preview(action: &str) -> String {
    if action.len() <= SecurityEvent::ACTION_PREVIEW_LEN {
        return action.to_string();
    }
    let mut end = SecurityEvent::ACTION_PREVIEW_LEN;
    while !action.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &action[..end])
}
