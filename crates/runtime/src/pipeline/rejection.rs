use thiserror::Error;

use crate::permission::Denial;

/// How a rejection should be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Malformed or adversarial input. Logged on `interaction::security`.
    Security,
    /// Server misconfiguration, not the client's fault.
    Configuration,
    /// Ordinary gameplay outcome. Not logged.
    Expected,
}

/// Why a request never reached its handler.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("requesting actor is unknown")]
    UnknownActor,

    #[error("target is not part of the world")]
    UnreachableTarget,

    #[error("action name length {len} is outside 1..=100 bytes")]
    InvalidActionName { len: usize },

    #[error("actor is restrained or on a punitive team")]
    Incapacitated,

    #[error("actor has no avatar")]
    NoAvatar,

    #[error("actor is dead")]
    Dead,

    #[error("action is on cooldown")]
    OnCooldown,

    #[error("target has no interaction root")]
    NoInteractionRoot,

    #[error("actor avatar has no position anchor")]
    NoPositionAnchor,

    #[error("interaction root has no position")]
    NoRootPosition,

    #[error("target is {distance:.2} units away")]
    OutOfRange { distance: f64, suspicious: bool },

    #[error("action is not declared on the interaction root")]
    ActionNotDeclared,

    #[error("action is declared but has no registered handler")]
    ActionNotRegistered,

    #[error("action permission hook refused the actor")]
    PermissionHookDenied,

    #[error(transparent)]
    PermissionDenied(#[from] Denial),
}

impl Rejection {
    pub fn severity(&self) -> Severity {
        match self {
            Rejection::UnknownActor
            | Rejection::UnreachableTarget
            | Rejection::InvalidActionName { .. }
            | Rejection::ActionNotDeclared
            | Rejection::OutOfRange {
                suspicious: true, ..
            } => Severity::Security,
            Rejection::ActionNotRegistered => Severity::Configuration,
            _ => Severity::Expected,
        }
    }

    pub fn is_security(&self) -> bool {
        self.severity() == Severity::Security
    }
}
