//! Identities and read-only views of world participants.
use std::fmt;

use bitflags::bitflags;

/// Opaque reference to a world object. The world owns every entity; this
/// crate never creates or destroys one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of a connected requesting party.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorId(pub u64);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor:{}", self.0)
    }
}

/// Continuous world-space position.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const ORIGIN: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Straight-line distance to `other`.
    pub fn distance(&self, other: &Position) -> f64 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

bitflags! {
    /// Incapacitation markers carried by an actor.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct ActorStatus: u8 {
        const ARRESTED = 1 << 0;
        const CUFFED   = 1 << 1;
    }
}

/// The actor's in-world body.
#[derive(Clone, Debug, PartialEq)]
pub struct AvatarState {
    pub health: f64,
    /// Root part used for distance checks; absent while the body is rebuilding.
    pub anchor: Option<Position>,
}

impl AvatarState {
    pub fn new(health: f64, anchor: Position) -> Self {
        Self {
            health,
            anchor: Some(anchor),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }
}

/// Point-in-time view of a requesting actor as reported by the world.
#[derive(Clone, Debug, PartialEq)]
pub struct ActorSnapshot {
    pub id: ActorId,
    /// Account name; this is the identity matched by `player:` restrictions.
    pub name: String,
    pub team: Option<String>,
    pub status: ActorStatus,
    pub avatar: Option<AvatarState>,
}

impl ActorSnapshot {
    pub fn new(id: ActorId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            team: None,
            status: ActorStatus::empty(),
            avatar: None,
        }
    }

    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }

    pub fn with_status(mut self, status: ActorStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_avatar(mut self, avatar: AvatarState) -> Self {
        self.avatar = Some(avatar);
        self
    }

    pub fn is_restrained(&self) -> bool {
        self.status
            .intersects(ActorStatus::ARRESTED | ActorStatus::CUFFED)
    }

    pub fn team_name(&self) -> Option<&str> {
        self.team.as_deref()
    }
}
