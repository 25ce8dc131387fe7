//! Pure data model for server-authoritative world-object interaction.
//!
//! `interaction-core` defines the types every other crate agrees on: entity and
//! actor identities, typed attribute snapshots, restriction expressions, the
//! action manifest, and the read-only oracle traits through which the world is
//! observed. Nothing here performs I/O or holds shared state; the runtime crate
//! layers caching, throttling and dispatch on top.
pub mod attributes;
pub mod config;
pub mod env;
pub mod manifest;
pub mod restriction;
pub mod state;

pub use attributes::{ActionSlot, AttributeMap, AttributeSnapshot, AttributeValue};
pub use config::GatekeeperConfig;
pub use env::{ActorOracle, WorldOracle};
pub use manifest::{ActionManifest, ManifestEntry, ManifestError};
pub use restriction::{Restriction, RestrictionKind};
pub use state::{ActorId, ActorSnapshot, ActorStatus, AvatarState, EntityId, Position};
