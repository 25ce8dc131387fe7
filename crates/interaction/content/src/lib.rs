//! Data-driven gatekeeper content and loaders.
//!
//! This crate provides loaders for the files that shape a gatekeeper at startup:
//! - Gatekeeper tuning (data-driven via TOML)
//! - Action manifest (data-driven via RON)
//!
//! Content is consumed when the runtime is built and never changes afterwards.
//! All loaders use interaction-core types directly with serde.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{ConfigLoader, LoadResult, ManifestLoader};
