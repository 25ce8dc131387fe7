//! Action manifest loader.
//!
//! Loads the list of action modules to register from RON data files.

use std::path::Path;

use interaction_core::ActionManifest;

use crate::loaders::{LoadResult, read_file};

/// Loader for [`ActionManifest`] files.
pub struct ManifestLoader;

impl ManifestLoader {
    /// Load a manifest from a RON file.
    pub fn load(path: &Path) -> LoadResult<ActionManifest> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("{} ({})", e, path.display()))
    }

    /// Parse a manifest from RON text.
    ///
    /// Entry-level problems (bad cooldowns, unknown names) are not rejected
    /// here; the registry counts them as failed candidates so one bad line
    /// cannot block the rest.
    pub fn parse(content: &str) -> LoadResult<ActionManifest> {
        ron::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse manifest RON: {}", e))
    }

    /// The manifest shipped with the crate.
    pub fn embedded() -> LoadResult<ActionManifest> {
        Self::parse(include_str!("../../data/manifest.ron"))
    }
}
