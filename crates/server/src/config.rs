//! Environment-driven server settings.

use std::env;
use std::path::PathBuf;

use anyhow::Result;
use interaction_content::{ConfigLoader, ManifestLoader};
use interaction_core::{ActionManifest, GatekeeperConfig};

#[derive(Clone, Debug, Default)]
pub struct ServerConfig {
    /// TOML gatekeeper config; the embedded defaults are used when unset.
    pub config_path: Option<PathBuf>,
    /// RON action manifest; the embedded manifest is used when unset.
    pub manifest_path: Option<PathBuf>,
    /// Overrides `max_interaction_distance` from the config file.
    pub max_distance: Option<f64>,
    /// Print gatekeeper events to stdout as JSON lines.
    pub json_events: bool,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.config_path = env::var("GATEKEEPER_CONFIG").ok().map(PathBuf::from);
        config.manifest_path = env::var("GATEKEEPER_MANIFEST").ok().map(PathBuf::from);
        config.max_distance = read_env::<f64>("GATEKEEPER_MAX_DISTANCE");

        if let Some(enable) = read_env::<bool>("GATEKEEPER_JSON_EVENTS") {
            config.json_events = enable;
        } else if env::var("GATEKEEPER_JSON_EVENTS").is_ok() {
            config.json_events = true;
        }

        config
    }

    pub fn gatekeeper_config(&self) -> Result<GatekeeperConfig> {
        let mut config = match &self.config_path {
            Some(path) => ConfigLoader::load(path)?,
            None => ConfigLoader::embedded()?,
        };
        if let Some(distance) = self.max_distance {
            config.max_interaction_distance = distance;
        }
        Ok(config)
    }

    pub fn manifest(&self) -> Result<ActionManifest> {
        match &self.manifest_path {
            Some(path) => ManifestLoader::load(path),
            None => ManifestLoader::embedded(),
        }
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
