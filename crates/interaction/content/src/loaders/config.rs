//! Gatekeeper configuration loader.

use std::path::Path;

use interaction_core::GatekeeperConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for gatekeeper configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    ///
    /// Keys missing from the file keep their [`GatekeeperConfig::default`] values.
    pub fn load(path: &Path) -> LoadResult<GatekeeperConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    /// Parse config data from TOML text.
    pub fn parse(content: &str) -> LoadResult<GatekeeperConfig> {
        let config: GatekeeperConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;

        Ok(config)
    }

    /// The configuration shipped with the crate.
    pub fn embedded() -> LoadResult<GatekeeperConfig> {
        Self::parse(include_str!("../../data/gatekeeper.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn embedded_config_matches_defaults() {
        assert_eq!(ConfigLoader::embedded().unwrap(), GatekeeperConfig::default());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_interaction_distance = 12.5").unwrap();
        writeln!(file, "punitive_teams = []").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();

        assert_eq!(config.max_interaction_distance, 12.5);
        assert!(config.punitive_teams.is_empty());
        assert_eq!(
            config.default_cooldown_secs,
            GatekeeperConfig::DEFAULT_COOLDOWN_SECS
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ConfigLoader::load(&dir.path().join("absent.toml")).is_err());
    }
}
