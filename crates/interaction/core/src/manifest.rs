//! Startup manifest naming which action modules to load.
//!
//! The manifest replaces runtime module discovery: every action the server
//! offers is listed here, optionally with metadata overrides, and resolved
//! against a compile-time catalog by the runtime.

/// List of action modules to load at startup.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionManifest {
    #[cfg_attr(feature = "serde", serde(default))]
    pub actions: Vec<ManifestEntry>,
}

impl ActionManifest {
    pub fn new(actions: Vec<ManifestEntry>) -> Self {
        Self { actions }
    }

    /// Entries that should be loaded.
    pub fn enabled(&self) -> impl Iterator<Item = &ManifestEntry> + '_ {
        self.actions.iter().filter(|entry| entry.enabled)
    }
}

/// One manifest line.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ManifestEntry {
    /// Catalog name of the module.
    pub name: String,
    /// Overrides the module's own cooldown, in seconds.
    #[cfg_attr(feature = "serde", serde(default))]
    pub cooldown_seconds: Option<f64>,
    /// Overrides the module's own liveness requirement.
    #[cfg_attr(feature = "serde", serde(default))]
    pub requires_alive: Option<bool>,
    #[cfg_attr(feature = "serde", serde(default = "enabled_by_default"))]
    pub enabled: bool,
}

#[cfg(feature = "serde")]
fn enabled_by_default() -> bool {
    true
}

impl ManifestEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cooldown_seconds: None,
            requires_alive: None,
            enabled: true,
        }
    }

    pub fn with_cooldown(mut self, seconds: f64) -> Self {
        self.cooldown_seconds = Some(seconds);
        self
    }

    pub fn with_requires_alive(mut self, requires_alive: bool) -> Self {
        self.requires_alive = Some(requires_alive);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Checks the entry's own fields; catalog membership is checked by the runtime.
    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.name.trim().is_empty() {
            return Err(ManifestError::EmptyName);
        }
        if let Some(seconds) = self.cooldown_seconds
            && !(seconds.is_finite() && seconds >= 0.0)
        {
            return Err(ManifestError::InvalidCooldown {
                name: self.name.clone(),
                seconds,
            });
        }
        Ok(())
    }
}

/// Problems with an individual manifest entry.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ManifestError {
    #[error("manifest entry has an empty name")]
    EmptyName,

    #[error("manifest entry {name:?} has invalid cooldown {seconds}")]
    InvalidCooldown { name: String, seconds: f64 },
}
