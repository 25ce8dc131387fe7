use std::time::Duration;

/// Gatekeeper configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GatekeeperConfig {
    /// Maximum straight-line distance between an actor's anchor and the root.
    pub max_interaction_distance: f64,
    /// How long a cached attribute snapshot stays valid, in seconds.
    pub cache_lifetime_secs: f64,
    /// Period of the background cache sweep, in seconds.
    pub sweep_interval_secs: f64,
    /// Entries older than `sweep_age_factor * cache_lifetime` are purged by the sweep.
    pub sweep_age_factor: u32,
    /// Cooldown applied to actions that do not override it, in seconds.
    pub default_cooldown_secs: f64,
    /// Teams whose members may not interact at all.
    pub punitive_teams: Vec<String>,
    /// Capacity of the observability event channel.
    pub event_buffer_size: usize,
    /// Spawn the periodic cache sweep when the gatekeeper is built.
    pub enable_sweeper: bool,
}

impl GatekeeperConfig {
    // ===== compile-time constants =====
    /// Highest `ActionN` slot scanned on an interaction root.
    pub const MAX_ACTION_SLOTS: usize = 20;
    /// Longest accepted action name, in bytes.
    pub const MAX_ACTION_NAME_LEN: usize = 100;
    /// Number of nodes (self included) inspected while resolving an interaction root.
    pub const MAX_ROOT_DEPTH: usize = 10;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_MAX_DISTANCE: f64 = 20.0;
    pub const DEFAULT_CACHE_LIFETIME_SECS: f64 = 1.0;
    pub const DEFAULT_SWEEP_INTERVAL_SECS: f64 = 60.0;
    pub const DEFAULT_SWEEP_AGE_FACTOR: u32 = 10;
    pub const DEFAULT_COOLDOWN_SECS: f64 = 0.5;
    pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 128;

    pub fn new() -> Self {
        Self {
            max_interaction_distance: Self::DEFAULT_MAX_DISTANCE,
            cache_lifetime_secs: Self::DEFAULT_CACHE_LIFETIME_SECS,
            sweep_interval_secs: Self::DEFAULT_SWEEP_INTERVAL_SECS,
            sweep_age_factor: Self::DEFAULT_SWEEP_AGE_FACTOR,
            default_cooldown_secs: Self::DEFAULT_COOLDOWN_SECS,
            punitive_teams: vec!["Prisoners".to_string()],
            event_buffer_size: Self::DEFAULT_EVENT_BUFFER_SIZE,
            enable_sweeper: true,
        }
    }

    pub fn cache_lifetime(&self) -> Duration {
        secs_or(self.cache_lifetime_secs, Self::DEFAULT_CACHE_LIFETIME_SECS)
    }

    pub fn sweep_interval(&self) -> Duration {
        secs_or(self.sweep_interval_secs, Self::DEFAULT_SWEEP_INTERVAL_SECS)
    }

    /// Age after which the sweep drops an entry regardless of entity liveness.
    pub fn sweep_max_age(&self) -> Duration {
        self.cache_lifetime()
            .saturating_mul(self.sweep_age_factor.max(1))
    }

    pub fn default_cooldown(&self) -> Duration {
        secs_or(self.default_cooldown_secs, Self::DEFAULT_COOLDOWN_SECS)
    }

    pub fn is_punitive_team(&self, team: &str) -> bool {
        self.punitive_teams.iter().any(|t| t == team)
    }
}

impl Default for GatekeeperConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts a seconds value into a duration, substituting `fallback` for
/// negative, NaN or infinite input.
fn secs_or(secs: f64, fallback: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or_else(|_| Duration::from_secs_f64(fallback))
}
