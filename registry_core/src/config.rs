//! Recognized configuration options.
//!
//! A small typed struct loaded once at startup, not re-derived per request.
//! Values come from environment variables with sane defaults so the engine
//! is usable without any external configuration system.

use std::env;
use std::time::Duration;

/// Per-team caps and tunables. One instance is shared (read-only) across
/// all requests.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub max_services_per_team: usize,
    pub max_solutions_per_team: usize,
    pub max_workstation_profiles_per_team: usize,
    pub max_dependencies_per_service: usize,
    pub health_probe_timeout: Duration,
    pub seed_team_id: Option<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            max_services_per_team: 500,
            max_solutions_per_team: 100,
            max_workstation_profiles_per_team: 50,
            max_dependencies_per_service: 100,
            health_probe_timeout: Duration::from_secs(5),
            seed_team_id: None,
        }
    }
}

impl RegistryConfig {
    /// Load from environment, falling back to `Default::default()` for any
    /// variable that is unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = RegistryConfig::default();
        RegistryConfig {
            max_services_per_team: env_usize("MAX_SERVICES_PER_TEAM", defaults.max_services_per_team),
            max_solutions_per_team: env_usize("MAX_SOLUTIONS_PER_TEAM", defaults.max_solutions_per_team),
            max_workstation_profiles_per_team: env_usize(
                "MAX_WORKSTATION_PROFILES_PER_TEAM",
                defaults.max_workstation_profiles_per_team,
            ),
            max_dependencies_per_service: env_usize(
                "MAX_DEPENDENCIES_PER_SERVICE",
                defaults.max_dependencies_per_service,
            ),
            health_probe_timeout: Duration::from_millis(env_usize(
                "HEALTH_PROBE_TIMEOUT_MS",
                defaults.health_probe_timeout.as_millis() as usize,
            ) as u64),
            seed_team_id: env::var("SEED_TEAM_ID").ok(),
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_caps() {
        let c = RegistryConfig::default();
        assert_eq!(c.max_services_per_team, 500);
        assert_eq!(c.max_solutions_per_team, 100);
        assert_eq!(c.max_workstation_profiles_per_team, 50);
        assert_eq!(c.max_dependencies_per_service, 100);
        assert_eq!(c.health_probe_timeout, Duration::from_secs(5));
    }

    #[test]
    fn env_usize_falls_back_on_unset_or_unparsable() {
        assert_eq!(env_usize("REGISTRY_CONFIG_TEST_UNSET_KEY", 42), 42);
    }
}
