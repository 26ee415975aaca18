use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{HealthStatus, ServiceLifecycle, ServiceType, Timestamps};
use crate::ids::{Id, TeamId};

/// A registered runnable or library unit.
///
/// Deletion is blocked if the service is a member of any solution, or if
/// any *required* inbound dependency edge exists. See
/// `crate::store::Store::delete_service`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: Id<Service>,
    pub team_id: TeamId,

    pub display_name: String,
    /// Team-unique, `[a-z0-9-]+`. See `crate::slug`.
    pub slug: String,
    pub service_type: ServiceType,

    pub repo_url: Option<String>,
    pub branch: Option<String>,
    pub tech_stack: Option<String>,
    pub description: Option<String>,

    pub status: ServiceLifecycle,

    pub health_check_url: Option<String>,
    pub poll_interval_seconds: Option<u32>,
    pub last_health_status: HealthStatus,
    pub last_health_check_at: Option<chrono::DateTime<chrono::Utc>>,

    #[serde(default)]
    pub environment: BTreeMap<String, String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,

    pub creator: String,

    #[serde(flatten)]
    pub timestamps: Timestamps,
}

/// (service, environment, key) unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentConfig {
    pub id: Id<EnvironmentConfig>,
    pub service_id: Id<Service>,
    pub environment: String,
    pub key: String,
    pub value: String,
    pub source: super::ConfigSource,
    pub description: Option<String>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}
