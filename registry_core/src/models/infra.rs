use serde::{Deserialize, Serialize};

use super::{ResourceType, Timestamps};
use crate::ids::{Id, TeamId};
use crate::models::Service;

/// An external resource, optionally owned by a service. `service_id ==
/// None` means orphaned. See `crate::infra::find_orphaned`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfraResource {
    pub id: Id<InfraResource>,
    pub team_id: TeamId,
    pub service_id: Option<Id<Service>>,
    pub resource_type: ResourceType,
    pub name: String,
    pub environment: String,
    pub region: Option<String>,
    pub arn_or_url: Option<String>,
    pub config: Option<String>,
    pub creator: String,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}
