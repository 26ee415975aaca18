use serde::{Deserialize, Serialize};

use super::{PortType, Timestamps};
use crate::ids::{Id, TeamId};
use crate::models::Service;

/// (team, environment, port-number) unique. Cascade-deletes with its
/// owning service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortAllocation {
    pub id: Id<PortAllocation>,
    pub team_id: TeamId,
    pub service_id: Id<Service>,
    pub environment: String,
    pub port_type: PortType,
    pub port_number: u32,
    pub protocol: String,
    pub auto_allocated: bool,
    pub allocator: String,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

/// (team, port-type, environment) unique. Governs the auto-allocation
/// search space for that triple.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortRange {
    pub id: Id<PortRange>,
    pub team_id: TeamId,
    pub port_type: PortType,
    pub environment: String,
    pub start: u32,
    pub end: u32,
    pub description: Option<String>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl PortRange {
    pub fn contains(&self, port: u32) -> bool {
        port >= self.start && port <= self.end
    }
}
