use serde::{Deserialize, Serialize};

use super::Timestamps;
use crate::ids::{Id, TeamId};
use crate::models::{Service, Solution};

/// A developer-machine bundle: an explicit service set plus a startup
/// order cached from the dependency graph at last (re)compute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkstationProfile {
    pub id: Id<WorkstationProfile>,
    pub team_id: TeamId,
    /// Team-unique.
    pub name: String,
    pub description: Option<String>,
    pub source_solution_id: Option<Id<Solution>>,
    pub service_ids: Vec<Id<Service>>,
    pub startup_order: Vec<Id<Service>>,
    pub is_default: bool,
    pub creator: String,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}
