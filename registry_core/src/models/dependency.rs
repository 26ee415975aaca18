use serde::{Deserialize, Serialize};

use super::{DependencyType, Timestamps};
use crate::ids::{Id, TeamId};
use crate::models::Service;

/// A directed "source depends on target" edge. `(source, target, type)` is
/// unique; the induced graph over a team must stay acyclic. See
/// `crate::graph`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDependency {
    pub id: Id<ServiceDependency>,
    pub team_id: TeamId,
    pub source_id: Id<Service>,
    pub target_id: Id<Service>,
    pub dependency_type: DependencyType,
    pub description: Option<String>,
    pub is_required: bool,
    pub endpoint: Option<String>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}
