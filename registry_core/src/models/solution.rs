use serde::{Deserialize, Serialize};

use super::{MemberRole, SolutionCategory, SolutionStatus, Timestamps};
use crate::ids::{Id, TeamId};
use crate::models::Service;

/// A named, ordered grouping of services forming an application or
/// platform. Holds its members through `SolutionMember`, ordered by
/// `display_order`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Solution {
    pub id: Id<Solution>,
    pub team_id: TeamId,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub category: SolutionCategory,
    pub status: SolutionStatus,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub creator: String,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

/// `(solution, service)` unique. Deleting the solution cascades here;
/// removing a member never deletes the underlying service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionMember {
    pub id: Id<SolutionMember>,
    pub solution_id: Id<Solution>,
    pub service_id: Id<Service>,
    pub role: MemberRole,
    pub display_order: i64,
    pub notes: Option<String>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}
