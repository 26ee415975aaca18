use serde::{Deserialize, Serialize};

use super::Timestamps;
use crate::ids::{Id, TeamId};
use crate::models::Service;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRoute {
    pub id: Id<ApiRoute>,
    pub team_id: TeamId,
    pub service_id: Id<Service>,
    pub gateway_id: Option<Id<Service>>,
    /// Normalized by `crate::routes::normalize`.
    pub prefix: String,
    /// Comma-delimited HTTP methods, e.g. `"GET,POST"`.
    pub methods: String,
    pub environment: String,
    pub description: Option<String>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}
