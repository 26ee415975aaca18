use serde::{Deserialize, Serialize};

use super::{TemplateType, Timestamps};
use crate::ids::{Id, TeamId};
use crate::models::Service;

/// `(service, type, environment)` unique. `version` increases strictly on
/// every regeneration of the same key. See `crate::templates::upsert`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigTemplate {
    pub id: Id<ConfigTemplate>,
    pub team_id: TeamId,
    pub service_id: Id<Service>,
    pub template_type: TemplateType,
    pub environment: String,
    pub content: String,
    pub auto_generated: bool,
    pub generated_from: String,
    pub version: u32,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}
