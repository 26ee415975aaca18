//! Record types for the registry's data model.
//!
//! Closed classifications (service type, port type, dependency type, ...)
//! are tagged Rust enums rather than raw strings, per the "sum-typed enums"
//! note: they parse to/from `SCREAMING_SNAKE_CASE` at the JSON boundary but
//! are matched exhaustively everywhere internally.

mod dependency;
mod enums;
mod infra;
mod port;
mod route;
mod service;
mod solution;
mod template;
mod workstation;

pub use dependency::ServiceDependency;
pub use enums::{
    ConfigSource, DependencyType, HealthStatus, MemberRole, PortType, ResourceType,
    ServiceLifecycle, ServiceType, SolutionCategory, SolutionStatus, TemplateType,
};
pub use infra::InfraResource;
pub use port::{PortAllocation, PortRange};
pub use route::ApiRoute;
pub use service::{EnvironmentConfig, Service};
pub use solution::{Solution, SolutionMember};
pub use template::ConfigTemplate;
pub use workstation::WorkstationProfile;

use chrono::{DateTime, Utc};

/// Timestamps every durable record carries.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct Timestamps {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Timestamps {
    pub fn now() -> Self {
        let now = Utc::now();
        Timestamps {
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
