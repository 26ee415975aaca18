//! Entity Store (C1), service-level half: typed create/update/delete for
//! `Service` and its `EnvironmentConfig` rows, with cascades and deletion
//! guards. Composite lookups used by every other component live on
//! `Tables` in `crate::store`.

use crate::error::{RegistryError, Result};
use crate::ids::{Id, TeamId};
use crate::models::{ConfigSource, EnvironmentConfig, Service, ServiceLifecycle, ServiceType, Timestamps};
use crate::slug::{slugify, unique_slug};
use crate::store::Store;

pub async fn create_service(
    store: &Store,
    team: TeamId,
    display_name: &str,
    service_type: ServiceType,
    repo_url: Option<String>,
    branch: Option<String>,
    tech_stack: Option<String>,
    description: Option<String>,
    health_check_url: Option<String>,
    poll_interval_seconds: Option<u32>,
    creator: &str,
    max_services_per_team: usize,
) -> Result<Service> {
    let display_name = display_name.to_string();
    let creator = creator.to_string();
    store
        .transaction(move |tables| {
            if tables.services_in_team(team).len() >= max_services_per_team {
                return Err(RegistryError::validation(format!(
                    "team has reached the maximum of {} services",
                    max_services_per_team
                )));
            }
            let base = slugify(&display_name);
            let slug = unique_slug(tables, team, &base);
            let service = Service {
                id: Id::new(),
                team_id: team,
                display_name,
                slug,
                service_type,
                repo_url,
                branch,
                tech_stack,
                description,
                status: ServiceLifecycle::Active,
                health_check_url,
                poll_interval_seconds,
                last_health_status: Default::default(),
                last_health_check_at: None,
                environment: Default::default(),
                metadata: Default::default(),
                creator,
                timestamps: Timestamps::now(),
            };
            tables.services.insert(service.id.as_uuid(), service.clone());
            Ok(service)
        })
        .await
}

#[derive(Default)]
pub struct ServiceUpdate {
    pub display_name: Option<String>,
    pub status: Option<ServiceLifecycle>,
    pub repo_url: Option<Option<String>>,
    pub branch: Option<Option<String>>,
    pub tech_stack: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub health_check_url: Option<Option<String>>,
    pub poll_interval_seconds: Option<Option<u32>>,
}

pub async fn update_service(store: &Store, id: Id<Service>, update: ServiceUpdate) -> Result<Service> {
    store
        .transaction(move |tables| {
            let svc = tables
                .services
                .get_mut(&id.as_uuid())
                .ok_or_else(|| RegistryError::not_found(format!("service {} not found", id)))?;
            if let Some(v) = update.display_name {
                svc.display_name = v;
            }
            if let Some(v) = update.status {
                svc.status = v;
            }
            if let Some(v) = update.repo_url {
                svc.repo_url = v;
            }
            if let Some(v) = update.branch {
                svc.branch = v;
            }
            if let Some(v) = update.tech_stack {
                svc.tech_stack = v;
            }
            if let Some(v) = update.description {
                svc.description = v;
            }
            if let Some(v) = update.health_check_url {
                svc.health_check_url = v;
            }
            if let Some(v) = update.poll_interval_seconds {
                svc.poll_interval_seconds = v;
            }
            svc.timestamps.touch();
            Ok(svc.clone())
        })
        .await
}

/// Blocked if the service belongs to any solution, or any *required*
/// inbound dependency targets it. Port allocations cascade-delete.
pub async fn delete_service(store: &Store, id: Id<Service>) -> Result<()> {
    store
        .transaction(move |tables| {
            if !tables.services.contains_key(&id.as_uuid()) {
                return Err(RegistryError::not_found(format!("service {} not found", id)));
            }
            if tables.solution_members.values().any(|m| m.service_id == id) {
                return Err(RegistryError::validation(
                    "cannot delete a service that belongs to solutions",
                ));
            }
            if tables
                .incoming_dependencies(id)
                .iter()
                .any(|d| d.is_required)
            {
                return Err(RegistryError::validation(
                    "cannot delete a service with active dependents",
                ));
            }

            tables.services.remove(&id.as_uuid());
            let allocation_ids: Vec<_> = tables
                .port_allocations
                .values()
                .filter(|a| a.service_id == id)
                .map(|a| a.id.as_uuid())
                .collect();
            for aid in allocation_ids {
                tables.port_allocations.remove(&aid);
            }
            Ok(())
        })
        .await
}

pub async fn set_env_config(
    store: &Store,
    service: Id<Service>,
    environment: &str,
    key: &str,
    value: &str,
    source: ConfigSource,
    description: Option<String>,
) -> Result<EnvironmentConfig> {
    let environment = environment.to_string();
    let key = key.to_string();
    let value = value.to_string();
    store
        .transaction(move |tables| {
            tables.get_service(service)?;
            let existing_id = tables
                .env_configs_for(service, &environment)
                .into_iter()
                .find(|e| e.key == key)
                .map(|e| e.id.as_uuid());
            let entry = if let Some(existing_id) = existing_id {
                let e = tables.env_configs.get_mut(&existing_id).unwrap();
                e.value = value;
                e.source = source;
                e.description = description;
                e.timestamps.touch();
                e.clone()
            } else {
                let e = EnvironmentConfig {
                    id: Id::new(),
                    service_id: service,
                    environment,
                    key,
                    value,
                    source,
                    description,
                    timestamps: Timestamps::now(),
                };
                tables.env_configs.insert(e.id.as_uuid(), e.clone());
                e
            };
            Ok(entry)
        })
        .await
}

pub async fn remove_env_config(store: &Store, id: Id<EnvironmentConfig>) -> Result<()> {
    store
        .transaction(|tables| {
            if tables.env_configs.remove(&id.as_uuid()).is_none() {
                return Err(RegistryError::not_found(format!("environment config {} not found", id)));
            }
            Ok(())
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn slug_collisions_get_numeric_suffixes() {
        let store = Store::new();
        let team = TeamId::new();
        for _ in 0..3 {
            create_service(
                &store,
                team,
                "Billing Service",
                ServiceType::SpringBoot,
                None,
                None,
                None,
                None,
                None,
                None,
                "tester",
                500,
            )
            .await
            .unwrap();
        }
        let slugs: std::collections::BTreeSet<String> = store
            .read(|tables| tables.services_in_team(team).into_iter().map(|s| s.slug.clone()).collect())
            .await;
        assert!(slugs.contains("billing-service"));
        assert!(slugs.contains("billing-service-2"));
        assert!(slugs.contains("billing-service-3"));
    }

    #[tokio::test]
    async fn delete_blocked_by_solution_membership() {
        let store = Store::new();
        let team = TeamId::new();
        let svc = create_service(
            &store,
            team,
            "Auth",
            ServiceType::SpringBoot,
            None,
            None,
            None,
            None,
            None,
            None,
            "tester",
            500,
        )
        .await
        .unwrap();
        let solution = crate::solutions::create_solution(
            &store,
            team,
            "Platform",
            None,
            crate::models::SolutionCategory::Platform,
            crate::models::SolutionStatus::Active,
            "tester",
            100,
        )
        .await
        .unwrap();
        crate::solutions::add_member(&store, team, solution.id, svc.id, crate::models::MemberRole::Core, None)
            .await
            .unwrap();

        let err = delete_service(&store, svc.id).await.unwrap_err();
        assert!(err.to_string().contains("belongs to solutions"));
    }
}
