//! Infrastructure Resource Ledger (C7).

use crate::error::{RegistryError, Result};
use crate::ids::{Id, TeamId};
use crate::models::{InfraResource, ResourceType, Service};
use crate::store::Store;

pub async fn create(
    store: &Store,
    team: TeamId,
    service: Option<Id<Service>>,
    resource_type: ResourceType,
    name: &str,
    environment: &str,
    region: Option<String>,
    arn_or_url: Option<String>,
    config: Option<String>,
    creator: &str,
) -> Result<InfraResource> {
    let name = name.to_string();
    let environment = environment.to_string();
    let creator = creator.to_string();
    store
        .transaction(move |tables| {
            if let Some(svc) = service {
                let s = tables.get_service(svc)?;
                if s.team_id != team {
                    return Err(RegistryError::validation("service must belong to the same team"));
                }
            }
            let resource = InfraResource {
                id: Id::new(),
                team_id: team,
                service_id: service,
                resource_type,
                name,
                environment,
                region,
                arn_or_url,
                config,
                creator,
                timestamps: crate::models::Timestamps::now(),
            };
            tables.infra_resources.insert(resource.id.as_uuid(), resource.clone());
            Ok(resource)
        })
        .await
}

pub async fn delete(store: &Store, id: Id<InfraResource>) -> Result<()> {
    store
        .transaction(|tables| {
            if tables.infra_resources.remove(&id.as_uuid()).is_none() {
                return Err(RegistryError::not_found(format!("infra resource {} not found", id)));
            }
            Ok(())
        })
        .await
}

pub async fn list(
    store: &Store,
    team: TeamId,
    resource_type: Option<ResourceType>,
    environment: Option<String>,
) -> Vec<InfraResource> {
    store
        .read(|tables| {
            tables
                .infra_in_team(team)
                .into_iter()
                .filter(|r| resource_type.map(|t| t == r.resource_type).unwrap_or(true))
                .filter(|r| environment.as_deref().map(|e| e == r.environment).unwrap_or(true))
                .cloned()
                .collect()
        })
        .await
}

/// Null the service link.
pub async fn orphan(store: &Store, id: Id<InfraResource>) -> Result<InfraResource> {
    store
        .transaction(|tables| {
            let r = tables
                .infra_resources
                .get_mut(&id.as_uuid())
                .ok_or_else(|| RegistryError::not_found(format!("infra resource {} not found", id)))?;
            r.service_id = None;
            r.timestamps.touch();
            Ok(r.clone())
        })
        .await
}

pub async fn reassign(store: &Store, id: Id<InfraResource>, new_service: Id<Service>) -> Result<InfraResource> {
    store
        .transaction(move |tables| {
            let team = tables
                .infra_resources
                .get(&id.as_uuid())
                .map(|r| r.team_id)
                .ok_or_else(|| RegistryError::not_found(format!("infra resource {} not found", id)))?;
            let svc = tables.get_service(new_service)?;
            if svc.team_id != team {
                return Err(RegistryError::validation(
                    "new owner must belong to the same team as the resource",
                ));
            }
            let r = tables.infra_resources.get_mut(&id.as_uuid()).unwrap();
            r.service_id = Some(new_service);
            r.timestamps.touch();
            Ok(r.clone())
        })
        .await
}

pub async fn find_orphaned(store: &Store, team: TeamId) -> Vec<InfraResource> {
    store
        .read(|tables| {
            tables
                .infra_in_team(team)
                .into_iter()
                .filter(|r| r.service_id.is_none())
                .cloned()
                .collect()
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Service, ServiceLifecycle, ServiceType, Timestamps};

    fn svc(team: TeamId) -> Service {
        Service {
            id: Id::new(),
            team_id: team,
            display_name: "svc".into(),
            slug: "svc".into(),
            service_type: ServiceType::Other,
            repo_url: None,
            branch: None,
            tech_stack: None,
            description: None,
            status: ServiceLifecycle::Active,
            health_check_url: None,
            poll_interval_seconds: None,
            last_health_status: Default::default(),
            last_health_check_at: None,
            environment: Default::default(),
            metadata: Default::default(),
            creator: "tester".into(),
            timestamps: Timestamps::now(),
        }
    }

    #[tokio::test]
    async fn orphan_then_reassign_round_trips() {
        let store = Store::new();
        let team = TeamId::new();
        let s = svc(team);
        let sid = s.id;
        store.transaction(|t| { t.services.insert(s.id.as_uuid(), s); Ok(()) }).await.unwrap();

        let resource = create(&store, team, Some(sid), ResourceType::DockerVolume, "orders-data", "dev", None, None, None, "tester")
            .await
            .unwrap();
        let orphaned = orphan(&store, resource.id).await.unwrap();
        assert!(orphaned.service_id.is_none());
        assert_eq!(find_orphaned(&store, team).await.len(), 1);

        let reassigned = reassign(&store, resource.id, sid).await.unwrap();
        assert_eq!(reassigned.service_id, Some(sid));
        assert_eq!(find_orphaned(&store, team).await.len(), 0);
    }

    #[tokio::test]
    async fn reassign_rejects_cross_team_service() {
        let store = Store::new();
        let team_a = TeamId::new();
        let team_b = TeamId::new();
        let other = svc(team_b);
        let other_id = other.id;
        store.transaction(|t| { t.services.insert(other.id.as_uuid(), other); Ok(()) }).await.unwrap();

        let resource = create(&store, team_a, None, ResourceType::S3Bucket, "uploads", "dev", None, None, None, "tester")
            .await
            .unwrap();
        let err = reassign(&store, resource.id, other_id).await.unwrap_err();
        assert!(err.to_string().contains("same team"));
    }
}
