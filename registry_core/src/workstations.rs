//! Workstation Bundle (C6).

use crate::error::{RegistryError, Result};
use crate::graph::kahn_startup_order;
use crate::ids::{Id, TeamId};
use crate::models::{Service, Solution, WorkstationProfile};
use crate::store::Store;

fn compute_startup_order(
    tables: &crate::store::Tables,
    team: TeamId,
    service_ids: &[Id<Service>],
) -> Vec<Id<Service>> {
    let (team_order, _cycles) = kahn_startup_order(team, tables);
    let set: std::collections::BTreeSet<Id<Service>> = service_ids.iter().copied().collect();
    team_order.into_iter().filter(|id| set.contains(id)).collect()
}

pub async fn create_profile(
    store: &Store,
    team: TeamId,
    name: &str,
    description: Option<String>,
    explicit_service_ids: Option<Vec<Id<Service>>>,
    from_solution: Option<Id<Solution>>,
    creator: &str,
    max_workstation_profiles_per_team: usize,
) -> Result<WorkstationProfile> {
    let name = name.to_string();
    let creator = creator.to_string();
    store
        .transaction(move |tables| {
            if tables.workstations_in_team(team).len() >= max_workstation_profiles_per_team {
                return Err(RegistryError::validation(format!(
                    "team has reached the maximum of {} workstation profiles",
                    max_workstation_profiles_per_team
                )));
            }
            if tables.find_workstation_by_name(team, &name).is_some() {
                return Err(RegistryError::validation(format!(
                    "workstation profile named '{}' already exists",
                    name
                )));
            }

            let service_ids = if let Some(ids) = explicit_service_ids {
                ids
            } else if let Some(solution) = from_solution {
                tables.get_solution(solution)?;
                tables.members_of(solution).into_iter().map(|m| m.service_id).collect()
            } else {
                return Err(RegistryError::validation(
                    "must supply either an explicit service list or a source solution",
                ));
            };

            if tables.services_by_ids(team, &service_ids).len() != service_ids.len() {
                return Err(RegistryError::validation(
                    "one or more services do not belong to this team",
                ));
            }

            let startup_order = compute_startup_order(tables, team, &service_ids);
            let profile = WorkstationProfile {
                id: Id::new(),
                team_id: team,
                name,
                description,
                source_solution_id: from_solution,
                service_ids,
                startup_order,
                is_default: false,
                creator,
                timestamps: crate::models::Timestamps::now(),
            };
            tables.workstations.insert(profile.id.as_uuid(), profile.clone());
            Ok(profile)
        })
        .await
}

pub async fn create_from_solution(
    store: &Store,
    team: TeamId,
    solution: Id<Solution>,
    creator: &str,
    max_workstation_profiles_per_team: usize,
) -> Result<WorkstationProfile> {
    let solution_name = store
        .read(|tables| tables.get_solution(solution).map(|s| s.name.clone()))
        .await?;
    create_profile(
        store,
        team,
        &format!("Solution: {solution_name}"),
        None,
        None,
        Some(solution),
        creator,
        max_workstation_profiles_per_team,
    )
    .await
}

pub async fn update_profile(
    store: &Store,
    team: TeamId,
    id: Id<WorkstationProfile>,
    name: Option<String>,
    description: Option<Option<String>>,
    service_ids: Option<Vec<Id<Service>>>,
) -> Result<WorkstationProfile> {
    store
        .transaction(move |tables| {
            if let Some(ref new_name) = name {
                if tables
                    .find_workstation_by_name(team, new_name)
                    .map(|w| w.id != id)
                    .unwrap_or(false)
                {
                    return Err(RegistryError::validation(format!(
                        "workstation profile named '{}' already exists",
                        new_name
                    )));
                }
            }
            if let Some(ref ids) = service_ids {
                if tables.services_by_ids(team, ids).len() != ids.len() {
                    return Err(RegistryError::validation(
                        "one or more services do not belong to this team",
                    ));
                }
            }

            let new_order = service_ids
                .as_ref()
                .map(|ids| compute_startup_order(tables, team, ids));

            let profile = tables
                .workstations
                .get_mut(&id.as_uuid())
                .ok_or_else(|| RegistryError::not_found(format!("workstation profile {} not found", id)))?;
            if let Some(n) = name {
                profile.name = n;
            }
            if let Some(d) = description {
                profile.description = d;
            }
            if let Some(ids) = service_ids {
                profile.service_ids = ids;
                profile.startup_order = new_order.unwrap();
            }
            profile.timestamps.touch();
            Ok(profile.clone())
        })
        .await
}

/// Clear the existing default for the team (if any), then mark this one.
pub async fn set_default(store: &Store, team: TeamId, id: Id<WorkstationProfile>) -> Result<WorkstationProfile> {
    store
        .transaction(move |tables| {
            tables
                .workstations
                .get(&id.as_uuid())
                .ok_or_else(|| RegistryError::not_found(format!("workstation profile {} not found", id)))?;

            let previous_default = tables
                .workstations
                .values()
                .find(|w| w.team_id == team && w.is_default)
                .map(|w| w.id.as_uuid());
            if let Some(prev) = previous_default {
                if prev != id.as_uuid() {
                    tables.workstations.get_mut(&prev).unwrap().is_default = false;
                }
            }
            let profile = tables.workstations.get_mut(&id.as_uuid()).unwrap();
            profile.is_default = true;
            profile.timestamps.touch();
            Ok(profile.clone())
        })
        .await
}

pub async fn refresh_startup_order(store: &Store, team: TeamId, id: Id<WorkstationProfile>) -> Result<WorkstationProfile> {
    store
        .transaction(move |tables| {
            let service_ids = tables
                .workstations
                .get(&id.as_uuid())
                .map(|w| w.service_ids.clone())
                .ok_or_else(|| RegistryError::not_found(format!("workstation profile {} not found", id)))?;
            let order = compute_startup_order(tables, team, &service_ids);
            let profile = tables.workstations.get_mut(&id.as_uuid()).unwrap();
            profile.startup_order = order;
            profile.timestamps.touch();
            Ok(profile.clone())
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Service, ServiceLifecycle, ServiceType, Timestamps};

    fn svc(team: TeamId, slug: &str) -> Service {
        Service {
            id: Id::new(),
            team_id: team,
            display_name: slug.to_string(),
            slug: slug.to_string(),
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
    async fn startup_order_intersects_team_order_with_profile_set() {
        let store = Store::new();
        let team = TeamId::new();
        let a = svc(team, "a");
        let b = svc(team, "b");
        let c = svc(team, "c");
        let (aid, bid, cid) = (a.id, b.id, c.id);
        store
            .transaction(|t| {
                for s in [a, b, c] {
                    t.services.insert(s.id.as_uuid(), s);
                }
                Ok(())
            })
            .await
            .unwrap();
        crate::graph::create_dependency(&store, team, aid, bid, crate::models::DependencyType::HttpRest, None, None, None, 100)
            .await
            .unwrap();
        crate::graph::create_dependency(&store, team, bid, cid, crate::models::DependencyType::HttpRest, None, None, None, 100)
            .await
            .unwrap();

        let profile = create_profile(&store, team, "Core Loop", None, Some(vec![aid, cid]), None, "tester", 50)
            .await
            .unwrap();
        assert_eq!(profile.startup_order, vec![cid, aid]);
    }

    #[tokio::test]
    async fn set_default_clears_previous_default() {
        let store = Store::new();
        let team = TeamId::new();
        let a = svc(team, "a");
        let aid = a.id;
        store.transaction(|t| { t.services.insert(a.id.as_uuid(), a); Ok(()) }).await.unwrap();

        let p1 = create_profile(&store, team, "One", None, Some(vec![aid]), None, "tester", 50).await.unwrap();
        let p2 = create_profile(&store, team, "Two", None, Some(vec![aid]), None, "tester", 50).await.unwrap();

        set_default(&store, team, p1.id).await.unwrap();
        let p2_now_default = set_default(&store, team, p2.id).await.unwrap();
        assert!(p2_now_default.is_default);

        let p1_after = store.read(|t| t.workstations.get(&p1.id.as_uuid()).unwrap().clone()).await;
        assert!(!p1_after.is_default);
    }
}
