//! Port Allocation Engine (C2).

use log::debug;

use crate::error::{RegistryError, Result};
use crate::ids::{Id, TeamId};
use crate::models::{PortAllocation, PortRange, PortType, Service};
use crate::store::Store;

pub async fn auto_allocate(
    store: &Store,
    team: TeamId,
    service: Id<Service>,
    environment: &str,
    port_type: PortType,
    user: &str,
) -> Result<PortAllocation> {
    let environment = environment.to_string();
    let user = user.to_string();
    store
        .transaction(move |tables| {
            let range = tables
                .find_range(team, port_type, &environment)
                .or_else(|| tables.find_range(team, port_type, "local"))
                .ok_or_else(|| {
                    RegistryError::validation(format!("No port range configured for type {:?}", port_type))
                })?
                .clone();

            let taken: std::collections::BTreeSet<u32> = tables
                .allocations_for(team, &environment, port_type)
                .into_iter()
                .map(|a| a.port_number)
                .collect();

            let chosen = (range.start..=range.end).find(|p| !taken.contains(p)).ok_or_else(|| {
                RegistryError::validation(format!(
                    "No available ports in range {}-{}",
                    range.start, range.end
                ))
            })?;

            let alloc = PortAllocation {
                id: Id::new(),
                team_id: team,
                service_id: service,
                environment: environment.clone(),
                port_type,
                port_number: chosen,
                protocol: "TCP".to_string(),
                auto_allocated: true,
                allocator: user.clone(),
                timestamps: crate::models::Timestamps::now(),
            };
            debug!("auto-allocated port {} ({:?}/{})", chosen, port_type, environment);
            tables.port_allocations.insert(alloc.id.as_uuid(), alloc.clone());
            Ok(alloc)
        })
        .await
}

pub async fn auto_allocate_all(
    store: &Store,
    team: TeamId,
    service: Id<Service>,
    environment: &str,
    port_types: &[PortType],
    user: &str,
) -> Result<Vec<PortAllocation>> {
    let mut out = Vec::with_capacity(port_types.len());
    for pt in port_types {
        let alloc = auto_allocate(store, team, service, environment, *pt, user).await?;
        out.push(alloc);
    }
    Ok(out)
}

pub async fn manual_allocate(
    store: &Store,
    team: TeamId,
    service: Id<Service>,
    environment: &str,
    port_type: PortType,
    port_number: u32,
    protocol: &str,
    user: &str,
) -> Result<PortAllocation> {
    let environment = environment.to_string();
    let protocol = protocol.to_string();
    let user = user.to_string();
    store
        .transaction(move |tables| {
            if port_number == 0 || port_number > 65535 {
                return Err(RegistryError::validation("port number must be between 1 and 65535"));
            }
            if let Some(existing) = tables.find_allocation(team, &environment, port_number) {
                let owner = tables
                    .services
                    .get(&existing.service_id.as_uuid())
                    .map(|s| s.display_name.clone())
                    .unwrap_or_else(|| existing.service_id.to_string());
                return Err(RegistryError::validation(format!(
                    "port {} in {} is already allocated to {}",
                    port_number, environment, owner
                )));
            }
            let alloc = PortAllocation {
                id: Id::new(),
                team_id: team,
                service_id: service,
                environment,
                port_type,
                port_number,
                protocol,
                auto_allocated: false,
                allocator: user,
                timestamps: crate::models::Timestamps::now(),
            };
            tables.port_allocations.insert(alloc.id.as_uuid(), alloc.clone());
            Ok(alloc)
        })
        .await
}

pub async fn release(store: &Store, allocation: Id<PortAllocation>) -> Result<()> {
    store
        .transaction(|tables| {
            if tables.port_allocations.remove(&allocation.as_uuid()).is_none() {
                return Err(RegistryError::not_found(format!("allocation {} not found", allocation)));
            }
            Ok(())
        })
        .await
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub available: bool,
    pub owner_service_id: Option<Id<Service>>,
    pub owner_port_type: Option<PortType>,
}

pub async fn check_availability(store: &Store, team: TeamId, environment: &str, port: u32) -> Availability {
    store
        .read(|tables| match tables.find_allocation(team, environment, port) {
            Some(a) => Availability {
                available: false,
                owner_service_id: Some(a.service_id),
                owner_port_type: Some(a.port_type),
            },
            None => Availability {
                available: true,
                owner_service_id: None,
                owner_port_type: None,
            },
        })
        .await
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortConflict {
    pub environment: String,
    pub port_number: u32,
    pub allocation_ids: Vec<Id<PortAllocation>>,
}

/// Audit for externally-mutated data: groups allocations by (port, env) and
/// returns every group with two or more entries. These should never occur
/// under normal single-transaction operation.
pub async fn detect_conflicts(store: &Store, team: TeamId) -> Vec<PortConflict> {
    store
        .read(|tables| {
            let mut groups: std::collections::BTreeMap<(String, u32), Vec<Id<PortAllocation>>> =
                std::collections::BTreeMap::new();
            for a in tables.port_allocations.values().filter(|a| a.team_id == team) {
                groups
                    .entry((a.environment.clone(), a.port_number))
                    .or_default()
                    .push(a.id);
            }
            groups
                .into_iter()
                .filter(|(_, ids)| ids.len() >= 2)
                .map(|((environment, port_number), allocation_ids)| PortConflict {
                    environment,
                    port_number,
                    allocation_ids,
                })
                .collect()
        })
        .await
}

/// If the team already has any range, no-op and return what exists.
/// Otherwise persist the full twelve-range preset in one transaction.
pub async fn seed_default_ranges(store: &Store, team: TeamId, environment: &str) -> Result<Vec<PortRange>> {
    let environment = environment.to_string();
    store
        .transaction(move |tables| {
            let existing = tables.ranges_in_team(team);
            if !existing.is_empty() {
                return Ok(existing.into_iter().cloned().collect());
            }
            let mut created = Vec::with_capacity(12);
            for port_type in PortType::all() {
                let (start, end) = port_type.default_range();
                let range = PortRange {
                    id: Id::new(),
                    team_id: team,
                    port_type,
                    environment: environment.clone(),
                    start,
                    end,
                    description: None,
                    timestamps: crate::models::Timestamps::now(),
                };
                tables.port_ranges.insert(range.id.as_uuid(), range.clone());
                created.push(range);
            }
            Ok(created)
        })
        .await
}

pub async fn update_range(
    store: &Store,
    range_id: Id<PortRange>,
    new_start: u32,
    new_end: u32,
    description: Option<String>,
) -> Result<PortRange> {
    store
        .transaction(move |tables| {
            if new_start >= new_end {
                return Err(RegistryError::validation("range start must be less than end"));
            }
            let range = tables
                .port_ranges
                .get(&range_id.as_uuid())
                .cloned()
                .ok_or_else(|| RegistryError::not_found(format!("port range {} not found", range_id)))?;

            for a in tables.allocations_for(range.team_id, &range.environment, range.port_type) {
                if a.port_number < new_start || a.port_number > new_end {
                    let owner = tables
                        .services
                        .get(&a.service_id.as_uuid())
                        .map(|s| s.display_name.clone())
                        .unwrap_or_else(|| a.service_id.to_string());
                    return Err(RegistryError::validation(format!(
                        "shrinking range would orphan port {} owned by {}",
                        a.port_number, owner
                    )));
                }
            }

            let entry = tables.port_ranges.get_mut(&range_id.as_uuid()).unwrap();
            entry.start = new_start;
            entry.end = new_end;
            entry.description = description;
            entry.timestamps.touch();
            Ok(entry.clone())
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
    async fn auto_allocate_fills_gaps() {
        let store = Store::new();
        let team = TeamId::new();
        let s = svc(team);
        let sid = s.id;
        store
            .transaction(|t| {
                t.services.insert(s.id.as_uuid(), s);
                Ok(())
            })
            .await
            .unwrap();
        seed_default_ranges(&store, team, "dev").await.unwrap();

        manual_allocate(&store, team, sid, "dev", PortType::HttpApi, 8080, "TCP", "bob")
            .await
            .unwrap();
        manual_allocate(&store, team, sid, "dev", PortType::HttpApi, 8082, "TCP", "bob")
            .await
            .unwrap();

        let alloc = auto_allocate(&store, team, sid, "dev", PortType::HttpApi, "bob").await.unwrap();
        assert_eq!(alloc.port_number, 8081);
    }

    #[tokio::test]
    async fn manual_allocate_rejects_collision() {
        let store = Store::new();
        let team = TeamId::new();
        let s = svc(team);
        let sid = s.id;
        store
            .transaction(|t| {
                t.services.insert(s.id.as_uuid(), s);
                Ok(())
            })
            .await
            .unwrap();
        manual_allocate(&store, team, sid, "dev", PortType::HttpApi, 8080, "TCP", "bob")
            .await
            .unwrap();
        let err = manual_allocate(&store, team, sid, "dev", PortType::HttpApi, 8080, "TCP", "bob")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("already allocated"));
    }
}
