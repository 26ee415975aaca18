//! Dependency Graph Engine (C3).
//!
//! Adjacency is rebuilt fresh per call from the team's loaded edges, using
//! `petgraph::graphmap::DiGraphMap`. No shared mutable graph lives between
//! requests.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use log::{debug, warn};
use petgraph::algo::has_path_connecting;
use petgraph::graphmap::DiGraphMap;
use uuid::Uuid;

use crate::error::{RegistryError, Result};
use crate::ids::{Id, TeamId};
use crate::models::{DependencyType, Service, ServiceDependency};
use crate::store::{Store, Tables};

/// A node in `get_dependency_graph`'s response.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: Id<Service>,
    pub name: String,
    pub health: crate::models::HealthStatus,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct DependencyGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<ServiceDependency>,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactEntry {
    pub id: Id<Service>,
    pub name: String,
    pub depth: u32,
    pub connection_type: DependencyType,
    pub required: bool,
}

fn forward_graph(edges: &[&ServiceDependency]) -> DiGraphMap<Uuid, ()> {
    let mut g = DiGraphMap::new();
    for e in edges {
        g.add_edge(e.source_id.as_uuid(), e.target_id.as_uuid(), ());
    }
    g
}

/// `has-path(a, b, edges)`: true immediately when `a == b`, else true iff
/// `b` is reachable from `a` by following edges forward.
pub fn has_path(a: Uuid, b: Uuid, edges: &[&ServiceDependency]) -> bool {
    if a == b {
        return true;
    }
    let g = forward_graph(edges);
    if !g.contains_node(a) || !g.contains_node(b) {
        return false;
    }
    has_path_connecting(&g, a, b, None)
}

/// Would adding `new_source -> new_target` close a cycle? True iff a path
/// `new_target -> new_source` already exists.
pub fn cycle_would_form(new_source: Uuid, new_target: Uuid, edges: &[&ServiceDependency]) -> bool {
    has_path(new_target, new_source, edges)
}

pub async fn create_dependency(
    store: &Store,
    team: TeamId,
    source: Id<Service>,
    target: Id<Service>,
    dependency_type: DependencyType,
    description: Option<String>,
    is_required: Option<bool>,
    endpoint: Option<String>,
    max_dependencies_per_service: usize,
) -> Result<ServiceDependency> {
    store
        .transaction(|tables| {
            if source == target {
                return Err(RegistryError::validation("cannot depend on itself"));
            }
            let src = tables.get_service(source)?;
            let tgt = tables.get_service(target)?;
            if src.team_id != tgt.team_id {
                return Err(RegistryError::validation(
                    "source and target must belong to the same team",
                ));
            }
            if tables.find_dependency(source, target, dependency_type).is_some() {
                return Err(RegistryError::validation("dependency already exists"));
            }
            if tables.out_degree(team, source) >= max_dependencies_per_service {
                return Err(RegistryError::validation(format!(
                    "service {} has reached the maximum of {} dependencies",
                    source, max_dependencies_per_service
                )));
            }
            let existing = tables.dependencies_in_team(team);
            if cycle_would_form(source.as_uuid(), target.as_uuid(), &existing) {
                return Err(RegistryError::validation(
                    "adding this dependency would introduce a cycle",
                ));
            }

            let dep = ServiceDependency {
                id: Id::new(),
                team_id: team,
                source_id: source,
                target_id: target,
                dependency_type,
                description,
                is_required: is_required.unwrap_or(true),
                endpoint,
                timestamps: crate::models::Timestamps::now(),
            };
            debug!("creating dependency {} -> {} ({:?})", source, target, dependency_type);
            tables.dependencies.insert(dep.id.as_uuid(), dep.clone());
            Ok(dep)
        })
        .await
}

pub async fn remove_dependency(store: &Store, id: Id<ServiceDependency>) -> Result<()> {
    store
        .transaction(|tables| {
            if tables.dependencies.remove(&id.as_uuid()).is_none() {
                return Err(RegistryError::not_found(format!("dependency {} not found", id)));
            }
            Ok(())
        })
        .await
}

pub async fn get_dependency_graph(store: &Store, team: TeamId) -> DependencyGraph {
    store
        .read(|tables| {
            let mut nodes: Vec<GraphNode> = tables
                .services_in_team(team)
                .into_iter()
                .map(|s| GraphNode {
                    id: s.id,
                    name: s.display_name.clone(),
                    health: s.last_health_status,
                })
                .collect();
            nodes.sort_by(|a, b| a.name.cmp(&b.name));
            let edges = tables.dependencies_in_team(team).into_iter().cloned().collect();
            DependencyGraph { nodes, edges }
        })
        .await
}

pub async fn impact_analysis(store: &Store, service: Id<Service>) -> Result<Vec<ImpactEntry>> {
    store
        .read(|tables| {
            let src = tables.get_service(service)?;
            let team = src.team_id;
            let edges = tables.dependencies_in_team(team);

            // reverse adjacency: for edge (u -> v), record v's upstream neighbour u
            let mut upstream_of: BTreeMap<Uuid, Vec<&ServiceDependency>> = BTreeMap::new();
            for e in &edges {
                upstream_of.entry(e.target_id.as_uuid()).or_default().push(e);
            }

            let mut visited: BTreeMap<Uuid, (u32, &ServiceDependency)> = BTreeMap::new();
            let mut queue: VecDeque<(Uuid, u32)> = VecDeque::new();
            queue.push_back((service.as_uuid(), 0));
            let mut seen_start = BTreeSet::new();
            seen_start.insert(service.as_uuid());

            while let Some((node, depth)) = queue.pop_front() {
                if let Some(ups) = upstream_of.get(&node) {
                    for e in ups {
                        let upstream_id = e.source_id.as_uuid();
                        if upstream_id == service.as_uuid() {
                            continue;
                        }
                        if !visited.contains_key(&upstream_id) {
                            visited.insert(upstream_id, (depth + 1, e));
                            queue.push_back((upstream_id, depth + 1));
                        }
                    }
                }
            }

            let mut out: Vec<ImpactEntry> = visited
                .into_iter()
                .filter_map(|(id, (depth, edge))| {
                    tables.services.get(&id).map(|svc| ImpactEntry {
                        id: svc.id,
                        name: svc.display_name.clone(),
                        depth,
                        connection_type: edge.dependency_type,
                        required: edge.is_required,
                    })
                })
                .collect();
            out.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.name.cmp(&b.name)));
            Ok(out)
        })
        .await
}

/// Kahn's algorithm over the *reverse* edge set: a service depended upon
/// must start before its dependents. Ties within a layer break on slug for
/// a deterministic order.
pub fn kahn_startup_order(team: TeamId, tables: &Tables) -> (Vec<Id<Service>>, BTreeSet<Uuid>) {
    let services = tables.services_in_team(team);
    let edges = tables.dependencies_in_team(team);

    let mut out_degree: BTreeMap<Uuid, usize> = BTreeMap::new();
    let mut dependents_of: BTreeMap<Uuid, Vec<Uuid>> = BTreeMap::new();
    for s in &services {
        out_degree.insert(s.id.as_uuid(), 0);
    }
    for e in &edges {
        *out_degree.entry(e.source_id.as_uuid()).or_insert(0) += 1;
        dependents_of
            .entry(e.target_id.as_uuid())
            .or_default()
            .push(e.source_id.as_uuid());
    }

    let slug_of: BTreeMap<Uuid, &str> = services.iter().map(|s| (s.id.as_uuid(), s.slug.as_str())).collect();

    let mut ready: Vec<Uuid> = out_degree
        .iter()
        .filter(|(_, d)| **d == 0)
        .map(|(id, _)| *id)
        .collect();
    ready.sort_by_key(|id| slug_of.get(id).copied().unwrap_or(""));

    let mut output = Vec::new();
    let mut remaining = out_degree.clone();

    while !ready.is_empty() {
        ready.sort_by_key(|id| slug_of.get(id).copied().unwrap_or(""));
        let node = ready.remove(0);
        output.push(node);
        if let Some(deps) = dependents_of.get(&node) {
            let mut newly_ready = Vec::new();
            for dependent in deps {
                if let Some(d) = remaining.get_mut(dependent) {
                    *d -= 1;
                    if *d == 0 {
                        newly_ready.push(*dependent);
                    }
                }
            }
            newly_ready.sort_by_key(|id| slug_of.get(id).copied().unwrap_or(""));
            ready.extend(newly_ready);
        }
    }

    let ordered_ids: BTreeSet<Uuid> = output.iter().copied().collect();
    let cyclic: BTreeSet<Uuid> = services
        .iter()
        .map(|s| s.id.as_uuid())
        .filter(|id| !ordered_ids.contains(id))
        .collect();

    if !cyclic.is_empty() {
        warn!("team {} has {} service(s) stuck in a dependency cycle", team, cyclic.len());
    }

    (output.into_iter().map(Id::from_uuid).collect(), cyclic)
}

pub async fn startup_order(store: &Store, team: TeamId) -> Vec<Id<Service>> {
    store.read(|tables| kahn_startup_order(team, tables).0).await
}

pub async fn detect_cycles(store: &Store, team: TeamId) -> Vec<Id<Service>> {
    store
        .read(|tables| {
            kahn_startup_order(team, tables)
                .1
                .into_iter()
                .map(Id::from_uuid)
                .collect()
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
    async fn self_dependency_rejected() {
        let store = Store::new();
        let team = TeamId::new();
        let a = svc(team, "a");
        let aid = a.id;
        store
            .transaction(|t| {
                t.services.insert(a.id.as_uuid(), a);
                Ok(())
            })
            .await
            .unwrap();
        let err = create_dependency(&store, team, aid, aid, DependencyType::HttpRest, None, None, None, 100)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("cannot depend on itself"));
    }

    #[tokio::test]
    async fn cycle_is_rejected() {
        let store = Store::new();
        let team = TeamId::new();
        let a = svc(team, "a");
        let b = svc(team, "b");
        let (aid, bid) = (a.id, b.id);
        store
            .transaction(|t| {
                t.services.insert(a.id.as_uuid(), a);
                t.services.insert(b.id.as_uuid(), b);
                Ok(())
            })
            .await
            .unwrap();
        create_dependency(&store, team, aid, bid, DependencyType::HttpRest, None, None, None, 100)
            .await
            .unwrap();
        let err = create_dependency(&store, team, bid, aid, DependencyType::HttpRest, None, None, None, 100)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }

    #[tokio::test]
    async fn kahn_chain_orders_dependencies_first() {
        let store = Store::new();
        let team = TeamId::new();
        let a = svc(team, "a");
        let b = svc(team, "b");
        let c = svc(team, "c");
        let (aid, bid, cid) = (a.id, b.id, c.id);
        store
            .transaction(|t| {
                t.services.insert(a.id.as_uuid(), a);
                t.services.insert(b.id.as_uuid(), b);
                t.services.insert(c.id.as_uuid(), c);
                Ok(())
            })
            .await
            .unwrap();
        create_dependency(&store, team, aid, bid, DependencyType::HttpRest, None, None, None, 100)
            .await
            .unwrap();
        create_dependency(&store, team, bid, cid, DependencyType::HttpRest, None, None, None, 100)
            .await
            .unwrap();

        let order = startup_order(&store, team).await;
        let pos = |id: Id<Service>| order.iter().position(|x| *x == id).unwrap();
        assert!(pos(cid) < pos(bid));
        assert!(pos(bid) < pos(aid));
    }

    #[tokio::test]
    async fn impact_diamond() {
        let store = Store::new();
        let team = TeamId::new();
        let a = svc(team, "a");
        let b = svc(team, "b");
        let c = svc(team, "c");
        let d = svc(team, "d");
        let (aid, bid, cid, did) = (a.id, b.id, c.id, d.id);
        store
            .transaction(|t| {
                for s in [a, b, c, d] {
                    t.services.insert(s.id.as_uuid(), s);
                }
                Ok(())
            })
            .await
            .unwrap();
        create_dependency(&store, team, aid, cid, DependencyType::HttpRest, None, None, None, 100)
            .await
            .unwrap();
        create_dependency(&store, team, bid, cid, DependencyType::HttpRest, None, None, None, 100)
            .await
            .unwrap();
        create_dependency(&store, team, did, aid, DependencyType::HttpRest, None, None, None, 100)
            .await
            .unwrap();
        create_dependency(&store, team, did, bid, DependencyType::HttpRest, None, None, None, 100)
            .await
            .unwrap();

        let impact = impact_analysis(&store, cid).await.unwrap();
        assert_eq!(impact.len(), 3);
        let depth_of = |id: Id<Service>| impact.iter().find(|e| e.id == id).unwrap().depth;
        assert_eq!(depth_of(aid), 1);
        assert_eq!(depth_of(bid), 1);
        assert_eq!(depth_of(did), 2);
    }
}
