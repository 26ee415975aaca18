//! Topology Projector (C10).

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::error::Result;
use crate::ids::{Id, TeamId};
use crate::models::{HealthStatus, Service, ServiceDependency, ServiceType, Solution};
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layer {
    Infrastructure,
    Backend,
    Frontend,
    Gateway,
    Standalone,
}

/// Closed mapping from service type to its coarse role bucket.
pub fn classify_layer(service_type: ServiceType) -> Layer {
    match service_type {
        ServiceType::Database | ServiceType::Cache | ServiceType::Broker => Layer::Infrastructure,
        ServiceType::SpringBoot
        | ServiceType::ExpressJs
        | ServiceType::FastApi
        | ServiceType::DotNet
        | ServiceType::Go
        | ServiceType::Worker
        | ServiceType::Mcp => Layer::Backend,
        ServiceType::NextJs | ServiceType::ReactSpa | ServiceType::Flutter => Layer::Frontend,
        ServiceType::Gateway => Layer::Gateway,
        ServiceType::Library | ServiceType::Cli | ServiceType::Other => Layer::Standalone,
    }
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyNode {
    pub id: Id<Service>,
    pub name: String,
    pub health: HealthStatus,
    pub upstream_count: usize,
    pub downstream_count: usize,
    pub port_count: usize,
    pub solution_ids: Vec<Id<Solution>>,
    pub layer: Layer,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Topology {
    pub nodes: Vec<TopologyNode>,
    pub edges: Vec<ServiceDependency>,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EcosystemStats {
    pub total_services: usize,
    pub total_dependencies: usize,
    pub total_solutions: usize,
    pub services_with_no_dependencies: usize,
    pub services_with_no_consumers: usize,
    pub orphaned_services: usize,
    pub max_dependency_depth: usize,
}

pub async fn team_topology(store: &Store, team: TeamId) -> Topology {
    store.read(|tables| team_topology_sync(tables, team)).await
}

pub async fn solution_topology(store: &Store, solution: Id<Solution>) -> Result<Topology> {
    store
        .read(|tables| {
            let sol = tables.get_solution(solution)?;
            let member_ids: BTreeSet<Id<Service>> =
                tables.members_of(solution).into_iter().map(|m| m.service_id).collect();

            let all = team_topology_sync(tables, sol.team_id);
            let nodes: Vec<TopologyNode> = all
                .nodes
                .into_iter()
                .filter(|n| member_ids.contains(&n.id))
                .collect();
            let edges: Vec<ServiceDependency> = all
                .edges
                .into_iter()
                .filter(|e| member_ids.contains(&e.source_id) && member_ids.contains(&e.target_id))
                .collect();
            Ok(Topology { nodes, edges })
        })
        .await
}

fn team_topology_sync(tables: &crate::store::Tables, team: TeamId) -> Topology {
    let services = tables.services_in_team(team);
    let edges: Vec<ServiceDependency> = tables.dependencies_in_team(team).into_iter().cloned().collect();

    let mut upstream_count: BTreeMap<Id<Service>, usize> = BTreeMap::new();
    let mut downstream_count: BTreeMap<Id<Service>, usize> = BTreeMap::new();
    for e in &edges {
        *downstream_count.entry(e.source_id).or_insert(0) += 1;
        *upstream_count.entry(e.target_id).or_insert(0) += 1;
    }
    let mut solutions_of: BTreeMap<Id<Service>, Vec<Id<Solution>>> = BTreeMap::new();
    for m in tables.solution_members.values() {
        solutions_of.entry(m.service_id).or_default().push(m.solution_id);
    }
    let mut nodes: Vec<TopologyNode> = services
        .iter()
        .map(|s| TopologyNode {
            id: s.id,
            name: s.display_name.clone(),
            health: s.last_health_status,
            upstream_count: upstream_count.get(&s.id).copied().unwrap_or(0),
            downstream_count: downstream_count.get(&s.id).copied().unwrap_or(0),
            port_count: tables.port_allocations.values().filter(|a| a.service_id == s.id).count(),
            solution_ids: solutions_of.get(&s.id).cloned().unwrap_or_default(),
            layer: classify_layer(s.service_type),
        })
        .collect();
    nodes.sort_by(|a, b| a.name.cmp(&b.name));
    Topology { nodes, edges }
}

/// BFS outward in both directions, capped at `depth <= 3`.
pub async fn neighborhood(store: &Store, service: Id<Service>, depth: u32) -> Result<Topology> {
    let depth = depth.min(3);
    store
        .read(|tables| {
            let src = tables.get_service(service)?;
            let team = src.team_id;
            let edges = tables.dependencies_in_team(team);

            let mut adjacency: BTreeMap<Id<Service>, Vec<Id<Service>>> = BTreeMap::new();
            for e in &edges {
                adjacency.entry(e.source_id).or_default().push(e.target_id);
                adjacency.entry(e.target_id).or_default().push(e.source_id);
            }

            let mut visited = BTreeSet::new();
            visited.insert(service);
            let mut queue = VecDeque::new();
            queue.push_back((service, 0u32));
            while let Some((node, d)) = queue.pop_front() {
                if d >= depth {
                    continue;
                }
                if let Some(neighbors) = adjacency.get(&node) {
                    for n in neighbors {
                        if visited.insert(*n) {
                            queue.push_back((*n, d + 1));
                        }
                    }
                }
            }

            let all = team_topology_sync(tables, team);
            let nodes: Vec<TopologyNode> = all.nodes.into_iter().filter(|n| visited.contains(&n.id)).collect();
            let out_edges: Vec<ServiceDependency> = all
                .edges
                .into_iter()
                .filter(|e| visited.contains(&e.source_id) && visited.contains(&e.target_id))
                .collect();
            Ok(Topology {
                nodes,
                edges: out_edges,
            })
        })
        .await
}

fn longest_path_depth(tables: &crate::store::Tables, team: TeamId) -> usize {
    let services = tables.services_in_team(team);
    let edges = tables.dependencies_in_team(team);
    let mut adjacency: BTreeMap<Id<Service>, Vec<Id<Service>>> = BTreeMap::new();
    for e in &edges {
        adjacency.entry(e.source_id).or_default().push(e.target_id);
    }

    let mut memo: BTreeMap<Id<Service>, usize> = BTreeMap::new();
    let mut visiting: BTreeSet<Id<Service>> = BTreeSet::new();

    fn dfs(
        node: Id<Service>,
        adjacency: &BTreeMap<Id<Service>, Vec<Id<Service>>>,
        memo: &mut BTreeMap<Id<Service>, usize>,
        visiting: &mut BTreeSet<Id<Service>>,
    ) -> usize {
        if let Some(&v) = memo.get(&node) {
            return v;
        }
        if !visiting.insert(node) {
            // cycle guard; detect-cycles is the authority on reporting this.
            return 0;
        }
        let best = adjacency
            .get(&node)
            .map(|children| children.iter().map(|c| 1 + dfs(*c, adjacency, memo, visiting)).max().unwrap_or(0))
            .unwrap_or(0);
        visiting.remove(&node);
        memo.insert(node, best);
        best
    }

    services
        .iter()
        .map(|s| dfs(s.id, &adjacency, &mut memo, &mut visiting))
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::create_dependency;
    use crate::models::{DependencyType, Service, ServiceLifecycle, Timestamps};

    fn svc(team: TeamId, slug: &str, service_type: ServiceType) -> Service {
        Service {
            id: Id::new(),
            team_id: team,
            display_name: slug.to_string(),
            slug: slug.to_string(),
            service_type,
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

    #[test]
    fn layer_classification_covers_expected_buckets() {
        assert_eq!(classify_layer(ServiceType::Database), Layer::Infrastructure);
        assert_eq!(classify_layer(ServiceType::SpringBoot), Layer::Backend);
        assert_eq!(classify_layer(ServiceType::ReactSpa), Layer::Frontend);
        assert_eq!(classify_layer(ServiceType::Gateway), Layer::Gateway);
        assert_eq!(classify_layer(ServiceType::Library), Layer::Standalone);
    }

    #[tokio::test]
    async fn orphans_are_services_with_no_edges_and_no_solution() {
        let store = Store::new();
        let team = TeamId::new();
        let a = svc(team, "a", ServiceType::Other);
        let b = svc(team, "b", ServiceType::Other);
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

        let store2 = Store::new();
        let lone = svc(team, "lone", ServiceType::Other);
        let lone_id = lone.id;
        store2
            .transaction(|t| {
                t.services.insert(lone.id.as_uuid(), lone);
                Ok(())
            })
            .await
            .unwrap();
        let stats = ecosystem_stats(&store2, team).await;
        assert_eq!(stats.orphaned_services, 1);
        assert_eq!(stats.total_services, 1);
        let _ = lone_id;
    }

    #[tokio::test]
    async fn neighborhood_depth_is_capped_at_three() {
        let store = Store::new();
        let team = TeamId::new();
        let services: Vec<Service> = (0..6).map(|i| svc(team, &format!("s{i}"), ServiceType::Other)).collect();
        let ids: Vec<Id<Service>> = services.iter().map(|s| s.id).collect();
        store
            .transaction(|t| {
                for s in services {
                    t.services.insert(s.id.as_uuid(), s);
                }
                Ok(())
            })
            .await
            .unwrap();
        for w in ids.windows(2) {
            create_dependency(&store, team, w[0], w[1], DependencyType::HttpRest, None, None, None, 100)
                .await
                .unwrap();
        }

        let result = neighborhood(&store, ids[0], 10).await.unwrap();
        // chain of 6 nodes, capped BFS depth 3 from ids[0] reaches ids[0..=3]
        assert_eq!(result.nodes.len(), 4);
    }
}

pub async fn ecosystem_stats(store: &Store, team: TeamId) -> EcosystemStats {
    store
        .read(|tables| {
            let services = tables.services_in_team(team);
            let edges = tables.dependencies_in_team(team);
            let solutions_count = tables.solutions.values().filter(|s| s.team_id == team).count();

            let sources: BTreeSet<Id<Service>> = edges.iter().map(|e| e.source_id).collect();
            let targets: BTreeSet<Id<Service>> = edges.iter().map(|e| e.target_id).collect();
            let member_ids: BTreeSet<Id<Service>> = tables.solution_members.values().map(|m| m.service_id).collect();

            let no_deps = services.iter().filter(|s| !sources.contains(&s.id)).count();
            let no_consumers = services.iter().filter(|s| !targets.contains(&s.id)).count();
            let orphaned = services
                .iter()
                .filter(|s| !member_ids.contains(&s.id) && !sources.contains(&s.id) && !targets.contains(&s.id))
                .count();

            EcosystemStats {
                total_services: services.len(),
                total_dependencies: edges.len(),
                total_solutions: solutions_count,
                services_with_no_dependencies: no_deps,
                services_with_no_consumers: no_consumers,
                orphaned_services: orphaned,
                max_dependency_depth: longest_path_depth(tables, team),
            }
        })
        .await
}
