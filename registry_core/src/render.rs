//! Config Generator (C9), rendering half.
//!
//! Documents are built as plain ordered structs and handed to `serde_yaml`.
//! `BTreeMap` keys sort themselves wherever key order is arbitrary, so the
//! emitted YAML is stable without hand-managed string formatting. The one
//! place order is load-bearing (`services:`, which must follow startup
//! order) uses `OrderedMap` instead, which serializes in insertion order.

use std::collections::{BTreeMap, BTreeSet};

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::{RegistryError, Result};
use crate::graph::kahn_startup_order;
use crate::ids::{Id, TeamId};
use crate::models::{PortType, ResourceType, Service, Solution, TemplateType};
use crate::store::{Store, Tables};
use crate::templates;

/// A YAML mapping that serializes its entries in insertion order rather
/// than `BTreeMap`'s key order.
#[derive(Debug, Clone, Default)]
struct OrderedMap<V>(Vec<(String, V)>);

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
struct Healthcheck {
    test: Vec<String>,
    interval: String,
}

#[derive(Debug, Clone, Default, Serialize)]
struct ComposeService {
    image: String,
    container_name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ports: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    environment: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    depends_on: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    healthcheck: Option<Healthcheck>,
    labels: BTreeMap<String, String>,
    networks: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    volumes: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
struct NetworkDef {
    driver: String,
}

#[derive(Debug, Clone, Default, Serialize)]
struct VolumeDef {}

#[derive(Debug, Clone, Serialize)]
struct ComposeDocument {
    services: OrderedMap<ComposeService>,
    networks: BTreeMap<String, NetworkDef>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    volumes: BTreeMap<String, VolumeDef>,
}

const NETWORK_NAME: &str = "codeops-network";

fn build_compose_service(tables: &Tables, service: Id<Service>, environment: &str) -> Result<(String, ComposeService, BTreeSet<String>)> {
    let svc = tables.get_service(service)?;
    let slug = svc.slug.clone();

    let mut ports: Vec<String> = tables
        .allocations_for_service(service, environment)
        .into_iter()
        .map(|a| format!("{0}:{0}", a.port_number))
        .collect();
    ports.sort();

    let environment_map: BTreeMap<String, String> = tables
        .env_configs_for(service, environment)
        .into_iter()
        .map(|e| (e.key.clone(), e.value.clone()))
        .collect();

    let depends_on: Vec<String> = {
        let mut names: BTreeSet<String> = BTreeSet::new();
        for dep in tables.outgoing_dependencies(service) {
            if let Some(target) = tables.services.get(&dep.target_id.as_uuid()) {
                names.insert(target.slug.clone());
            }
        }
        names.into_iter().collect()
    };

    let healthcheck = svc.health_check_url.as_ref().map(|url| Healthcheck {
        test: vec!["CMD".to_string(), "curl".to_string(), "-f".to_string(), url.clone()],
        interval: "30s".to_string(),
    });

    let volume_names: BTreeSet<String> = tables
        .infra_for_service(service, environment)
        .into_iter()
        .filter(|r| r.resource_type == ResourceType::DockerVolume)
        .map(|r| r.name.clone())
        .collect();

    let mut labels = BTreeMap::new();
    labels.insert("com.codeops.service-id".to_string(), svc.id.to_string());
    labels.insert("com.codeops.service-type".to_string(), svc.service_type.to_string());
    labels.insert("com.codeops.team-id".to_string(), svc.team_id.to_string());

    let service_block = ComposeService {
        image: format!("{slug}:latest"),
        container_name: slug.clone(),
        ports,
        environment: environment_map,
        depends_on,
        healthcheck,
        labels,
        networks: vec![NETWORK_NAME.to_string()],
        volumes: volume_names.iter().cloned().collect(),
    };

    Ok((slug, service_block, volume_names))
}

pub async fn generate_docker_compose(
    store: &Store,
    team: TeamId,
    service: Id<Service>,
    environment: &str,
) -> Result<crate::models::ConfigTemplate> {
    let (slug, block, volume_names) = store
        .read(|tables| build_compose_service(tables, service, environment))
        .await?;

    let mut volumes = BTreeMap::new();
    for v in volume_names {
        volumes.insert(v, VolumeDef::default());
    }
    let services = OrderedMap(vec![(slug, block)]);
    let mut networks = BTreeMap::new();
    networks.insert(
        NETWORK_NAME.to_string(),
        NetworkDef {
            driver: "bridge".to_string(),
        },
    );
    let doc = ComposeDocument {
        services,
        networks,
        volumes,
    };
    let content = serde_yaml::to_string(&doc)?;

    Ok(templates::upsert(
        store,
        team,
        service,
        TemplateType::DockerCompose,
        environment,
        content,
        "registry-data",
    )
    .await)
}

pub async fn generate_solution_compose(
    store: &Store,
    solution: Id<Solution>,
    environment: &str,
) -> Result<crate::models::ConfigTemplate> {
    let (team, ordered_members) = store
        .read(|tables| {
            let sol = tables.get_solution(solution)?;
            let members: Vec<Id<Service>> = tables.members_of(solution).into_iter().map(|m| m.service_id).collect();
            if members.is_empty() {
                return Err(RegistryError::validation("solution has no members"));
            }
            let (team_order, _cycles) = kahn_startup_order(sol.team_id, tables);
            let member_set: BTreeSet<Id<Service>> = members.iter().copied().collect();
            let mut ordered: Vec<Id<Service>> = team_order.into_iter().filter(|id| member_set.contains(id)).collect();
            for m in &members {
                if !ordered.contains(m) {
                    ordered.push(*m);
                }
            }
            Ok((sol.team_id, ordered))
        })
        .await?;

    let blocks: Vec<(String, ComposeService, BTreeSet<String>)> = store
        .read(|tables| {
            ordered_members
                .iter()
                .map(|id| build_compose_service(tables, *id, environment))
                .collect::<Result<Vec<_>>>()
        })
        .await?;

    let mut services = Vec::with_capacity(blocks.len());
    let mut volumes = BTreeMap::new();
    for (slug, block, vols) in blocks {
        for v in vols {
            volumes.insert(v, VolumeDef::default());
        }
        services.push((slug, block));
    }
    let services = OrderedMap(services);
    let mut networks = BTreeMap::new();
    networks.insert(
        NETWORK_NAME.to_string(),
        NetworkDef {
            driver: "bridge".to_string(),
        },
    );
    let doc = ComposeDocument {
        services,
        networks,
        volumes,
    };
    let content = serde_yaml::to_string(&doc)?;

    let anchor = ordered_members[0];
    Ok(templates::upsert(
        store,
        team,
        anchor,
        TemplateType::DockerCompose,
        environment,
        content,
        &format!("solution:{solution}"),
    )
    .await)
}

#[derive(Debug, Clone, Default, Serialize)]
struct DataSourceConfig {
    #[serde(flatten)]
    fields: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize)]
struct SpringConfig {
    application: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    datasource: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize)]
struct AppConfigDocument {
    spring: SpringConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    server: Option<BTreeMap<String, u32>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    config: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    codeops: BTreeMap<String, BTreeMap<String, String>>,
}

pub async fn generate_application_config(
    store: &Store,
    team: TeamId,
    service: Id<Service>,
    environment: &str,
) -> Result<crate::models::ConfigTemplate> {
    let content = store
        .read(|tables| {
            let svc = tables.get_service(service)?;
            let mut application = BTreeMap::new();
            application.insert("name".to_string(), svc.slug.clone());

            let http_port = tables
                .allocations_for_service(service, environment)
                .into_iter()
                .find(|a| a.port_type == PortType::HttpApi)
                .map(|a| a.port_number);
            let server = http_port.map(|p| {
                let mut m = BTreeMap::new();
                m.insert("port".to_string(), p);
                m
            });

            let mut datasource = BTreeMap::new();
            let mut flat_config = BTreeMap::new();
            for e in tables.env_configs_for(service, environment) {
                if let Some(rest) = e.key.strip_prefix("spring.datasource.") {
                    datasource.insert(rest.to_string(), e.value.clone());
                } else {
                    flat_config.insert(e.key.clone(), e.value.clone());
                }
            }

            let mut codeops: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
            for dep in tables.outgoing_dependencies(service) {
                let Some(target) = tables.services.get(&dep.target_id.as_uuid()) else {
                    continue;
                };
                let port = tables
                    .allocations_for_service(dep.target_id, environment)
                    .into_iter()
                    .find(|a| a.port_type == PortType::HttpApi)
                    .map(|a| a.port_number);
                if let Some(port) = port {
                    let mut entry = BTreeMap::new();
                    entry.insert("url".to_string(), format!("http://localhost:{port}"));
                    codeops.insert(target.slug.clone(), entry);
                }
            }

            let doc = AppConfigDocument {
                spring: SpringConfig {
                    application,
                    datasource: if datasource.is_empty() { None } else { Some(datasource) },
                },
                server,
                config: flat_config,
                codeops,
            };
            serde_yaml::to_string(&doc).map_err(RegistryError::from)
        })
        .await?;

    Ok(templates::upsert(
        store,
        team,
        service,
        TemplateType::ApplicationYml,
        environment,
        content,
        "registry-data",
    )
    .await)
}

fn line_list<T>(items: Vec<T>, render: impl Fn(&T) -> String) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items.iter().map(render).collect::<Vec<_>>().join(", ")
    }
}

pub async fn generate_reference_header(
    store: &Store,
    team: TeamId,
    service: Id<Service>,
    environment: &str,
) -> Result<crate::models::ConfigTemplate> {
    let content = store
        .read(|tables| {
            let svc = tables.get_service(service)?;

            let mut ports = tables.allocations_for_service(service, environment);
            ports.sort_by_key(|a| a.port_number);
            let ports_line = line_list(ports, |a| format!("{}: {}", a.port_type, a.port_number));

            let mut upstream: Vec<String> = Vec::new();
            for dep in tables.outgoing_dependencies(service) {
                if let Some(target) = tables.services.get(&dep.target_id.as_uuid()) {
                    upstream.push(format!("{} ({}) [{}]", target.display_name, target.slug, dep.dependency_type));
                }
            }
            upstream.sort();
            let upstream_line = if upstream.is_empty() { "None".to_string() } else { upstream.join(", ") };

            let mut downstream: Vec<String> = Vec::new();
            for dep in tables.incoming_dependencies(service) {
                if let Some(source) = tables.services.get(&dep.source_id.as_uuid()) {
                    downstream.push(format!("{} ({}) [{}]", source.display_name, source.slug, dep.dependency_type));
                }
            }
            downstream.sort();
            let downstream_line = if downstream.is_empty() { "None".to_string() } else { downstream.join(", ") };

            let mut routes = tables.routes_for_service(service, environment);
            routes.sort_by(|a, b| a.prefix.cmp(&b.prefix));
            let routes_line = line_list(routes, |r| format!("{} ({})", r.prefix, r.methods));

            let mut infra = tables.infra_for_service(service, environment);
            infra.sort_by(|a, b| a.name.cmp(&b.name));
            let infra_line = line_list(infra, |r| format!("{}: {}", r.resource_type, r.name));

            let mut env_configs = tables.env_configs_for(service, environment);
            env_configs.sort_by(|a, b| a.key.cmp(&b.key));
            let env_line = line_list(env_configs, |e| format!("{} = {}", e.key, e.value));

            let lines = vec![
                format!("# Service: {}", svc.display_name),
                format!("# Slug: {}", svc.slug),
                format!("# Type: {}", svc.service_type),
                format!("# Repo: {}", svc.repo_url.clone().unwrap_or_else(|| "N/A".to_string())),
                format!("# Tech stack: {}", svc.tech_stack.clone().unwrap_or_else(|| "N/A".to_string())),
                format!("# Ports: {ports_line}"),
                format!("# Upstream: {upstream_line}"),
                format!("# Downstream: {downstream_line}"),
                format!("# Routes: {routes_line}"),
                format!("# Infrastructure: {infra_line}"),
                format!("# Environment config: {env_line}"),
            ];
            Ok::<_, RegistryError>(lines.join("\n"))
        })
        .await?;

    Ok(templates::upsert(
        store,
        team,
        service,
        TemplateType::ClaudeCodeHeader,
        environment,
        content,
        "registry-data",
    )
    .await)
}

/// Compose, then app-config, then reference-header, each isolated: a
/// failure in one does not prevent the others from being returned.
pub async fn generate_all_for_service(
    store: &Store,
    team: TeamId,
    service: Id<Service>,
    environment: &str,
) -> Result<Vec<crate::models::ConfigTemplate>> {
    store.read(|tables| tables.get_service(service).map(|_| ())).await?;

    let mut out = Vec::new();
    if let Ok(t) = generate_docker_compose(store, team, service, environment).await {
        out.push(t);
    } else {
        log::warn!("compose generation failed for service {service}, skipping");
    }
    if let Ok(t) = generate_application_config(store, team, service, environment).await {
        out.push(t);
    } else {
        log::warn!("application-config generation failed for service {service}, skipping");
    }
    if let Ok(t) = generate_reference_header(store, team, service, environment).await {
        out.push(t);
    } else {
        log::warn!("reference-header generation failed for service {service}, skipping");
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MemberRole, ServiceLifecycle, ServiceType, SolutionCategory, SolutionStatus, Timestamps};
    use crate::solutions;

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
    async fn regenerating_compose_bumps_version() {
        let store = Store::new();
        let team = TeamId::new();
        let s = svc(team, "api");
        let sid = s.id;
        store
            .transaction(|t| {
                t.services.insert(s.id.as_uuid(), s);
                Ok(())
            })
            .await
            .unwrap();

        let first = generate_docker_compose(&store, team, sid, "dev").await.unwrap();
        assert_eq!(first.version, 1);
        let second = generate_docker_compose(&store, team, sid, "dev").await.unwrap();
        assert_eq!(second.version, 2);
        let third = generate_docker_compose(&store, team, sid, "dev").await.unwrap();
        assert_eq!(third.version, 3);
    }

    #[tokio::test]
    async fn solution_compose_orders_by_startup_order() {
        let store = Store::new();
        let team = TeamId::new();
        let database = svc(team, "database");
        let backend = svc(team, "backend");
        let frontend = svc(team, "frontend");
        let (db_id, backend_id, frontend_id) = (database.id, backend.id, frontend.id);
        store
            .transaction(|t| {
                for s in [database, backend, frontend] {
                    t.services.insert(s.id.as_uuid(), s);
                }
                Ok(())
            })
            .await
            .unwrap();
        crate::graph::create_dependency(
            &store,
            team,
            backend_id,
            db_id,
            crate::models::DependencyType::DatabaseShared,
            None,
            None,
            None,
            100,
        )
        .await
        .unwrap();
        crate::graph::create_dependency(
            &store,
            team,
            frontend_id,
            backend_id,
            crate::models::DependencyType::HttpRest,
            None,
            None,
            None,
            100,
        )
        .await
        .unwrap();

        let solution = solutions::create_solution(
            &store,
            team,
            "Checkout",
            None,
            SolutionCategory::Product,
            SolutionStatus::Active,
            "tester",
            100,
        )
        .await
        .unwrap();
        for (sid, role) in [(frontend_id, MemberRole::Core), (backend_id, MemberRole::Core), (db_id, MemberRole::Infrastructure)] {
            solutions::add_member(&store, team, solution.id, sid, role, None).await.unwrap();
        }

        let template = generate_solution_compose(&store, solution.id, "dev").await.unwrap();
        let db_pos = template.content.find("database:").unwrap();
        let backend_pos = template.content.find("backend:").unwrap();
        let frontend_pos = template.content.find("frontend:").unwrap();
        assert!(db_pos < backend_pos);
        assert!(backend_pos < frontend_pos);
        assert_eq!(template.generated_from, format!("solution:{}", solution.id));
    }
}
