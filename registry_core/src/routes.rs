//! Route Namespace Manager (C4).

use regex::Regex;

use crate::error::{RegistryError, Result};
use crate::ids::{Id, TeamId};
use crate::models::{ApiRoute, Service};
use crate::store::Store;

fn prefix_regex() -> Regex {
    Regex::new(r"^/[a-z0-9/_.{}-]+$").expect("static regex")
}

/// Lowercase, ensure a leading `/`, strip a trailing `/`.
/// `normalize(normalize(p)) == normalize(p)` by construction.
pub fn normalize(prefix: &str) -> Result<String> {
    let mut p = prefix.to_lowercase();
    if !p.starts_with('/') {
        p = format!("/{p}");
    }
    if p.len() > 1 {
        while p.ends_with('/') {
            p.pop();
        }
    }
    if !prefix_regex().is_match(&p) {
        return Err(RegistryError::validation("invalid characters in route prefix"));
    }
    Ok(p)
}

/// Two prefixes overlap iff either is a path-prefix of the other: equal,
/// or one followed by `/` is a prefix of the other.
pub fn overlaps(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let a_dir = format!("{a}/");
    let b_dir = format!("{b}/");
    b.starts_with(&a_dir) || a.starts_with(&b_dir)
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteAvailability {
    pub available: bool,
    pub conflicting: Vec<ApiRoute>,
}

pub async fn check_availability(
    store: &Store,
    team: TeamId,
    gateway: Option<Id<Service>>,
    environment: &str,
    prefix: &str,
) -> Result<RouteAvailability> {
    let normalized = normalize(prefix)?;
    let environment = environment.to_string();
    Ok(store
        .read(|tables| {
            let scope = scoped_routes(tables, team, gateway, &environment);
            let conflicting: Vec<ApiRoute> = scope
                .into_iter()
                .filter(|r| overlaps(&r.prefix, &normalized))
                .cloned()
                .collect();
            RouteAvailability {
                available: conflicting.is_empty(),
                conflicting,
            }
        })
        .await)
}

fn scoped_routes<'a>(
    tables: &'a crate::store::Tables,
    team: TeamId,
    gateway: Option<Id<Service>>,
    environment: &str,
) -> Vec<&'a ApiRoute> {
    tables
        .routes_in_team(team)
        .into_iter()
        .filter(|r| r.environment == environment)
        .filter(|r| r.gateway_id == gateway)
        .collect()
}

pub async fn create_route(
    store: &Store,
    team: TeamId,
    service: Id<Service>,
    gateway: Option<Id<Service>>,
    prefix: &str,
    methods: &str,
    environment: &str,
    description: Option<String>,
) -> Result<ApiRoute> {
    let normalized = normalize(prefix)?;
    let methods = methods.to_string();
    let environment = environment.to_string();
    store
        .transaction(move |tables| {
            tables.get_service(service)?;
            if let Some(gw) = gateway {
                let gw_svc = tables.get_service(gw)?;
                if gw_svc.team_id != team {
                    return Err(RegistryError::validation("gateway must belong to the same team"));
                }
            }

            let conflict = scoped_routes(tables, team, gateway, &environment)
                .into_iter()
                .find(|r| overlaps(&r.prefix, &normalized));
            if let Some(existing) = conflict {
                if existing.service_id == service {
                    return Err(RegistryError::validation(
                        "service already has a route with overlapping prefix",
                    ));
                }
                return Err(RegistryError::validation("conflicts with existing route"));
            }

            let route = ApiRoute {
                id: Id::new(),
                team_id: team,
                service_id: service,
                gateway_id: gateway,
                prefix: normalized,
                methods,
                environment,
                description,
                timestamps: crate::models::Timestamps::now(),
            };
            tables.routes.insert(route.id.as_uuid(), route.clone());
            Ok(route)
        })
        .await
}

pub async fn delete_route(store: &Store, id: Id<ApiRoute>) -> Result<()> {
    store
        .transaction(|tables| {
            if tables.routes.remove(&id.as_uuid()).is_none() {
                return Err(RegistryError::not_found(format!("route {} not found", id)));
            }
            Ok(())
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_is_idempotent() {
        let n = normalize("/API/V1/").unwrap();
        assert_eq!(n, "/api/v1");
        assert_eq!(normalize(&n).unwrap(), n);
    }

    #[test]
    fn overlap_rule() {
        assert!(overlaps("/api/v1/users", "/api/v1/users"));
        assert!(overlaps("/api/v1/users", "/api/v1/users/profile"));
        assert!(!overlaps("/api/v1/users", "/api/v1/userscount"));
    }
}
