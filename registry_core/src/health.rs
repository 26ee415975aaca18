//! Health Aggregator (C8).
//!
//! Probes are the one genuine suspension point outside store I/O, so every
//! probe goes through `tokio::time::timeout` around a `reqwest` `GET`.

use std::time::Duration;

use log::warn;

use crate::error::{RegistryError, Result};
use crate::ids::{Id, TeamId};
use crate::models::{HealthStatus, Service, ServiceLifecycle, Solution};
use crate::store::Store;

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResult {
    pub status: HealthStatus,
    pub message: String,
}

async fn probe_url(client: &reqwest::Client, url: &str, timeout: Duration) -> HealthResult {
    match tokio::time::timeout(timeout, client.get(url).send()).await {
        Err(_) => HealthResult {
            status: HealthStatus::Down,
            message: "health probe timed out".to_string(),
        },
        Ok(Err(e)) => HealthResult {
            status: HealthStatus::Down,
            message: e.to_string(),
        },
        Ok(Ok(resp)) => {
            let code = resp.status();
            if code.as_u16() == 200 {
                HealthResult {
                    status: HealthStatus::Up,
                    message: "HTTP 200".to_string(),
                }
            } else {
                HealthResult {
                    status: HealthStatus::Degraded,
                    message: format!("HTTP {}", code.as_u16()),
                }
            }
        }
    }
}

/// Probe one service now and persist the result. If no URL is configured,
/// returns `UNKNOWN` without touching the store.
pub async fn check(
    store: &Store,
    client: &reqwest::Client,
    timeout: Duration,
    service: Id<Service>,
) -> Result<HealthResult> {
    let url = store.read(|tables| tables.get_service(service).map(|s| s.health_check_url.clone())).await?;

    let Some(url) = url else {
        return Ok(HealthResult {
            status: HealthStatus::Unknown,
            message: "No health check URL configured".to_string(),
        });
    };

    let result = probe_url(client, &url, timeout).await;
    if result.status == HealthStatus::Down {
        warn!("health probe failed for service {}: {}", service, result.message);
    }

    store
        .transaction(move |tables| {
            let svc = tables
                .services
                .get_mut(&service.as_uuid())
                .ok_or_else(|| RegistryError::not_found(format!("service {} not found", service)))?;
            svc.last_health_status = result.status;
            svc.last_health_check_at = Some(chrono::Utc::now());
            Ok(())
        })
        .await?;

    Ok(result)
}

fn rollup(statuses: &[HealthStatus]) -> HealthStatus {
    if statuses.iter().any(|s| *s == HealthStatus::Down) {
        HealthStatus::Down
    } else if statuses.iter().any(|s| *s == HealthStatus::Degraded) {
        HealthStatus::Degraded
    } else if statuses.iter().any(|s| *s == HealthStatus::Up) {
        HealthStatus::Up
    } else {
        HealthStatus::Unknown
    }
}

pub async fn check_team(
    store: &Store,
    client: &reqwest::Client,
    timeout: Duration,
    team: TeamId,
) -> HealthStatus {
    let service_ids: Vec<Id<Service>> = store
        .read(|tables| {
            tables
                .services_in_team(team)
                .into_iter()
                .filter(|s| s.status == ServiceLifecycle::Active)
                .map(|s| s.id)
                .collect()
        })
        .await;

    let mut statuses = Vec::with_capacity(service_ids.len());
    for id in service_ids {
        if let Ok(r) = check(store, client, timeout, id).await {
            statuses.push(r.status);
        }
    }
    rollup(&statuses)
}

pub async fn check_solution(
    store: &Store,
    client: &reqwest::Client,
    timeout: Duration,
    solution: Id<Solution>,
) -> Result<HealthStatus> {
    let service_ids: Vec<Id<Service>> = store
        .read(|tables| {
            tables.get_solution(solution)?;
            Ok::<_, RegistryError>(tables.members_of(solution).into_iter().map(|m| m.service_id).collect())
        })
        .await?;

    let mut statuses = Vec::with_capacity(service_ids.len());
    for id in service_ids {
        if let Ok(r) = check(store, client, timeout, id).await {
            statuses.push(r.status);
        }
    }
    Ok(rollup(&statuses))
}

pub async fn get_cached_service_health(store: &Store, service: Id<Service>) -> Result<HealthStatus> {
    store.read(|tables| tables.get_service(service).map(|s| s.last_health_status)).await
}

pub async fn get_unhealthy(store: &Store, team: TeamId) -> Vec<Service> {
    store
        .read(|tables| {
            tables
                .services_in_team(team)
                .into_iter()
                .filter(|s| matches!(s.last_health_status, HealthStatus::Down | HealthStatus::Degraded))
                .cloned()
                .collect()
        })
        .await
}

pub async fn get_never_checked(store: &Store, team: TeamId) -> Vec<Service> {
    store
        .read(|tables| {
            tables
                .services_in_team(team)
                .into_iter()
                .filter(|s| s.last_health_check_at.is_none())
                .cloned()
                .collect()
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Service, ServiceType, Timestamps};

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
    async fn no_url_reports_unknown_without_persisting() {
        let store = Store::new();
        let team = TeamId::new();
        let s = svc(team);
        let sid = s.id;
        store.transaction(|t| { t.services.insert(s.id.as_uuid(), s); Ok(()) }).await.unwrap();

        let client = reqwest::Client::new();
        let result = check(&store, &client, Duration::from_secs(1), sid).await.unwrap();
        assert_eq!(result.status, HealthStatus::Unknown);
        assert_eq!(get_never_checked(&store, team).await.len(), 1);
    }

    #[test]
    fn rollup_prefers_down_over_degraded_over_up() {
        assert_eq!(rollup(&[HealthStatus::Up, HealthStatus::Degraded]), HealthStatus::Degraded);
        assert_eq!(rollup(&[HealthStatus::Up, HealthStatus::Down, HealthStatus::Degraded]), HealthStatus::Down);
        assert_eq!(rollup(&[HealthStatus::Up]), HealthStatus::Up);
        assert_eq!(rollup(&[]), HealthStatus::Unknown);
    }
}
