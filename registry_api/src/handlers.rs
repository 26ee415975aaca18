//! Illustrative handler subset — see `SPEC_FULL.md` §6. Each handler parses
//! path/query/body, calls straight into `registry_core`, and lets `ApiError`
//! do the status-code mapping. No pagination, no role-gating beyond the
//! `Principal::can_write` stub: those remain external collaborators.

use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use registry_core::models::{DependencyType, PortType, Service, ServiceType};
use registry_core::{services, graph, ports, routes as route_engine, topology, health, render};

use crate::{parse_id, parse_team_id, AppState, Principal};

type Result<T> = std::result::Result<T, crate::ApiError>;

fn require_writer(principal: &Principal) -> Result<()> {
    if principal.can_write() {
        Ok(())
    } else {
        Err(registry_core::RegistryError::authorization("write role required").into())
    }
}

#[derive(Deserialize)]
pub struct CreateServiceBody {
    pub display_name: String,
    pub service_type: ServiceType,
    pub repo_url: Option<String>,
    pub branch: Option<String>,
    pub tech_stack: Option<String>,
    pub description: Option<String>,
    pub health_check_url: Option<String>,
    pub poll_interval_seconds: Option<u32>,
}

pub async fn create_service(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    body: web::Json<CreateServiceBody>,
    principal: Principal,
) -> Result<HttpResponse> {
    require_writer(&principal)?;
    let team = parse_team_id(&path)?;
    let body = body.into_inner();
    let svc = services::create_service(
        &state.store,
        team,
        &body.display_name,
        body.service_type,
        body.repo_url,
        body.branch,
        body.tech_stack,
        body.description,
        body.health_check_url,
        body.poll_interval_seconds,
        &principal.user_id,
        state.config.max_services_per_team,
    )
    .await?;
    Ok(HttpResponse::Created().json(svc))
}

pub async fn list_services(state: web::Data<Arc<AppState>>, path: web::Path<String>) -> Result<HttpResponse> {
    let team = parse_team_id(&path)?;
    let list = state.store.read(|tables| tables.services_in_team(team).into_iter().cloned().collect::<Vec<_>>()).await;
    Ok(HttpResponse::Ok().json(list))
}

pub async fn get_service(state: web::Data<Arc<AppState>>, path: web::Path<String>) -> Result<HttpResponse> {
    let id = parse_id::<Service>(&path)?;
    let svc = state.store.read(|tables| tables.get_service(id).cloned()).await?;
    Ok(HttpResponse::Ok().json(svc))
}

#[derive(Deserialize)]
pub struct CreateDependencyBody {
    pub source_id: String,
    pub target_id: String,
    pub dependency_type: DependencyType,
    pub description: Option<String>,
    pub is_required: Option<bool>,
    pub endpoint: Option<String>,
}

pub async fn create_dependency(
    state: web::Data<Arc<AppState>>,
    body: web::Json<CreateDependencyBody>,
    principal: Principal,
) -> Result<HttpResponse> {
    require_writer(&principal)?;
    let body = body.into_inner();
    let source = parse_id::<Service>(&body.source_id)?;
    let target = parse_id::<Service>(&body.target_id)?;
    let team = state.store.read(|tables| tables.get_service(source).map(|s| s.team_id)).await?;
    let dep = graph::create_dependency(
        &state.store,
        team,
        source,
        target,
        body.dependency_type,
        body.description,
        body.is_required,
        body.endpoint,
        state.config.max_dependencies_per_service,
    )
    .await?;
    Ok(HttpResponse::Created().json(dep))
}

pub async fn delete_dependency(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    principal: Principal,
) -> Result<HttpResponse> {
    require_writer(&principal)?;
    let id = parse_id(&path)?;
    graph::remove_dependency(&state.store, id).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn dependency_graph(state: web::Data<Arc<AppState>>, path: web::Path<String>) -> Result<HttpResponse> {
    let team = parse_team_id(&path)?;
    let g = graph::get_dependency_graph(&state.store, team).await;
    Ok(HttpResponse::Ok().json(g))
}

pub async fn impact_analysis(state: web::Data<Arc<AppState>>, path: web::Path<String>) -> Result<HttpResponse> {
    let id = parse_id::<Service>(&path)?;
    let impact = graph::impact_analysis(&state.store, id).await?;
    Ok(HttpResponse::Ok().json(impact))
}

pub async fn startup_order(state: web::Data<Arc<AppState>>, path: web::Path<String>) -> Result<HttpResponse> {
    let team = parse_team_id(&path)?;
    let order = graph::startup_order(&state.store, team).await;
    Ok(HttpResponse::Ok().json(order))
}

pub async fn detect_cycles(state: web::Data<Arc<AppState>>, path: web::Path<String>) -> Result<HttpResponse> {
    let team = parse_team_id(&path)?;
    let cycles = graph::detect_cycles(&state.store, team).await;
    Ok(HttpResponse::Ok().json(cycles))
}

#[derive(Deserialize)]
pub struct CreateRouteBody {
    pub service_id: String,
    pub gateway_id: Option<String>,
    pub prefix: String,
    pub methods: String,
    pub environment: String,
    pub description: Option<String>,
}

pub async fn create_route(
    state: web::Data<Arc<AppState>>,
    body: web::Json<CreateRouteBody>,
    principal: Principal,
) -> Result<HttpResponse> {
    require_writer(&principal)?;
    let body = body.into_inner();
    let service = parse_id::<Service>(&body.service_id)?;
    let gateway = body.gateway_id.as_deref().map(parse_id::<Service>).transpose()?;
    let team = state.store.read(|tables| tables.get_service(service).map(|s| s.team_id)).await?;
    let route = route_engine::create_route(
        &state.store,
        team,
        service,
        gateway,
        &body.prefix,
        &body.methods,
        &body.environment,
        body.description,
    )
    .await?;
    Ok(HttpResponse::Created().json(route))
}

#[derive(Deserialize)]
pub struct RouteCheckQuery {
    pub team_id: String,
    pub gateway_id: Option<String>,
    pub environment: String,
    pub prefix: String,
}

pub async fn check_route_availability(
    state: web::Data<Arc<AppState>>,
    query: web::Query<RouteCheckQuery>,
) -> Result<HttpResponse> {
    let team = parse_team_id(&query.team_id)?;
    let gateway = query.gateway_id.as_deref().map(parse_id::<Service>).transpose()?;
    let availability = route_engine::check_availability(&state.store, team, gateway, &query.environment, &query.prefix).await?;
    Ok(HttpResponse::Ok().json(availability))
}

#[derive(Deserialize)]
pub struct AutoAllocateBody {
    pub service_id: String,
    pub environment: String,
    pub port_type: PortType,
}

pub async fn auto_allocate_port(
    state: web::Data<Arc<AppState>>,
    body: web::Json<AutoAllocateBody>,
    principal: Principal,
) -> Result<HttpResponse> {
    require_writer(&principal)?;
    let body = body.into_inner();
    let service = parse_id::<Service>(&body.service_id)?;
    let team = state.store.read(|tables| tables.get_service(service).map(|s| s.team_id)).await?;
    let alloc = ports::auto_allocate(&state.store, team, service, &body.environment, body.port_type, &principal.user_id).await?;
    Ok(HttpResponse::Created().json(alloc))
}

pub async fn port_conflicts(state: web::Data<Arc<AppState>>, path: web::Path<String>) -> Result<HttpResponse> {
    let team = parse_team_id(&path)?;
    let conflicts = ports::detect_conflicts(&state.store, team).await;
    Ok(HttpResponse::Ok().json(conflicts))
}

#[derive(Deserialize)]
pub struct GenerateConfigQuery {
    #[serde(rename = "type")]
    pub template_type: String,
    pub environment: String,
}

pub async fn generate_config(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    query: web::Query<GenerateConfigQuery>,
    principal: Principal,
) -> Result<HttpResponse> {
    require_writer(&principal)?;
    let service = parse_id::<Service>(&path)?;
    let team = state.store.read(|tables| tables.get_service(service).map(|s| s.team_id)).await?;
    let template = match query.template_type.as_str() {
        "DOCKER_COMPOSE" => render::generate_docker_compose(&state.store, team, service, &query.environment).await?,
        "APPLICATION_YML" => render::generate_application_config(&state.store, team, service, &query.environment).await?,
        "CLAUDE_CODE_HEADER" => render::generate_reference_header(&state.store, team, service, &query.environment).await?,
        _ => return Err(registry_core::RegistryError::validation("unknown template type").into()),
    };
    Ok(HttpResponse::Ok().json(template))
}

#[derive(Deserialize)]
pub struct GenerateAllQuery {
    pub environment: String,
}

pub async fn generate_all_config(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    query: web::Query<GenerateAllQuery>,
    principal: Principal,
) -> Result<HttpResponse> {
    require_writer(&principal)?;
    let service = parse_id::<Service>(&path)?;
    let team = state.store.read(|tables| tables.get_service(service).map(|s| s.team_id)).await?;
    let templates = render::generate_all_for_service(&state.store, team, service, &query.environment).await?;
    Ok(HttpResponse::Ok().json(templates))
}

#[derive(Deserialize)]
pub struct SolutionComposeQuery {
    pub environment: String,
}

pub async fn generate_solution_compose(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    query: web::Query<SolutionComposeQuery>,
    principal: Principal,
) -> Result<HttpResponse> {
    require_writer(&principal)?;
    let solution = parse_id(&path)?;
    let template = render::generate_solution_compose(&state.store, solution, &query.environment).await?;
    Ok(HttpResponse::Ok().json(template))
}

pub async fn team_topology(state: web::Data<Arc<AppState>>, path: web::Path<String>) -> Result<HttpResponse> {
    let team = parse_team_id(&path)?;
    let topo = topology::team_topology(&state.store, team).await;
    Ok(HttpResponse::Ok().json(topo))
}

pub async fn ecosystem_stats(state: web::Data<Arc<AppState>>, path: web::Path<String>) -> Result<HttpResponse> {
    let team = parse_team_id(&path)?;
    let stats = topology::ecosystem_stats(&state.store, team).await;
    Ok(HttpResponse::Ok().json(stats))
}

pub async fn check_health(state: web::Data<Arc<AppState>>, path: web::Path<String>) -> Result<HttpResponse> {
    let id = parse_id::<Service>(&path)?;
    let result = health::check(&state.store, &state.http_client, state.health_probe_timeout(), id).await?;
    Ok(HttpResponse::Ok().json(result))
}
