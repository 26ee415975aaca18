//! `registry-api`: a thin illustrative HTTP binary over `registry_core`,
//! the way `raftcat` sits over `shipcat_definitions`. See `SPEC_FULL.md` §6.

use actix_web::{web, App, HttpServer};
use registry_api::{app_state, handlers};
use registry_core::config::RegistryConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_default_env().filter_level(log::LevelFilter::Info).init();

    let config = RegistryConfig::from_env();
    let state = app_state(config);

    log::info!("registry-api listening on 0.0.0.0:8080");

    HttpServer::new(move || {
        App::new().app_data(web::Data::new(state.clone())).service(
            web::scope("/api/v1/registry")
                .route("/teams/{team_id}/services", web::post().to(handlers::create_service))
                .route("/teams/{team_id}/services", web::get().to(handlers::list_services))
                .route("/services/{id}", web::get().to(handlers::get_service))
                .route("/services/{id}/health", web::post().to(handlers::check_health))
                .route("/dependencies", web::post().to(handlers::create_dependency))
                .route("/dependencies/{id}", web::delete().to(handlers::delete_dependency))
                .route("/teams/{team_id}/dependencies/graph", web::get().to(handlers::dependency_graph))
                .route("/services/{id}/dependencies/impact", web::get().to(handlers::impact_analysis))
                .route("/teams/{team_id}/dependencies/startup-order", web::get().to(handlers::startup_order))
                .route("/teams/{team_id}/dependencies/cycles", web::get().to(handlers::detect_cycles))
                .route("/routes", web::post().to(handlers::create_route))
                .route("/routes/check", web::get().to(handlers::check_route_availability))
                .route("/ports/auto-allocate", web::post().to(handlers::auto_allocate_port))
                .route("/teams/{team_id}/ports/conflicts", web::get().to(handlers::port_conflicts))
                .route("/services/{id}/config/generate", web::post().to(handlers::generate_config))
                .route("/services/{id}/config/generate-all", web::post().to(handlers::generate_all_config))
                .route(
                    "/solutions/{id}/config/docker-compose",
                    web::post().to(handlers::generate_solution_compose),
                )
                .route("/teams/{team_id}/topology", web::get().to(handlers::team_topology))
                .route("/teams/{team_id}/topology/stats", web::get().to(handlers::ecosystem_stats)),
        )
    })
    .bind(("0.0.0.0", 8080))?
    .run()
    .await
}
