//! Fixed bootstrap data: one team, a handful of services, and a few
//! dependencies that respect acyclicity — the "Seeded state" design note in
//! §9, here serving the CLI's in-memory store rather than a persisted one.

use registry_core::graph::create_dependency;
use registry_core::ids::{Id, TeamId};
use registry_core::models::{DependencyType, Service, ServiceType};
use registry_core::services::create_service;
use registry_core::{ports, Store};

pub const SEED_TEAM_NAME: &str = "platform-demo";

pub async fn seed(store: &Store) -> TeamId {
    let team = TeamId::new();

    let gateway = create_service(store, team, "Edge Gateway", ServiceType::Gateway, None, None, None, None, None, None, "seed", 500)
        .await
        .expect("seed gateway");
    let checkout = create_service(store, team, "Checkout API", ServiceType::SpringBoot, None, None, None, None, None, None, "seed", 500)
        .await
        .expect("seed checkout");
    let catalog = create_service(store, team, "Catalog API", ServiceType::ExpressJs, None, None, None, None, None, None, "seed", 500)
        .await
        .expect("seed catalog");
    let database = create_service(store, team, "Orders DB", ServiceType::Database, None, None, None, None, None, None, "seed", 500)
        .await
        .expect("seed database");

    let edges: [(Id<Service>, Id<Service>); 3] = [
        (gateway.id, checkout.id),
        (gateway.id, catalog.id),
        (checkout.id, database.id),
    ];
    for (source, target) in edges {
        create_dependency(store, team, source, target, DependencyType::HttpRest, None, None, None, 100)
            .await
            .expect("seed dependency");
    }

    ports::seed_default_ranges(store, team, "local").await.expect("seed ranges");

    team
}
