//! The durable entity store (C1).
//!
//! A single concrete backing everything else is written against. Swapping
//! this for a relational store later only means reimplementing `Store`'s
//! public methods; the other engines never touch `Tables` directly.
//!
//! Every public method that checks an invariant and then mutates acquires
//! exactly one write guard for both halves, so checks and the mutation they
//! gate are never torn apart by a concurrent writer. See
//! `Store::transaction` / `Store::read`.

use std::collections::BTreeMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{RegistryError, Result};
use crate::ids::{Id, TeamId};
use crate::models::*;

#[derive(Default)]
pub struct Tables {
    pub services: BTreeMap<Uuid, Service>,
    pub env_configs: BTreeMap<Uuid, EnvironmentConfig>,
    pub port_allocations: BTreeMap<Uuid, PortAllocation>,
    pub port_ranges: BTreeMap<Uuid, PortRange>,
    pub dependencies: BTreeMap<Uuid, ServiceDependency>,
    pub routes: BTreeMap<Uuid, ApiRoute>,
    pub infra_resources: BTreeMap<Uuid, InfraResource>,
    pub solutions: BTreeMap<Uuid, Solution>,
    pub solution_members: BTreeMap<Uuid, SolutionMember>,
    pub workstations: BTreeMap<Uuid, WorkstationProfile>,
    pub templates: BTreeMap<Uuid, ConfigTemplate>,
}

/// In-memory, lock-guarded entity store.
pub struct Store {
    tables: RwLock<Tables>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Store {
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Run a read-only closure under a shared guard.
    pub async fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Tables) -> R,
    {
        let guard = self.tables.read().await;
        f(&guard)
    }

    /// Run a check-then-mutate closure under a single exclusive guard, the
    /// unit of atomicity every public engine operation must use.
    pub async fn transaction<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Tables) -> Result<R>,
    {
        let mut guard = self.tables.write().await;
        f(&mut guard)
    }
}

impl Tables {
    pub fn get_service(&self, id: Id<Service>) -> Result<&Service> {
        self.services
            .get(&id.as_uuid())
            .ok_or_else(|| RegistryError::not_found(format!("service {} not found", id)))
    }

    pub fn find_service_by_slug(&self, team: TeamId, slug: &str) -> Option<&Service> {
        self.services
            .values()
            .find(|s| s.team_id == team && s.slug == slug)
    }

    pub fn services_in_team(&self, team: TeamId) -> Vec<&Service> {
        self.services.values().filter(|s| s.team_id == team).collect()
    }

    pub fn services_by_ids<'a>(&'a self, team: TeamId, ids: &[Id<Service>]) -> Vec<&'a Service> {
        ids.iter()
            .filter_map(|id| self.services.get(&id.as_uuid()))
            .filter(|s| s.team_id == team)
            .collect()
    }

    pub fn get_solution(&self, id: Id<Solution>) -> Result<&Solution> {
        self.solutions
            .get(&id.as_uuid())
            .ok_or_else(|| RegistryError::not_found(format!("solution {} not found", id)))
    }

    pub fn find_solution_by_slug(&self, team: TeamId, slug: &str) -> Option<&Solution> {
        self.solutions
            .values()
            .find(|s| s.team_id == team && s.slug == slug)
    }

    pub fn members_of(&self, solution: Id<Solution>) -> Vec<&SolutionMember> {
        let mut m: Vec<&SolutionMember> = self
            .solution_members
            .values()
            .filter(|sm| sm.solution_id == solution)
            .collect();
        m.sort_by_key(|sm| sm.display_order);
        m
    }

    pub fn dependencies_in_team(&self, team: TeamId) -> Vec<&ServiceDependency> {
        self.dependencies.values().filter(|d| d.team_id == team).collect()
    }

    pub fn find_dependency(
        &self,
        source: Id<Service>,
        target: Id<Service>,
        dep_type: DependencyType,
    ) -> Option<&ServiceDependency> {
        self.dependencies.values().find(|d| {
            d.source_id == source && d.target_id == target && d.dependency_type == dep_type
        })
    }

    pub fn out_degree(&self, team: TeamId, source: Id<Service>) -> usize {
        self.dependencies
            .values()
            .filter(|d| d.team_id == team && d.source_id == source)
            .count()
    }

    pub fn find_allocation(
        &self,
        team: TeamId,
        environment: &str,
        port: u32,
    ) -> Option<&PortAllocation> {
        self.port_allocations
            .values()
            .find(|a| a.team_id == team && a.environment == environment && a.port_number == port)
    }

    pub fn allocations_for(
        &self,
        team: TeamId,
        environment: &str,
        port_type: PortType,
    ) -> Vec<&PortAllocation> {
        let mut v: Vec<&PortAllocation> = self
            .port_allocations
            .values()
            .filter(|a| a.team_id == team && a.environment == environment && a.port_type == port_type)
            .collect();
        v.sort_by_key(|a| a.port_number);
        v
    }

    pub fn allocations_for_service(&self, service: Id<Service>, environment: &str) -> Vec<&PortAllocation> {
        self.port_allocations
            .values()
            .filter(|a| a.service_id == service && a.environment == environment)
            .collect()
    }

    pub fn find_range(
        &self,
        team: TeamId,
        port_type: PortType,
        environment: &str,
    ) -> Option<&PortRange> {
        self.port_ranges
            .values()
            .find(|r| r.team_id == team && r.port_type == port_type && r.environment == environment)
    }

    pub fn ranges_in_team(&self, team: TeamId) -> Vec<&PortRange> {
        self.port_ranges.values().filter(|r| r.team_id == team).collect()
    }

    pub fn routes_in_team(&self, team: TeamId) -> Vec<&ApiRoute> {
        self.routes.values().filter(|r| r.team_id == team).collect()
    }

    pub fn routes_for_service(&self, service: Id<Service>, environment: &str) -> Vec<&ApiRoute> {
        self.routes
            .values()
            .filter(|r| r.service_id == service && r.environment == environment)
            .collect()
    }

    pub fn outgoing_dependencies(&self, service: Id<Service>) -> Vec<&ServiceDependency> {
        self.dependencies.values().filter(|d| d.source_id == service).collect()
    }

    pub fn incoming_dependencies(&self, service: Id<Service>) -> Vec<&ServiceDependency> {
        self.dependencies.values().filter(|d| d.target_id == service).collect()
    }

    pub fn env_configs_for(&self, service: Id<Service>, environment: &str) -> Vec<&EnvironmentConfig> {
        self.env_configs
            .values()
            .filter(|e| e.service_id == service && e.environment == environment)
            .collect()
    }

    pub fn infra_for_service(&self, service: Id<Service>, environment: &str) -> Vec<&InfraResource> {
        self.infra_resources
            .values()
            .filter(|r| r.service_id == Some(service) && r.environment == environment)
            .collect()
    }

    pub fn infra_in_team(&self, team: TeamId) -> Vec<&InfraResource> {
        self.infra_resources.values().filter(|r| r.team_id == team).collect()
    }

    pub fn find_template(
        &self,
        service: Id<Service>,
        template_type: TemplateType,
        environment: &str,
    ) -> Option<&ConfigTemplate> {
        self.templates.values().find(|t| {
            t.service_id == service && t.template_type == template_type && t.environment == environment
        })
    }

    pub fn find_workstation_by_name(&self, team: TeamId, name: &str) -> Option<&WorkstationProfile> {
        self.workstations
            .values()
            .find(|w| w.team_id == team && w.name == name)
    }

    pub fn workstations_in_team(&self, team: TeamId) -> Vec<&WorkstationProfile> {
        self.workstations.values().filter(|w| w.team_id == team).collect()
    }

    pub fn default_workstation(&self, team: TeamId) -> Option<&WorkstationProfile> {
        self.workstations
            .values()
            .find(|w| w.team_id == team && w.is_default)
    }
}
