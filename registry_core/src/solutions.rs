//! Solution Aggregate (C5).

use crate::error::{RegistryError, Result};
use crate::ids::{Id, TeamId};
use crate::models::{MemberRole, Service, Solution, SolutionCategory, SolutionMember, SolutionStatus};
use crate::slug::unique_solution_slug;
use crate::store::Store;

pub async fn create_solution(
    store: &Store,
    team: TeamId,
    name: &str,
    description: Option<String>,
    category: SolutionCategory,
    status: SolutionStatus,
    creator: &str,
    max_solutions_per_team: usize,
) -> Result<Solution> {
    let name = name.to_string();
    let creator = creator.to_string();
    store
        .transaction(move |tables| {
            if tables.solutions.values().filter(|s| s.team_id == team).count() >= max_solutions_per_team {
                return Err(RegistryError::validation(format!(
                    "team has reached the maximum of {} solutions",
                    max_solutions_per_team
                )));
            }
            let base = crate::slug::slugify(&name);
            let slug = unique_solution_slug(tables, team, &base);
            let solution = Solution {
                id: Id::new(),
                team_id: team,
                slug,
                name,
                description,
                category,
                status,
                icon: None,
                color: None,
                creator,
                timestamps: crate::models::Timestamps::now(),
            };
            tables.solutions.insert(solution.id.as_uuid(), solution.clone());
            Ok(solution)
        })
        .await
}

pub async fn delete_solution(store: &Store, id: Id<Solution>) -> Result<()> {
    store
        .transaction(|tables| {
            if tables.solutions.remove(&id.as_uuid()).is_none() {
                return Err(RegistryError::not_found(format!("solution {} not found", id)));
            }
            let member_ids: Vec<_> = tables
                .solution_members
                .values()
                .filter(|m| m.solution_id == id)
                .map(|m| m.id.as_uuid())
                .collect();
            for mid in member_ids {
                tables.solution_members.remove(&mid);
            }
            Ok(())
        })
        .await
}

pub async fn add_member(
    store: &Store,
    team: TeamId,
    solution: Id<Solution>,
    service: Id<Service>,
    role: MemberRole,
    notes: Option<String>,
) -> Result<SolutionMember> {
    store
        .transaction(move |tables| {
            tables.get_solution(solution)?;
            let svc = tables.get_service(service)?;
            if svc.team_id != team {
                return Err(RegistryError::validation("service must belong to the same team"));
            }
            if tables
                .solution_members
                .values()
                .any(|m| m.solution_id == solution && m.service_id == service)
            {
                return Err(RegistryError::validation("service is already a member of this solution"));
            }
            let next_order = tables
                .solution_members
                .values()
                .filter(|m| m.solution_id == solution)
                .map(|m| m.display_order)
                .max()
                .map(|m| m + 1)
                .unwrap_or(0);
            let member = SolutionMember {
                id: Id::new(),
                solution_id: solution,
                service_id: service,
                role,
                display_order: next_order,
                notes,
                timestamps: crate::models::Timestamps::now(),
            };
            tables.solution_members.insert(member.id.as_uuid(), member.clone());
            Ok(member)
        })
        .await
}

pub async fn remove_member(store: &Store, solution: Id<Solution>, service: Id<Service>) -> Result<()> {
    store
        .transaction(move |tables| {
            let member_id = tables
                .solution_members
                .values()
                .find(|m| m.solution_id == solution && m.service_id == service)
                .map(|m| m.id.as_uuid())
                .ok_or_else(|| RegistryError::not_found("service is not a member of solution"))?;
            tables.solution_members.remove(&member_id);
            Ok(())
        })
        .await
}

pub async fn update_member(
    store: &Store,
    solution: Id<Solution>,
    service: Id<Service>,
    role: Option<MemberRole>,
    notes: Option<Option<String>>,
) -> Result<SolutionMember> {
    store
        .transaction(move |tables| {
            let member_id = tables
                .solution_members
                .values()
                .find(|m| m.solution_id == solution && m.service_id == service)
                .map(|m| m.id.as_uuid())
                .ok_or_else(|| RegistryError::not_found("service is not a member of solution"))?;
            let member = tables.solution_members.get_mut(&member_id).unwrap();
            if let Some(r) = role {
                member.role = r;
            }
            if let Some(n) = notes {
                member.notes = n;
            }
            member.timestamps.touch();
            Ok(member.clone())
        })
        .await
}

/// Validate set-equality between `ordered_service_ids` and the solution's
/// current members, then assign `displayOrder = index`.
pub async fn reorder_members(
    store: &Store,
    solution: Id<Solution>,
    ordered_service_ids: &[Id<Service>],
) -> Result<Vec<SolutionMember>> {
    let ordered_service_ids = ordered_service_ids.to_vec();
    store
        .transaction(move |tables| {
            let current: std::collections::BTreeSet<Id<Service>> = tables
                .members_of(solution)
                .into_iter()
                .map(|m| m.service_id)
                .collect();
            let requested: std::collections::BTreeSet<Id<Service>> = ordered_service_ids.iter().copied().collect();
            if let Some(bad) = ordered_service_ids.iter().find(|id| !current.contains(id)) {
                return Err(RegistryError::validation(format!(
                    "service {} is not a member of solution",
                    bad
                )));
            }
            if requested != current {
                return Err(RegistryError::validation(
                    "reorder list must match the current member set exactly",
                ));
            }
            for (idx, sid) in ordered_service_ids.iter().enumerate() {
                let member_id = tables
                    .solution_members
                    .values()
                    .find(|m| m.solution_id == solution && m.service_id == *sid)
                    .map(|m| m.id.as_uuid())
                    .unwrap();
                tables.solution_members.get_mut(&member_id).unwrap().display_order = idx as i64;
            }
            Ok(tables.members_of(solution).into_iter().cloned().collect())
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
    async fn add_member_rejects_duplicate() {
        let store = Store::new();
        let team = TeamId::new();
        let s = svc(team, "a");
        let sid = s.id;
        store.transaction(|t| { t.services.insert(s.id.as_uuid(), s); Ok(()) }).await.unwrap();
        let sol = create_solution(&store, team, "Checkout", None, SolutionCategory::Product, SolutionStatus::Active, "tester", 100)
            .await
            .unwrap();
        add_member(&store, team, sol.id, sid, MemberRole::Core, None).await.unwrap();
        let err = add_member(&store, team, sol.id, sid, MemberRole::Core, None).await.unwrap_err();
        assert!(err.to_string().contains("already a member"));
    }

    #[tokio::test]
    async fn reorder_rejects_set_mismatch() {
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
        let sol = create_solution(&store, team, "Checkout", None, SolutionCategory::Product, SolutionStatus::Active, "tester", 100)
            .await
            .unwrap();
        add_member(&store, team, sol.id, aid, MemberRole::Core, None).await.unwrap();

        let err = reorder_members(&store, sol.id, &[aid, bid]).await.unwrap_err();
        assert!(err.to_string().contains("is not a member"));
    }

    #[tokio::test]
    async fn reorder_assigns_display_order_by_index() {
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
        let sol = create_solution(&store, team, "Checkout", None, SolutionCategory::Product, SolutionStatus::Active, "tester", 100)
            .await
            .unwrap();
        add_member(&store, team, sol.id, aid, MemberRole::Core, None).await.unwrap();
        add_member(&store, team, sol.id, bid, MemberRole::Supporting, None).await.unwrap();

        let reordered = reorder_members(&store, sol.id, &[bid, aid]).await.unwrap();
        let order_of = |id: Id<Service>| reordered.iter().find(|m| m.service_id == id).unwrap().display_order;
        assert_eq!(order_of(bid), 0);
        assert_eq!(order_of(aid), 1);
    }
}
