//! Config Template persistence (half of C9): the versioned upsert every
//! renderer in `render` goes through.

use crate::ids::{Id, TeamId};
use crate::models::{ConfigTemplate, Service, TemplateType, Timestamps};
use crate::store::Store;

/// Increment version if a row exists for `(service, type, environment)`,
/// otherwise create at version 1.
pub async fn upsert(
    store: &Store,
    team: TeamId,
    service: Id<Service>,
    template_type: TemplateType,
    environment: &str,
    content: String,
    generated_from: &str,
) -> ConfigTemplate {
    let environment = environment.to_string();
    let generated_from = generated_from.to_string();
    store
        .transaction(move |tables| {
            let existing_id = tables
                .find_template(service, template_type, &environment)
                .map(|t| t.id.as_uuid());

            let template = if let Some(id) = existing_id {
                let t = tables.templates.get_mut(&id).unwrap();
                t.content = content;
                t.version += 1;
                t.generated_from = generated_from;
                t.timestamps.touch();
                t.clone()
            } else {
                let t = ConfigTemplate {
                    id: Id::new(),
                    team_id: team,
                    service_id: service,
                    template_type,
                    environment,
                    content,
                    auto_generated: true,
                    generated_from,
                    version: 1,
                    timestamps: Timestamps::now(),
                };
                tables.templates.insert(t.id.as_uuid(), t.clone());
                t
            };
            Ok::<_, crate::error::RegistryError>(template)
        })
        .await
        .expect("upsert transaction is infallible")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_upsert_increments_version_in_place() {
        let store = Store::new();
        let team = TeamId::new();
        let service = Id::new();

        let first = upsert(
            &store,
            team,
            service,
            TemplateType::ApplicationYml,
            "dev",
            "spring: {}".to_string(),
            "service:seed",
        )
        .await;
        assert_eq!(first.version, 1);

        let second = upsert(
            &store,
            team,
            service,
            TemplateType::ApplicationYml,
            "dev",
            "spring: { updated: true }".to_string(),
            "service:seed",
        )
        .await;
        assert_eq!(second.id, first.id);
        assert_eq!(second.version, 2);
        assert!(second.content.contains("updated"));
    }
}
