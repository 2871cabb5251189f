// src/services/organization_service.rs

use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::OrganizationRepository,
    models::{
        auth::{Role, User},
        organization::{
            normalize_slug, AccessibleOrganization, CreateOrganizationPayload, NotificationConfig, Organization,
            OrganizationOverview,
        },
    },
    services::{
        auth::{hash_password, verify_password},
        authorization::{authorize, resolve_organization},
    },
};

#[derive(Clone)]
pub struct OrganizationService {
    repo: OrganizationRepository,
    pool: PgPool,
}

impl OrganizationService {
    pub fn new(repo: OrganizationRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    /// Cria um tenant. Exclusivo do super admin.
    pub async fn create_organization(
        &self,
        actor: &User,
        payload: &CreateOrganizationPayload,
    ) -> Result<Organization, AppError> {
        authorize(actor.role, Role::SuperAdmin)?;

        let slug = normalize_slug(&payload.slug).ok_or(AppError::BadRequest("organization.invalid_slug"))?;

        // O segredo do webhook só existe no banco como hash
        let secret_hash = match payload.webhook_secret.as_deref() {
            Some(secret) => Some(hash_password(secret).await?),
            None => None,
        };

        let metadata = match &payload.metadata {
            Some(Value::Object(map)) => Value::Object(map.clone()),
            _ => json!({}),
        };

        let org = self
            .repo
            .create(
                &self.pool,
                payload.name.trim(),
                &slug,
                payload.webhook_url.as_deref(),
                payload.whatsapp_link.as_deref(),
                secret_hash.as_deref(),
                metadata,
            )
            .await?;

        tracing::info!(organization_id = %org.id, "🏥 Organização '{}' criada ({})", org.name, org.slug);
        Ok(org)
    }

    pub async fn list_with_counts(&self, actor: &User) -> Result<Vec<OrganizationOverview>, AppError> {
        authorize(actor.role, Role::SuperAdmin)?;
        self.repo.list_overview().await
    }

    /// Super admin vê todas; os demais, exatamente a própria (nunca "a primeira do sistema").
    pub async fn list_accessible(&self, user: &User) -> Result<Vec<AccessibleOrganization>, AppError> {
        let orgs = if user.role == Role::SuperAdmin {
            self.repo.list_brief().await?
        } else {
            let own = resolve_organization(user, None)?.ok_or(AppError::AccessDenied("access.no_organization"))?;
            self.repo.find_brief(own).await?.into_iter().collect()
        };

        Ok(orgs
            .into_iter()
            .map(|organization| AccessibleOrganization { organization, role: user.role })
            .collect())
    }

    /// Configuração lida pelo despachante externo de notificações.
    pub async fn notification_config(&self, actor: &User, organization_id: Uuid) -> Result<NotificationConfig, AppError> {
        authorize(actor.role, Role::Admin)?;
        resolve_organization(actor, Some(organization_id))?;

        let org = self
            .repo
            .find_by_id(organization_id)
            .await?
            .ok_or(AppError::NotFound("organization.not_found"))?;
        Ok(NotificationConfig::from(&org))
    }

    pub async fn find(&self, organization_id: Uuid) -> Result<Option<Organization>, AppError> {
        self.repo.find_by_id(organization_id).await
    }

    /// Sem segredo cadastrado, qualquer chamada passa; com segredo, o header tem que bater.
    pub async fn verify_webhook_secret(&self, org: &Organization, provided: Option<&str>) -> Result<(), AppError> {
        let Some(expected_hash) = org.webhook_secret_hash.as_deref() else {
            return Ok(());
        };
        let provided = provided.filter(|s| !s.is_empty()).ok_or(AppError::InvalidWebhookSecret)?;
        if verify_password(provided, expected_hash).await? {
            Ok(())
        } else {
            Err(AppError::InvalidWebhookSecret)
        }
    }
}
