// src/db/organization_repo.rs

use serde_json::Value;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::organization::{Organization, OrganizationBrief, OrganizationOverview},
};

#[derive(Clone)]
pub struct OrganizationRepository {
    pool: PgPool,
}

impl OrganizationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Cria uma nova organização. Slug duplicado vira 409.
    #[allow(clippy::too_many_arguments)]
    pub async fn create<'e, E>(
        &self,
        executor: E,
        name: &str,
        slug: &str,
        webhook_url: Option<&str>,
        whatsapp_link: Option<&str>,
        webhook_secret_hash: Option<&str>,
        metadata: Value,
    ) -> Result<Organization, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Organization>(
            r#"
            INSERT INTO organizations (name, slug, webhook_url, whatsapp_link, webhook_secret_hash, metadata)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(slug)
        .bind(webhook_url)
        .bind(whatsapp_link)
        .bind(webhook_secret_hash)
        .bind(metadata)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() && db_err.constraint() == Some("organizations_slug_key") {
                    return AppError::SlugAlreadyExists;
                }
            }
            e.into()
        })
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Organization>, AppError> {
        let org = sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(org)
    }

    /// Visão do super admin: todas as organizações com contadores, mais novas primeiro.
    pub async fn list_overview(&self) -> Result<Vec<OrganizationOverview>, AppError> {
        let rows = sqlx::query_as::<_, OrganizationOverview>(
            r#"
            SELECT
                o.*,
                (SELECT COUNT(*) FROM leads l WHERE l.organization_id = o.id) AS lead_count,
                (SELECT COUNT(*) FROM appointments a WHERE a.organization_id = o.id) AS appointment_count,
                (SELECT COUNT(*) FROM users u WHERE u.organization_id = o.id) AS user_count
            FROM organizations o
            ORDER BY o.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_brief(&self) -> Result<Vec<OrganizationBrief>, AppError> {
        let rows = sqlx::query_as::<_, OrganizationBrief>(
            "SELECT id, name, slug, created_at FROM organizations ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_brief(&self, id: Uuid) -> Result<Option<OrganizationBrief>, AppError> {
        let row = sqlx::query_as::<_, OrganizationBrief>(
            "SELECT id, name, slug, created_at FROM organizations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}
