// src/db/lead_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::contains_pattern, error::AppError, pagination::Pagination},
    models::lead::{Lead, LeadFilters, LeadListItem, LeadStatus, NewLead},
};

// Filtro compartilhado entre a listagem e a contagem: o total sempre
// reflete o conjunto FILTRADO.
const LEAD_LIST_FILTER: &str = r#"
    l.organization_id = $1
    AND l.user_id = $2
    AND ($3::lead_status IS NULL OR l.status = $3)
    AND ($4::text IS NULL OR l.name ILIKE $4 OR l.phone LIKE $4)
"#;

#[derive(Clone)]
pub struct LeadRepository {
    pool: PgPool,
}

impl LeadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        user_id: Uuid,
        lead: &NewLead,
    ) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let procedure = lead.procedure.as_deref().map(str::trim).unwrap_or("");
        let source = lead
            .source
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("manual");

        let created = sqlx::query_as::<_, Lead>(
            r#"
            INSERT INTO leads (name, phone, procedure, source, notes, user_id, organization_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(lead.name.trim())
        .bind(lead.phone.trim())
        .bind(procedure)
        .bind(source)
        .bind(lead.notes.as_deref())
        .bind(user_id)
        .bind(organization_id)
        .fetch_one(executor)
        .await?;
        Ok(created)
    }

    /// Busca por (id, organização, dono) e trava a linha até o fim da transação.
    pub async fn find_for_update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lead = sqlx::query_as::<_, Lead>(
            r#"
            SELECT * FROM leads
            WHERE id = $1 AND organization_id = $2 AND user_id = $3
            FOR UPDATE
            "#,
        )
        .bind(id)
        .bind(organization_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;
        Ok(lead)
    }

    /// Atualiza o status. `notes = None` preserva as notas atuais.
    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        organization_id: Uuid,
        user_id: Uuid,
        status: LeadStatus,
        notes: Option<&str>,
    ) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Lead>(
            r#"
            UPDATE leads
            SET status = $4, notes = COALESCE($5, notes), updated_at = NOW()
            WHERE id = $1 AND organization_id = $2 AND user_id = $3
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(organization_id)
        .bind(user_id)
        .bind(status)
        .bind(notes)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound("lead.not_found"))
    }

    /// Página de leads do dono, mais novos primeiro, com o agendamento mais recente.
    pub async fn list(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        filters: &LeadFilters,
        pagination: Pagination,
    ) -> Result<(Vec<LeadListItem>, i64), AppError> {
        let search = filters
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(contains_pattern);

        let (total,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM leads l WHERE {LEAD_LIST_FILTER}"))
            .bind(organization_id)
            .bind(user_id)
            .bind(filters.status)
            .bind(search.as_deref())
            .fetch_one(&self.pool)
            .await?;

        if total == 0 {
            return Ok((Vec::new(), 0));
        }

        let items = sqlx::query_as::<_, LeadListItem>(&format!(
            r#"
            SELECT
                l.*,
                la.id AS last_appointment_id,
                la.scheduled_at AS last_appointment_at,
                la.status AS last_appointment_status
            FROM leads l
            LEFT JOIN LATERAL (
                SELECT a.id, a.scheduled_at, a.status
                FROM appointments a
                WHERE a.lead_id = l.id AND a.organization_id = l.organization_id
                ORDER BY a.scheduled_at DESC
                LIMIT 1
            ) la ON TRUE
            WHERE {LEAD_LIST_FILTER}
            ORDER BY l.created_at DESC, l.id DESC
            LIMIT $5 OFFSET $6
            "#
        ))
        .bind(organization_id)
        .bind(user_id)
        .bind(filters.status)
        .bind(search.as_deref())
        .bind(pagination.limit)
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((items, total))
    }
}
