// src/db/appointment_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::Pagination},
    models::appointment::{Appointment, AppointmentFilters, AppointmentStatus, AppointmentWithLead},
};

const APPOINTMENT_LIST_FILTER: &str = r#"
    a.organization_id = $1
    AND ($2::appointment_status IS NULL OR a.status = $2)
    AND ($3::timestamptz IS NULL OR a.scheduled_at >= $3)
    AND ($4::timestamptz IS NULL OR a.scheduled_at <= $4)
"#;

#[derive(Clone)]
pub struct AppointmentRepository {
    pool: PgPool,
}

impl AppointmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insere o agendamento. A organização vem do lead (a FK composta confere).
    pub async fn create<'e, E>(
        &self,
        executor: E,
        lead_id: Uuid,
        organization_id: Uuid,
        user_id: Uuid,
        scheduled_at: DateTime<Utc>,
        notes: Option<&str>,
    ) -> Result<Appointment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let created = sqlx::query_as::<_, Appointment>(
            r#"
            INSERT INTO appointments (lead_id, scheduled_at, status, notes, user_id, organization_id)
            VALUES ($1, $2, 'agendado', $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(lead_id)
        .bind(scheduled_at)
        .bind(notes)
        .bind(user_id)
        .bind(organization_id)
        .fetch_one(executor)
        .await?;
        Ok(created)
    }

    pub async fn find_for_update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Appointment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT * FROM appointments
            WHERE id = $1 AND organization_id = $2 AND user_id = $3
            FOR UPDATE
            "#,
        )
        .bind(id)
        .bind(organization_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;
        Ok(appointment)
    }

    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        organization_id: Uuid,
        user_id: Uuid,
        status: AppointmentStatus,
        notes: Option<&str>,
    ) -> Result<Appointment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Appointment>(
            r#"
            UPDATE appointments
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
        .ok_or(AppError::NotFound("appointment.not_found"))
    }

    /// Exclusão física, com o mesmo casamento triplo das demais operações.
    pub async fn delete<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Appointment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let deleted = sqlx::query_as::<_, Appointment>(
            r#"
            DELETE FROM appointments
            WHERE id = $1 AND organization_id = $2 AND user_id = $3
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(organization_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;
        Ok(deleted)
    }

    /// Agenda da organização (todos os donos), em ordem cronológica.
    pub async fn list(
        &self,
        organization_id: Uuid,
        filters: AppointmentFilters,
        pagination: Pagination,
    ) -> Result<(Vec<AppointmentWithLead>, i64), AppError> {
        let (total,): (i64,) =
            sqlx::query_as(&format!("SELECT COUNT(*) FROM appointments a WHERE {APPOINTMENT_LIST_FILTER}"))
                .bind(organization_id)
                .bind(filters.status)
                .bind(filters.from)
                .bind(filters.to)
                .fetch_one(&self.pool)
                .await?;

        if total == 0 {
            return Ok((Vec::new(), 0));
        }

        let items = sqlx::query_as::<_, AppointmentWithLead>(&format!(
            r#"
            SELECT
                a.*,
                l.name AS lead_name,
                l.phone AS lead_phone,
                l.procedure AS lead_procedure
            FROM appointments a
            JOIN leads l ON l.id = a.lead_id AND l.organization_id = a.organization_id
            WHERE {APPOINTMENT_LIST_FILTER}
            ORDER BY a.scheduled_at ASC, a.id ASC
            LIMIT $5 OFFSET $6
            "#
        ))
        .bind(organization_id)
        .bind(filters.status)
        .bind(filters.from)
        .bind(filters.to)
        .bind(pagination.limit)
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((items, total))
    }
}
