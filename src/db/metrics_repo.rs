// src/db/metrics_repo.rs

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::metrics::{DashboardCards, MetricEvent, MetricEventType},
};

#[derive(Clone)]
pub struct MetricsRepository {
    pool: PgPool,
}

impl MetricsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Único caminho de escrita do ledger: INSERT. Não existe UPDATE/DELETE aqui
    /// (e o trigger do banco recusaria).
    pub async fn record<'e, E>(
        &self,
        executor: E,
        event_type: MetricEventType,
        organization_id: Uuid,
        user_id: Uuid,
        metadata: Value,
    ) -> Result<MetricEvent, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let event = sqlx::query_as::<_, MetricEvent>(
            r#"
            INSERT INTO metric_events (type, metadata, user_id, organization_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(event_type)
        .bind(metadata)
        .bind(user_id)
        .bind(organization_id)
        .fetch_one(executor)
        .await?;
        Ok(event)
    }

    // Contagem por tipo no intervalo fechado [from, to]
    pub async fn count_by_type(
        &self,
        organization_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<(MetricEventType, i64)>, AppError> {
        let rows = sqlx::query_as::<_, (MetricEventType, i64)>(
            r#"
            SELECT type, COUNT(*)
            FROM metric_events
            WHERE organization_id = $1 AND created_at >= $2 AND created_at <= $3
            GROUP BY type
            "#,
        )
        .bind(organization_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// (tipo, instante) de cada evento do intervalo. O agrupamento por dia local
    /// é feito em Rust, no fuso do servidor.
    pub async fn events_between(
        &self,
        organization_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        event_type: Option<MetricEventType>,
    ) -> Result<Vec<(MetricEventType, DateTime<Utc>)>, AppError> {
        let rows = sqlx::query_as::<_, (MetricEventType, DateTime<Utc>)>(
            r#"
            SELECT type, created_at
            FROM metric_events
            WHERE organization_id = $1
              AND created_at >= $2 AND created_at <= $3
              AND ($4::metric_event_type IS NULL OR type = $4)
            ORDER BY created_at ASC
            "#,
        )
        .bind(organization_id)
        .bind(from)
        .bind(to)
        .bind(event_type)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Cards do painel: contagens AO VIVO sobre leads e agendamentos, não sobre o ledger.
    pub async fn dashboard_cards(
        &self,
        organization_id: Uuid,
        today_start: DateTime<Utc>,
        today_end: DateTime<Utc>,
    ) -> Result<DashboardCards, AppError> {
        let (total_leads, qualified_leads, scheduled_appointments, today_appointments) =
            sqlx::query_as::<_, (i64, i64, i64, i64)>(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM leads WHERE organization_id = $1),
                    (SELECT COUNT(*) FROM leads WHERE organization_id = $1 AND status = 'qualificado'),
                    (SELECT COUNT(*) FROM appointments
                        WHERE organization_id = $1 AND status IN ('agendado', 'confirmado')),
                    (SELECT COUNT(*) FROM appointments
                        WHERE organization_id = $1 AND scheduled_at >= $2 AND scheduled_at < $3)
                "#,
            )
            .bind(organization_id)
            .bind(today_start)
            .bind(today_end)
            .fetch_one(&self.pool)
            .await?;

        Ok(DashboardCards {
            total_leads,
            qualified_leads,
            scheduled_appointments,
            today_appointments,
        })
    }
}
