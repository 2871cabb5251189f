// src/services/metrics_service.rs

use chrono::{DateTime, Local, Utc};
use serde_json::Value;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::MetricsRepository,
    models::{
        auth::Role,
        metrics::{bucket_by_day, local_day_bounds, DashboardCards, MetricEvent, MetricEventType, MetricsSummary, TimeSeriesPoint},
    },
    services::authorization::TenantScope,
};

#[derive(Clone)]
pub struct MetricsService {
    repo: MetricsRepository,
    pool: PgPool,
}

fn check_range(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<(), AppError> {
    if from > to {
        return Err(AppError::BadRequest("metrics.invalid_range"));
    }
    Ok(())
}

impl MetricsService {
    pub fn new(repo: MetricsRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    /// Uma contagem por tipo no intervalo fechado [from, to]; tipos sem eventos = 0.
    pub async fn summarize(
        &self,
        scope: &TenantScope,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<MetricsSummary, AppError> {
        scope.authorize(Role::Operador)?;
        check_range(from, to)?;
        let Some(organization_id) = scope.organization_id else {
            return Ok(MetricsSummary::default());
        };

        let counts = self.repo.count_by_type(organization_id, from, to).await?;
        Ok(MetricsSummary::from_counts(counts))
    }

    /// Série diária (dia LOCAL do servidor), uma série por tipo ou só a do tipo pedido.
    pub async fn time_series(
        &self,
        scope: &TenantScope,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        event_type: Option<MetricEventType>,
    ) -> Result<Vec<TimeSeriesPoint>, AppError> {
        scope.authorize(Role::Operador)?;
        check_range(from, to)?;
        let Some(organization_id) = scope.organization_id else {
            return Ok(Vec::new());
        };

        let events = self.repo.events_between(organization_id, from, to, event_type).await?;
        Ok(bucket_by_day(events))
    }

    pub async fn dashboard_cards(&self, scope: &TenantScope) -> Result<DashboardCards, AppError> {
        scope.authorize(Role::Operador)?;
        let Some(organization_id) = scope.organization_id else {
            return Ok(DashboardCards::default());
        };

        let (today_start, today_end) = local_day_bounds(Local::now().date_naive())
            .ok_or_else(|| anyhow::anyhow!("Não foi possível calcular o dia local"))?;

        self.repo.dashboard_cards(organization_id, today_start, today_end).await
    }

    /// Caso genérico `metric_event` do webhook: grava um tipo já validado.
    pub async fn record_external(
        &self,
        scope: &TenantScope,
        event_type: MetricEventType,
        metadata: Value,
    ) -> Result<MetricEvent, AppError> {
        scope.authorize(Role::Operador)?;
        let organization_id = scope.require_organization()?;

        let event = self
            .repo
            .record(&self.pool, event_type, organization_id, scope.user_id, metadata)
            .await?;

        tracing::info!(
            organization_id = %organization_id,
            event_type = event_type.as_str(),
            "📊 Evento de métrica registrado"
        );
        Ok(event)
    }
}
