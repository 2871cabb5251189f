// src/handlers/metrics.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    common::{
        error::{ApiError, AppError},
        extract::AppQuery,
    },
    config::AppState,
    middleware::i18n::Locale,
    models::metrics::{
        parse_range_bound, DashboardCards, MetricEventType, MetricsOverview, MetricsQuery, MetricsRange,
        MetricsSummary, MetricsView, TimeSeriesPoint,
    },
    services::authorization::TenantScope,
};

#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum MetricsResponse {
    Summary { summary: MetricsSummary },
    Overtime { overtime: Vec<TimeSeriesPoint> },
    Cards { cards: DashboardCards },
    All(MetricsOverview),
}

/// Datas explícitas têm precedência; o que faltar vem do período (padrão 30d).
fn resolve_range(query: &MetricsQuery, now: DateTime<Utc>) -> Result<MetricsRange, AppError> {
    let bound = |raw: Option<&str>, end_of_day: bool| {
        raw.filter(|s| !s.trim().is_empty())
            .map(|s| parse_range_bound(s, end_of_day).ok_or(AppError::BadRequest("request.invalid_query")))
            .transpose()
    };
    let (default_start, default_end) = query.period.range_ending_at(now);

    Ok(MetricsRange {
        start: bound(query.start_date.as_deref(), false)?.unwrap_or(default_start),
        end: bound(query.end_date.as_deref(), true)?.unwrap_or(default_end),
    })
}

// GET /api/metricas
#[utoipa::path(
    get,
    path = "/api/metricas",
    tag = "Metricas",
    params(
        ("period" = Option<String>, Query, description = "7d | 30d | 90d | 365d (padrão 30d)"),
        ("type" = Option<String>, Query, description = "summary | overtime | cards (ausente = tudo)"),
        ("eventType" = Option<String>, Query, description = "Filtra a série temporal por tipo de evento"),
        ("startDate" = Option<String>, Query, description = "Início explícito (ISO-8601)"),
        ("endDate" = Option<String>, Query, description = "Fim explícito (ISO-8601)"),
        ("x-organization-id" = Option<uuid::Uuid>, Header, description = "Organização (apenas super admin)")
    ),
    responses(
        (status = 200, description = "Métricas da organização", body = MetricsResponse),
        (status = 400, description = "Intervalo ou tipo de evento inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_metrics(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: TenantScope,
    AppQuery(query): AppQuery<MetricsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let range = resolve_range(&query, Utc::now()).map_err(to_api)?;
    let event_type = query
        .event_type
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(str::parse::<MetricEventType>)
        .transpose()
        .map_err(to_api)?;

    let metrics = &app_state.metrics_service;
    let response = match query.view {
        MetricsView::Summary => MetricsResponse::Summary {
            summary: metrics.summarize(&scope, range.start, range.end).await.map_err(to_api)?,
        },
        MetricsView::Overtime => MetricsResponse::Overtime {
            overtime: metrics
                .time_series(&scope, range.start, range.end, event_type)
                .await
                .map_err(to_api)?,
        },
        MetricsView::Cards => MetricsResponse::Cards {
            cards: metrics.dashboard_cards(&scope).await.map_err(to_api)?,
        },
        MetricsView::All => {
            let (summary, overtime, cards) = tokio::try_join!(
                metrics.summarize(&scope, range.start, range.end),
                metrics.time_series(&scope, range.start, range.end, event_type),
                metrics.dashboard_cards(&scope),
            )
            .map_err(to_api)?;
            MetricsResponse::All(MetricsOverview { summary, overtime, cards, period: range })
        }
    };

    Ok((StatusCode::OK, Json(response)))
}
