// src/models/metrics.rs

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;

use crate::common::error::AppError;

// Mapeia o CREATE TYPE metric_event_type
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "metric_event_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MetricEventType {
    LeadReceived,
    Qualified,
    Scheduled,
    NoShow,
    FollowUp,
    Conversion,
}

impl MetricEventType {
    pub const ALL: [MetricEventType; 6] = [
        MetricEventType::LeadReceived,
        MetricEventType::Qualified,
        MetricEventType::Scheduled,
        MetricEventType::NoShow,
        MetricEventType::FollowUp,
        MetricEventType::Conversion,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MetricEventType::LeadReceived => "lead_received",
            MetricEventType::Qualified => "qualified",
            MetricEventType::Scheduled => "scheduled",
            MetricEventType::NoShow => "no_show",
            MetricEventType::FollowUp => "follow_up",
            MetricEventType::Conversion => "conversion",
        }
    }
}

impl FromStr for MetricEventType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| AppError::UnknownEventType(s.to_string()))
    }
}

// Linha do ledger. Nunca é alterada depois do INSERT.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetricEvent {
    pub id: Uuid,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub event_type: MetricEventType,
    pub metadata: Value,
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub created_at: DateTime<Utc>,
}

// --- LEITURA ---

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    pub leads_received: i64,
    pub qualified: i64,
    pub scheduled: i64,
    pub no_show: i64,
    pub conversions: i64,
}

impl MetricsSummary {
    /// Dobra as contagens agrupadas por tipo. Tipos ausentes ficam em 0.
    pub fn from_counts<I>(counts: I) -> Self
    where
        I: IntoIterator<Item = (MetricEventType, i64)>,
    {
        let mut summary = Self::default();
        for (event_type, count) in counts {
            match event_type {
                MetricEventType::LeadReceived => summary.leads_received += count,
                MetricEventType::Qualified => summary.qualified += count,
                MetricEventType::Scheduled => summary.scheduled += count,
                MetricEventType::NoShow => summary.no_show += count,
                MetricEventType::Conversion => summary.conversions += count,
                // follow_up não aparece nos cards de resumo
                MetricEventType::FollowUp => {}
            }
        }
        summary
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TimeSeriesPoint {
    #[schema(value_type = String, format = Date, example = "2025-03-01")]
    pub date: NaiveDate,
    pub count: i64,
    #[serde(rename = "type")]
    pub event_type: MetricEventType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCards {
    pub total_leads: i64,
    pub qualified_leads: i64,
    pub scheduled_appointments: i64,
    pub today_appointments: i64,
}

/// Agrupa eventos por dia do calendário LOCAL do servidor (e por tipo),
/// ordenado por data e depois por tipo.
pub fn bucket_by_day<I>(events: I) -> Vec<TimeSeriesPoint>
where
    I: IntoIterator<Item = (MetricEventType, DateTime<Utc>)>,
{
    let mut buckets: BTreeMap<(NaiveDate, MetricEventType), i64> = BTreeMap::new();
    for (event_type, at) in events {
        let day = at.with_timezone(&Local).date_naive();
        *buckets.entry((day, event_type)).or_insert(0) += 1;
    }
    buckets
        .into_iter()
        .map(|((date, event_type), count)| TimeSeriesPoint { date, count, event_type })
        .collect()
}

/// Início e fim (exclusivo) de um dia local, em UTC.
pub fn local_day_bounds(day: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = Local.from_local_datetime(&day.and_hms_opt(0, 0, 0)?).earliest()?;
    let next = day.succ_opt()?;
    let end = Local.from_local_datetime(&next.and_hms_opt(0, 0, 0)?).earliest()?;
    Some((start.with_timezone(&Utc), end.with_timezone(&Utc)))
}

// --- PERÍODO ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub enum MetricsPeriod {
    #[serde(rename = "7d")]
    Week,
    #[default]
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
    #[serde(rename = "365d")]
    Year,
}

impl MetricsPeriod {
    pub fn days(self) -> i64 {
        match self {
            MetricsPeriod::Week => 7,
            MetricsPeriod::Month => 30,
            MetricsPeriod::Quarter => 90,
            MetricsPeriod::Year => 365,
        }
    }

    /// Intervalo fechado [agora - N dias, agora].
    pub fn range_ending_at(self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        (now - Duration::days(self.days()), now)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricsView {
    Summary,
    Overtime,
    Cards,
    #[default]
    #[serde(other)]
    All,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsQuery {
    #[serde(default)]
    pub period: MetricsPeriod,
    #[serde(default, rename = "type")]
    pub view: MetricsView,
    pub event_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Aceita RFC 3339 ou uma data simples (`YYYY-MM-DD`). Para datas simples o
/// início é 00:00 local; com `end_of_day` o fim é o último instante do dia local.
pub fn parse_range_bound(raw: &str, end_of_day: bool) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let day = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let (start, end) = local_day_bounds(day)?;
    Some(if end_of_day { end - Duration::milliseconds(1) } else { start })
}

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct MetricsRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

// Resposta "tudo" do /api/metricas (tipo ausente ou desconhecido)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MetricsOverview {
    pub summary: MetricsSummary,
    pub overtime: Vec<TimeSeriesPoint>,
    pub cards: DashboardCards,
    pub period: MetricsRange,
}
