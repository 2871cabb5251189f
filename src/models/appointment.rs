// src/models/appointment.rs

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;
use validator::Validate;

use crate::{common::error::AppError, models::metrics::MetricEventType};

// --- Enums ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "appointment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Agendado,
    Confirmado,
    Realizado,
    Cancelado,
    NoShow,
}

impl AppointmentStatus {
    pub const ACTIVE: [AppointmentStatus; 2] = [AppointmentStatus::Agendado, AppointmentStatus::Confirmado];

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AppointmentStatus::Realizado | AppointmentStatus::Cancelado | AppointmentStatus::NoShow
        )
    }

    /// Mesmo status = só atualização de notas. Status finais não mudam
    /// e nada volta para `agendado`.
    pub fn check_transition(self, to: AppointmentStatus) -> Result<(), AppError> {
        if self == to {
            return Ok(());
        }
        if self.is_terminal() || to == AppointmentStatus::Agendado {
            return Err(AppError::BadRequest("appointment.terminal_status"));
        }
        Ok(())
    }

    /// Só `no_show` vira evento nesta camada; confirmado/realizado/cancelado não.
    pub fn metric_on_enter(self) -> Option<MetricEventType> {
        match self {
            AppointmentStatus::NoShow => Some(MetricEventType::NoShow),
            _ => None,
        }
    }
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Campos de exibição do lead (colunas prefixadas no SELECT; o id vem de a.lead_id)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadBrief {
    #[sqlx(rename = "lead_id")]
    pub id: Uuid,
    #[sqlx(rename = "lead_name")]
    pub name: String,
    #[sqlx(rename = "lead_phone")]
    pub phone: String,
    #[sqlx(rename = "lead_procedure")]
    pub procedure: String,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentWithLead {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub appointment: Appointment,
    #[sqlx(flatten)]
    pub lead: LeadBrief,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AppointmentFilters {
    pub status: Option<AppointmentStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Aceita RFC 3339 (`2025-03-01T10:00:00Z`) ou o formato do input
/// datetime-local (`2025-03-01T10:00`), este último no fuso do servidor.
pub fn parse_scheduled_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|local| local.with_timezone(&Utc))
}

// --- Payloads HTTP ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentPayload {
    pub lead_id: Uuid,
    #[schema(example = "2025-03-01T10:00:00Z")]
    pub scheduled_at: String,
    #[validate(length(max = 2000, message = "max_length_2000"))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointmentStatusPayload {
    pub status: AppointmentStatus,
    #[validate(length(max = 2000, message = "max_length_2000"))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentListQuery {
    pub page: Option<i64>,
    #[serde(alias = "pageSize")]
    pub limit: Option<i64>,
    pub status: Option<AppointmentStatus>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}
