// src/models/lead.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::AppError,
    models::{appointment::AppointmentStatus, metrics::MetricEventType},
};

// --- ENUMS ---

// Mapeia o CREATE TYPE lead_status do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "lead_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    Novo,
    Qualificado,
    Agendado,
    Perdido,
}

impl LeadStatus {
    /// Regra do funil: qualquer status pode ir para qualquer outro (inclusive
    /// sair de `perdido`), exceto `agendado`, que só nasce da criação de um agendamento.
    pub fn check_manual_transition(self, to: LeadStatus) -> Result<(), AppError> {
        if to == LeadStatus::Agendado && self != LeadStatus::Agendado {
            return Err(AppError::BadRequest("lead.scheduled_via_appointment"));
        }
        Ok(())
    }

    /// Evento do ledger emitido quando o lead ENTRA neste status.
    pub fn metric_on_enter(self) -> Option<MetricEventType> {
        match self {
            LeadStatus::Qualificado => Some(MetricEventType::Qualified),
            _ => None,
        }
    }
}

// --- LEAD ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    #[schema(example = "Maria Silva")]
    pub name: String,
    #[schema(example = "11999990001")]
    pub phone: String,
    #[schema(example = "Botox")]
    pub procedure: String,
    #[schema(example = "Instagram")]
    pub source: String,
    pub status: LeadStatus,
    pub notes: Option<String>,
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Linha da listagem: o lead + o agendamento mais recente (se houver)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadListItem {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub lead: Lead,
    pub last_appointment_id: Option<Uuid>,
    pub last_appointment_at: Option<DateTime<Utc>>,
    pub last_appointment_status: Option<AppointmentStatus>,
}

/// Dados de entrada de um novo lead (dashboard ou webhook).
#[derive(Debug, Clone, Default)]
pub struct NewLead {
    pub name: String,
    pub phone: String,
    pub procedure: Option<String>,
    pub source: Option<String>,
    pub notes: Option<String>,
}

impl NewLead {
    /// Nome e telefone são obrigatórios (após trim).
    pub fn validate_required(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() || self.phone.trim().is_empty() {
            return Err(AppError::BadRequest("lead.name_phone_required"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct LeadFilters {
    pub status: Option<LeadStatus>,
    pub search: Option<String>,
}

// --- PAYLOADS HTTP ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadPayload {
    #[serde(default)]
    #[schema(example = "Maria Silva")]
    pub name: String,
    #[serde(default)]
    #[schema(example = "11999990001")]
    pub phone: String,
    #[schema(example = "Botox")]
    pub procedure: Option<String>,
    #[schema(example = "Instagram")]
    pub source: Option<String>,
    #[validate(length(max = 2000, message = "max_length_2000"))]
    pub notes: Option<String>,
}

impl From<CreateLeadPayload> for NewLead {
    fn from(p: CreateLeadPayload) -> Self {
        Self {
            name: p.name,
            phone: p.phone,
            procedure: p.procedure,
            source: p.source,
            notes: p.notes,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeadStatusPayload {
    pub status: LeadStatus,
    #[validate(length(max = 2000, message = "max_length_2000"))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadListQuery {
    pub page: Option<i64>,
    #[serde(alias = "pageSize")]
    pub limit: Option<i64>,
    pub status: Option<LeadStatus>,
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [LeadStatus; 4] = [
        LeadStatus::Novo,
        LeadStatus::Qualificado,
        LeadStatus::Agendado,
        LeadStatus::Perdido,
    ];

    #[test]
    fn free_transitions_except_into_agendado() {
        for from in ALL {
            for to in ALL {
                let result = from.check_manual_transition(to);
                if to == LeadStatus::Agendado && from != LeadStatus::Agendado {
                    assert!(result.is_err(), "{:?} -> {:?} deveria falhar", from, to);
                } else {
                    assert!(result.is_ok(), "{:?} -> {:?} deveria passar", from, to);
                }
            }
        }
    }

    #[test]
    fn perdido_can_be_left() {
        assert!(LeadStatus::Perdido.check_manual_transition(LeadStatus::Qualificado).is_ok());
        assert!(LeadStatus::Novo.check_manual_transition(LeadStatus::Perdido).is_ok());
    }

    #[test]
    fn only_qualificado_feeds_the_ledger() {
        assert_eq!(LeadStatus::Qualificado.metric_on_enter(), Some(MetricEventType::Qualified));
        assert_eq!(LeadStatus::Novo.metric_on_enter(), None);
        assert_eq!(LeadStatus::Perdido.metric_on_enter(), None);
        // agendado é contabilizado como `scheduled` pelo fluxo de agendamentos
        assert_eq!(LeadStatus::Agendado.metric_on_enter(), None);
    }

    #[test]
    fn name_and_phone_are_required() {
        let mut lead = NewLead {
            name: "Maria Silva".into(),
            phone: "11999990001".into(),
            ..Default::default()
        };
        assert!(lead.validate_required().is_ok());
        lead.phone = "   ".into();
        assert!(lead.validate_required().is_err());
        lead.phone = "11999990001".into();
        lead.name = String::new();
        assert!(lead.validate_required().is_err());
    }

    #[test]
    fn status_wire_format_is_portuguese() {
        assert_eq!(serde_json::to_string(&LeadStatus::Qualificado).unwrap(), "\"qualificado\"");
        assert!(serde_json::from_str::<LeadStatus>("\"convertido\"").is_err());
    }
}
