// src/models/webhook.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use utoipa::ToSchema;

use crate::{
    common::error::AppError,
    models::{lead::NewLead, metrics::MetricEventType},
};

pub const ACCEPTED_EVENTS: [&str; 4] = ["new_lead", "lead_qualified", "appointment_created", "metric_event"];

pub const DEFAULT_WEBHOOK_SOURCE: &str = "n8n";

/// Envelope cru, como chega do n8n. Nada aqui é confiável ainda.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
    #[schema(example = "new_lead")]
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub organization_id: Option<String>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub data: Value,
}

/// Evento já validado: tag fechada + payload tipado.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
    NewLead(NewLeadData),
    LeadQualified { lead_id: Uuid },
    AppointmentCreated { lead_id: Uuid, scheduled_at: String, notes: Option<String> },
    MetricEvent { event_type: MetricEventType, metadata: Value },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewLeadData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    pub procedure: Option<String>,
    pub source: Option<String>,
    pub notes: Option<String>,
}

impl From<NewLeadData> for NewLead {
    fn from(d: NewLeadData) -> Self {
        Self {
            name: d.name,
            phone: d.phone,
            procedure: d.procedure,
            source: Some(d.source.unwrap_or_else(|| DEFAULT_WEBHOOK_SOURCE.to_string())),
            notes: d.notes,
        }
    }
}

impl WebhookEvent {
    pub fn tag(&self) -> &'static str {
        match self {
            WebhookEvent::NewLead(_) => "new_lead",
            WebhookEvent::LeadQualified { .. } => "lead_qualified",
            WebhookEvent::AppointmentCreated { .. } => "appointment_created",
            WebhookEvent::MetricEvent { .. } => "metric_event",
        }
    }

    /// Valida a tag e o payload. Tags desconhecidas nunca chegam ao banco.
    pub fn parse(tag: Option<&str>, data: &Value) -> Result<Self, AppError> {
        let tag = tag
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AppError::BadRequest("webhook.type_required"))?;

        let empty = Map::new();
        let fields = match data {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => return Err(AppError::BadRequest("webhook.invalid_payload")),
        };

        match tag {
            "new_lead" => {
                let lead: NewLeadData = serde_json::from_value(Value::Object(fields.clone()))
                    .map_err(|_| AppError::BadRequest("webhook.invalid_payload"))?;
                Ok(WebhookEvent::NewLead(lead))
            }
            "lead_qualified" => {
                let lead_id = uuid_field(fields, "leadId").ok_or(AppError::BadRequest("webhook.lead_id_required"))?;
                Ok(WebhookEvent::LeadQualified { lead_id })
            }
            "appointment_created" => {
                let lead_id = uuid_field(fields, "leadId");
                let scheduled_at = str_field(fields, "scheduledAt");
                match (lead_id, scheduled_at) {
                    (Some(lead_id), Some(scheduled_at)) => Ok(WebhookEvent::AppointmentCreated {
                        lead_id,
                        scheduled_at,
                        notes: str_field(fields, "notes"),
                    }),
                    _ => Err(AppError::BadRequest("webhook.appointment_fields_required")),
                }
            }
            "metric_event" => {
                let raw = str_field(fields, "eventType").ok_or(AppError::BadRequest("webhook.event_type_required"))?;
                let event_type = raw.parse::<MetricEventType>()?;
                let metadata = match fields.get("metadata") {
                    Some(Value::Object(m)) => Value::Object(m.clone()),
                    _ => Value::Object(Map::new()),
                };
                Ok(WebhookEvent::MetricEvent { event_type, metadata })
            }
            other => Err(AppError::UnknownEventType(other.to_string())),
        }
    }
}

fn str_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// UUID malformado conta como ausente: o lead nunca existiria.
fn uuid_field(fields: &Map<String, Value>, key: &str) -> Option<Uuid> {
    str_field(fields, key).and_then(|s| Uuid::parse_str(&s).ok())
}

// --- RESPOSTAS ---

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_event_id: Option<Uuid>,
}

impl WebhookResponse {
    pub fn ok() -> Self {
        Self { success: true, lead_id: None, appointment_id: None, metric_event_id: None }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookInfo {
    pub status: String,
    pub message: String,
    pub accepted_events: Vec<String>,
}

impl WebhookInfo {
    pub fn current() -> Self {
        Self {
            status: "ok".to_string(),
            message: "Webhook n8n ativo".to_string(),
            accepted_events: ACCEPTED_EVENTS.iter().map(|e| e.to_string()).collect(),
        }
    }
}
