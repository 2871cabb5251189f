// src/models/organization.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::auth::Role;

// ---
// Organization (o tenant, a clínica)
// ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: Uuid,
    #[schema(example = "Clínica Beleza & Estética")]
    pub name: String,
    #[schema(example = "clinica-beleza")]
    pub slug: String,
    #[schema(example = "https://n8n.exemplo.com/webhook/clinica")]
    pub webhook_url: Option<String>,
    #[schema(example = "https://wa.me/5511999999999")]
    pub whatsapp_link: Option<String>,

    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub webhook_secret_hash: Option<String>,

    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Visão do super admin: organização + contadores
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationOverview {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub organization: Organization,
    pub lead_count: i64,
    pub appointment_count: i64,
    pub user_count: i64,
}

// O que o seletor de clínica precisa
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationBrief {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessibleOrganization {
    #[serde(flatten)]
    pub organization: OrganizationBrief,
    pub role: Role,
}

// Configuração lida pelo despachante externo de notificações
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationConfig {
    pub organization_id: Uuid,
    pub webhook_url: Option<String>,
    pub whatsapp_link: Option<String>,
    pub has_webhook_secret: bool,
}

impl From<&Organization> for NotificationConfig {
    fn from(org: &Organization) -> Self {
        Self {
            organization_id: org.id,
            webhook_url: org.webhook_url.clone(),
            whatsapp_link: org.whatsapp_link.clone(),
            has_webhook_secret: org.webhook_secret_hash.is_some(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrganizationPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Clínica Exemplo")]
    pub name: String,

    #[validate(length(min = 1, max = 64, message = "invalid_length"))]
    #[schema(example = "clinica-exemplo")]
    pub slug: String,

    #[validate(url(message = "invalid_url"))]
    pub webhook_url: Option<String>,

    #[validate(url(message = "invalid_url"))]
    pub whatsapp_link: Option<String>,

    #[validate(length(min = 16, message = "min_length_16"))]
    pub webhook_secret: Option<String>,

    pub metadata: Option<Value>,
}

/// Normaliza o slug (trim + minúsculas) e valida o formato URL-safe:
/// grupos de [a-z0-9] separados por um único hífen.
pub fn normalize_slug(raw: &str) -> Option<String> {
    let slug = raw.trim().to_lowercase();
    if slug.is_empty() {
        return None;
    }
    let valid = slug
        .split('-')
        .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    valid.then_some(slug)
}
