// src/handlers/leads.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        extract::{AppJson, AppPath, AppQuery},
        pagination::{Pagination, PaginationMeta},
    },
    config::AppState,
    middleware::i18n::Locale,
    models::lead::{CreateLeadPayload, Lead, LeadFilters, LeadListItem, LeadListQuery, UpdateLeadStatusPayload},
    services::authorization::TenantScope,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct LeadListResponse {
    pub leads: Vec<LeadListItem>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeadResponse {
    pub success: bool,
    pub lead: Lead,
}

// GET /api/leads
#[utoipa::path(
    get,
    path = "/api/leads",
    tag = "Leads",
    params(
        ("page" = Option<i64>, Query, description = "Página (1-indexada)"),
        ("limit" = Option<i64>, Query, description = "Itens por página (padrão 10)"),
        ("status" = Option<String>, Query, description = "novo | qualificado | agendado | perdido"),
        ("search" = Option<String>, Query, description = "Busca por nome ou telefone"),
        ("x-organization-id" = Option<Uuid>, Header, description = "Organização (apenas super admin)")
    ),
    responses(
        (status = 200, description = "Leads do usuário", body = LeadListResponse),
        (status = 401, description = "Não autenticado"),
        (status = 403, description = "Organização negada")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_leads(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: TenantScope,
    AppQuery(query): AppQuery<LeadListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let pagination = Pagination::new(query.page, query.limit);
    let filters = LeadFilters { status: query.status, search: query.search };

    let page = app_state
        .lead_service
        .list_leads(&scope, &filters, pagination)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(LeadListResponse { leads: page.items, pagination: page.meta })))
}

// POST /api/leads
#[utoipa::path(
    post,
    path = "/api/leads",
    tag = "Leads",
    request_body = CreateLeadPayload,
    responses(
        (status = 201, description = "Lead criado (evento lead_received registrado)", body = LeadResponse),
        (status = 400, description = "Nome e telefone são obrigatórios")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: TenantScope,
    AppJson(payload): AppJson<CreateLeadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let lead = app_state
        .lead_service
        .create_lead(&scope, payload.into())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(LeadResponse { success: true, lead })))
}

// PATCH /api/leads/{id}
#[utoipa::path(
    patch,
    path = "/api/leads/{id}",
    tag = "Leads",
    request_body = UpdateLeadStatusPayload,
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Status atualizado", body = LeadResponse),
        (status = 400, description = "Transição inválida"),
        (status = 404, description = "Lead não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_lead_status(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: TenantScope,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateLeadStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let lead = app_state
        .lead_service
        .transition_status(&scope, id, payload.status, payload.notes.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(LeadResponse { success: true, lead })))
}
