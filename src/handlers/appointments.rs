// src/handlers/appointments.rs

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
    models::{
        appointment::{
            Appointment, AppointmentFilters, AppointmentListQuery, AppointmentWithLead, CreateAppointmentPayload,
            UpdateAppointmentStatusPayload,
        },
        metrics::parse_range_bound,
    },
    services::authorization::TenantScope,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct AppointmentListResponse {
    pub appointments: Vec<AppointmentWithLead>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AppointmentResponse {
    pub success: bool,
    pub appointment: Appointment,
}

fn parse_filters(query: &AppointmentListQuery) -> Result<AppointmentFilters, AppError> {
    let bound = |raw: Option<&str>, end_of_day: bool| {
        raw.filter(|s| !s.trim().is_empty())
            .map(|s| parse_range_bound(s, end_of_day).ok_or(AppError::BadRequest("request.invalid_query")))
            .transpose()
    };
    Ok(AppointmentFilters {
        status: query.status,
        from: bound(query.start_date.as_deref(), false)?,
        to: bound(query.end_date.as_deref(), true)?,
    })
}

// GET /api/agendamentos
#[utoipa::path(
    get,
    path = "/api/agendamentos",
    tag = "Agendamentos",
    params(
        ("page" = Option<i64>, Query, description = "Página (1-indexada)"),
        ("limit" = Option<i64>, Query, description = "Itens por página (padrão 10)"),
        ("status" = Option<String>, Query, description = "agendado | confirmado | realizado | cancelado | no_show"),
        ("startDate" = Option<String>, Query, description = "Início (ISO-8601)"),
        ("endDate" = Option<String>, Query, description = "Fim (ISO-8601)"),
        ("x-organization-id" = Option<Uuid>, Header, description = "Organização (apenas super admin)")
    ),
    responses(
        (status = 200, description = "Agenda da organização", body = AppointmentListResponse)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_appointments(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: TenantScope,
    AppQuery(query): AppQuery<AppointmentListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let filters = parse_filters(&query).map_err(to_api)?;
    let pagination = Pagination::new(query.page, query.limit);

    let page = app_state
        .appointment_service
        .list_appointments(&scope, filters, pagination)
        .await
        .map_err(to_api)?;

    Ok((
        StatusCode::OK,
        Json(AppointmentListResponse { appointments: page.items, pagination: page.meta }),
    ))
}

// POST /api/agendamentos
#[utoipa::path(
    post,
    path = "/api/agendamentos",
    tag = "Agendamentos",
    request_body = CreateAppointmentPayload,
    responses(
        (status = 201, description = "Agendamento criado; lead passa a 'agendado'", body = AppointmentResponse),
        (status = 400, description = "Data inválida"),
        (status = 404, description = "Lead não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_appointment(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: TenantScope,
    AppJson(payload): AppJson<CreateAppointmentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let appointment = app_state
        .appointment_service
        .create_appointment(&scope, payload.lead_id, &payload.scheduled_at, payload.notes.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(AppointmentResponse { success: true, appointment })))
}

// PATCH /api/agendamentos/{id}
#[utoipa::path(
    patch,
    path = "/api/agendamentos/{id}",
    tag = "Agendamentos",
    request_body = UpdateAppointmentStatusPayload,
    params(("id" = Uuid, Path, description = "ID do agendamento")),
    responses(
        (status = 200, description = "Status atualizado", body = AppointmentResponse),
        (status = 400, description = "Agendamento finalizado"),
        (status = 404, description = "Agendamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_appointment_status(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: TenantScope,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateAppointmentStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let appointment = app_state
        .appointment_service
        .transition_status(&scope, id, payload.status, payload.notes.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(AppointmentResponse { success: true, appointment })))
}

// DELETE /api/agendamentos/{id}
#[utoipa::path(
    delete,
    path = "/api/agendamentos/{id}",
    tag = "Agendamentos",
    params(("id" = Uuid, Path, description = "ID do agendamento")),
    responses(
        (status = 200, description = "Agendamento excluído", body = AppointmentResponse),
        (status = 404, description = "Agendamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_appointment(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: TenantScope,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let appointment = app_state
        .appointment_service
        .delete_appointment(&scope, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(AppointmentResponse { success: true, appointment })))
}
