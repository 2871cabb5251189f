// src/handlers/organizations.rs

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
        extract::{AppJson, AppPath},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{AtLeastAdmin, RequireRole, SuperAdminOnly},
    },
    models::organization::{
        AccessibleOrganization, CreateOrganizationPayload, NotificationConfig, Organization, OrganizationOverview,
    },
};

#[derive(Debug, Serialize, ToSchema)]
pub struct OrganizationResponse {
    pub success: bool,
    pub organization: Organization,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrganizationOverviewList {
    pub organizations: Vec<OrganizationOverview>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccessibleOrganizationList {
    pub organizations: Vec<AccessibleOrganization>,
}

// POST /api/admin/organizations
#[utoipa::path(
    post,
    path = "/api/admin/organizations",
    tag = "Organizations",
    request_body = CreateOrganizationPayload,
    responses(
        (status = 201, description = "Organização criada", body = OrganizationResponse),
        (status = 403, description = "Apenas super admin"),
        (status = 409, description = "Slug já utilizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_organization(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireRole<SuperAdminOnly>,
    AppJson(payload): AppJson<CreateOrganizationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let organization = app_state
        .organization_service
        .create_organization(&actor, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(OrganizationResponse { success: true, organization })))
}

// GET /api/admin/organizations
#[utoipa::path(
    get,
    path = "/api/admin/organizations",
    tag = "Organizations",
    responses(
        (status = 200, description = "Todas as organizações com contadores", body = OrganizationOverviewList),
        (status = 403, description = "Apenas super admin")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_organizations_overview(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireRole<SuperAdminOnly>,
) -> Result<impl IntoResponse, ApiError> {
    let organizations = app_state
        .organization_service
        .list_with_counts(&actor)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(OrganizationOverviewList { organizations })))
}

// GET /api/organizations
#[utoipa::path(
    get,
    path = "/api/organizations",
    tag = "Organizations",
    responses(
        (status = 200, description = "Organizações visíveis ao usuário", body = AccessibleOrganizationList)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_my_organizations(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let organizations = app_state
        .organization_service
        .list_accessible(&user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(AccessibleOrganizationList { organizations })))
}

// GET /api/organizations/{id}/notification
#[utoipa::path(
    get,
    path = "/api/organizations/{id}/notification",
    tag = "Organizations",
    params(("id" = Uuid, Path, description = "ID da organização")),
    responses(
        (status = 200, description = "Destino das notificações", body = NotificationConfig),
        (status = 403, description = "Organização negada"),
        (status = 404, description = "Organização não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_notification_config(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireRole<AtLeastAdmin>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let config = app_state
        .organization_service
        .notification_config(&actor, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(config)))
}
