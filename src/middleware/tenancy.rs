// src/middleware/tenancy.rs

use axum::{
    extract::{FromRef, FromRequestParts, Query, Request, State},
    http::{request::Parts, HeaderMap, Uri},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::{authenticate, AuthenticatedUser},
        i18n::Locale,
    },
    services::authorization::TenantScope,
};

// O nome do nosso cabeçalho HTTP customizado
pub const ORGANIZATION_HEADER: &str = "x-organization-id";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrganizationQuery {
    organization_id: Option<String>,
}

/// Organização pedida pelo cliente: header primeiro, depois `?organizationId=`.
/// Valor presente mas malformado é erro (400), nunca "nenhuma organização".
pub fn requested_organization(headers: &HeaderMap, uri: &Uri) -> Result<Option<Uuid>, AppError> {
    let from_header = headers
        .get(ORGANIZATION_HEADER)
        .map(|value| value.to_str().map(str::to_owned))
        .transpose()
        .map_err(|_| AppError::BadRequest("organization.invalid_id"))?;

    let raw = from_header.or_else(|| {
        Query::<OrganizationQuery>::try_from_uri(uri)
            .ok()
            .and_then(|Query(q)| q.organization_id)
    });

    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => Uuid::parse_str(value)
            .map(Some)
            .map_err(|_| AppError::BadRequest("organization.invalid_id")),
    }
}

/// Autentica e resolve o escopo de tenant da requisição (gate de organização).
pub async fn tenant_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let user = authenticate(&app_state, request.headers()).await.map_err(to_api)?;
    let requested = requested_organization(request.headers(), request.uri()).map_err(to_api)?;
    let scope = TenantScope::resolve(&user, requested).map_err(|e| {
        tracing::warn!(user_id = %user.id, requested = ?requested, "🚫 Acesso a organização negado");
        to_api(e)
    })?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    request.extensions_mut().insert(scope);
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for TenantScope
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<TenantScope>().copied().ok_or_else(|| {
            let app_state = AppState::from_ref(state);
            AppError::Unauthorized.to_api_error(&Locale::from_headers(&parts.headers), &app_state.i18n_store)
        })
    }
}
