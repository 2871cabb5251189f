// src/handlers/webhooks.rs

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::webhook::{WebhookInfo, WebhookRequest, WebhookResponse},
};

pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

// POST /api/webhooks/n8n
#[utoipa::path(
    post,
    path = "/api/webhooks/n8n",
    tag = "Webhooks",
    request_body = WebhookRequest,
    params(
        ("x-webhook-secret" = Option<String>, Header, description = "Obrigatório quando a organização tem segredo")
    ),
    responses(
        (status = 200, description = "Evento processado", body = WebhookResponse),
        (status = 400, description = "Payload inválido ou tipo desconhecido"),
        (status = 401, description = "Segredo inválido"),
        (status = 404, description = "Organização ou lead não encontrado")
    )
)]
pub async fn receive_n8n_event(
    State(app_state): State<AppState>,
    locale: Locale,
    headers: HeaderMap,
    payload: Result<Json<WebhookRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!("⚠️ Webhook com corpo inválido: {}", rejection.body_text());
        AppError::BadRequest("request.invalid_body").to_api_error(&locale, &app_state.i18n_store)
    })?;

    let secret = headers
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|value| value.to_str().ok());

    let response = app_state
        .webhook_service
        .ingest(request, secret)
        .await
        .map_err(|e| {
            tracing::warn!(code = e.code(), "⚠️ Webhook rejeitado: {}", e);
            e.to_api_error(&locale, &app_state.i18n_store)
        })?;

    Ok((StatusCode::OK, Json(response)))
}

// GET /api/webhooks/n8n
#[utoipa::path(
    get,
    path = "/api/webhooks/n8n",
    tag = "Webhooks",
    responses((status = 200, description = "Webhook ativo e eventos aceitos", body = WebhookInfo))
)]
pub async fn webhook_info() -> Json<WebhookInfo> {
    Json(WebhookInfo::current())
}
