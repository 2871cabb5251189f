// src/handlers/health.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{common::db_utils, config::AppState};

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    #[schema(example = "ok")]
    pub status: String,
}

// GET /api/health
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses(
        (status = 200, description = "Banco acessível", body = HealthStatus),
        (status = 503, description = "Banco fora do ar", body = HealthStatus)
    )
)]
pub async fn health_check(State(app_state): State<AppState>) -> impl IntoResponse {
    match db_utils::ping(&app_state.db_pool).await {
        Ok(()) => (StatusCode::OK, Json(HealthStatus { status: "ok".to_string() })),
        Err(e) => {
            tracing::error!("❌ Health check falhou: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, Json(HealthStatus { status: "down".to_string() }))
        }
    }
}
