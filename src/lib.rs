// src/lib.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

pub use crate::config::{AppState, Config};
use crate::middleware::{auth::auth_guard, tenancy::tenant_guard};

/// Monta o router completo sobre um estado já construído.
pub fn create_app(app_state: AppState) -> Router {
    // Rotas de autenticação (públicas)
    let auth_routes = Router::new().route("/login", post(handlers::auth::login));

    // Rotas de usuário (só exigem token)
    let user_routes = Router::new()
        .route("/", post(handlers::auth::create_user))
        .route("/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let organization_routes = Router::new()
        .route("/organizations", get(handlers::organizations::list_my_organizations))
        .route(
            "/organizations/{id}/notification",
            get(handlers::organizations::get_notification_config),
        )
        .route(
            "/admin/organizations",
            post(handlers::organizations::create_organization)
                .get(handlers::organizations::list_organizations_overview),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    // Tudo que é escopado por organização passa pelo tenant_guard
    let tenant_routes = Router::new()
        .route(
            "/leads",
            get(handlers::leads::list_leads).post(handlers::leads::create_lead),
        )
        .route("/leads/{id}", patch(handlers::leads::update_lead_status))
        .route(
            "/agendamentos",
            get(handlers::appointments::list_appointments).post(handlers::appointments::create_appointment),
        )
        .route(
            "/agendamentos/{id}",
            patch(handlers::appointments::update_appointment_status)
                .delete(handlers::appointments::delete_appointment),
        )
        .route("/metricas", get(handlers::metrics::get_metrics))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), tenant_guard));

    // O n8n autentica pelo segredo da organização, não por JWT
    let webhook_routes = Router::new().route(
        "/n8n",
        post(handlers::webhooks::receive_n8n_event).get(handlers::webhooks::webhook_info),
    );

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .route("/api/health", get(handlers::health::health_check))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/webhooks", webhook_routes)
        .nest("/api", organization_routes.merge(tenant_routes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .with_state(app_state)
}
