// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::common;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,
        handlers::auth::create_user,

        // --- Organizations ---
        handlers::organizations::create_organization,
        handlers::organizations::list_organizations_overview,
        handlers::organizations::list_my_organizations,
        handlers::organizations::get_notification_config,

        // --- Leads ---
        handlers::leads::list_leads,
        handlers::leads::create_lead,
        handlers::leads::update_lead_status,

        // --- Agendamentos ---
        handlers::appointments::list_appointments,
        handlers::appointments::create_appointment,
        handlers::appointments::update_appointment_status,
        handlers::appointments::delete_appointment,

        // --- Métricas ---
        handlers::metrics::get_metrics,

        // --- Webhooks ---
        handlers::webhooks::receive_n8n_event,
        handlers::webhooks::webhook_info,

        // --- Health ---
        handlers::health::health_check,
    ),
    components(
        schemas(
            common::pagination::PaginationMeta,

            // --- Auth ---
            models::auth::Role,
            models::auth::User,
            models::auth::LoginUserPayload,
            models::auth::CreateUserPayload,
            models::auth::AuthResponse,

            // --- Organizations ---
            models::organization::Organization,
            models::organization::OrganizationOverview,
            models::organization::OrganizationBrief,
            models::organization::AccessibleOrganization,
            models::organization::NotificationConfig,
            models::organization::CreateOrganizationPayload,
            handlers::organizations::OrganizationResponse,
            handlers::organizations::OrganizationOverviewList,
            handlers::organizations::AccessibleOrganizationList,

            // --- Leads ---
            models::lead::LeadStatus,
            models::lead::Lead,
            models::lead::LeadListItem,
            models::lead::CreateLeadPayload,
            models::lead::UpdateLeadStatusPayload,
            handlers::leads::LeadListResponse,
            handlers::leads::LeadResponse,

            // --- Agendamentos ---
            models::appointment::AppointmentStatus,
            models::appointment::Appointment,
            models::appointment::LeadBrief,
            models::appointment::AppointmentWithLead,
            models::appointment::CreateAppointmentPayload,
            models::appointment::UpdateAppointmentStatusPayload,
            handlers::appointments::AppointmentListResponse,
            handlers::appointments::AppointmentResponse,

            // --- Métricas ---
            models::metrics::MetricEventType,
            models::metrics::MetricEvent,
            models::metrics::MetricsSummary,
            models::metrics::TimeSeriesPoint,
            models::metrics::DashboardCards,
            models::metrics::MetricsPeriod,
            models::metrics::MetricsRange,
            models::metrics::MetricsOverview,
            handlers::metrics::MetricsResponse,

            // --- Webhooks ---
            models::webhook::WebhookRequest,
            models::webhook::WebhookResponse,
            models::webhook::WebhookInfo,

            handlers::health::HealthStatus,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação"),
        (name = "Users", description = "Usuário atual e cadastro de equipe"),
        (name = "Organizations", description = "Clínicas (tenants) e configuração de notificação"),
        (name = "Leads", description = "Funil de leads"),
        (name = "Agendamentos", description = "Agenda da clínica"),
        (name = "Metricas", description = "Ledger de eventos e indicadores"),
        (name = "Webhooks", description = "Entrada de eventos do n8n"),
        (name = "Health", description = "Verificação de vida")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/login",
            "/api/users/me",
            "/api/leads",
            "/api/leads/{id}",
            "/api/agendamentos",
            "/api/agendamentos/{id}",
            "/api/metricas",
            "/api/webhooks/n8n",
            "/api/admin/organizations",
            "/api/organizations/{id}/notification",
        ] {
            assert!(doc.paths.paths.contains_key(path), "rota sem documentação: {}", path);
        }
    }
}
