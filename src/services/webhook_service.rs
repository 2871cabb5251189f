// src/services/webhook_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::{
        auth::Role,
        lead::LeadStatus,
        webhook::{WebhookEvent, WebhookRequest, WebhookResponse},
    },
    services::{
        appointment_service::AppointmentService, authorization::TenantScope, lead_service::LeadService,
        metrics_service::MetricsService, organization_service::OrganizationService,
    },
};

#[derive(Clone)]
pub struct WebhookService {
    organization_service: OrganizationService,
    lead_service: LeadService,
    appointment_service: AppointmentService,
    metrics_service: MetricsService,
    user_repo: UserRepository,
    pool: PgPool,
}

impl WebhookService {
    pub fn new(
        organization_service: OrganizationService,
        lead_service: LeadService,
        appointment_service: AppointmentService,
        metrics_service: MetricsService,
        user_repo: UserRepository,
        pool: PgPool,
    ) -> Self {
        Self {
            organization_service,
            lead_service,
            appointment_service,
            metrics_service,
            user_repo,
            pool,
        }
    }

    /// Entrada única do n8n. Ordem: evento -> organização -> segredo -> usuário
    /// responsável -> gate -> operação de ciclo de vida.
    pub async fn ingest(&self, request: WebhookRequest, secret: Option<&str>) -> Result<WebhookResponse, AppError> {
        let event = WebhookEvent::parse(request.event_type.as_deref(), &request.data)?;

        let raw_org = request
            .organization_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(AppError::BadRequest("webhook.type_required"))?;

        // Id malformado é tratado como organização inexistente
        let org_id = Uuid::parse_str(raw_org).map_err(|_| AppError::NotFound("organization.not_found"))?;
        let org = self
            .organization_service
            .find(org_id)
            .await?
            .ok_or(AppError::NotFound("organization.not_found"))?;

        self.organization_service.verify_webhook_secret(&org, secret).await?;

        let acting_user = self
            .user_repo
            .find_acting_user(&self.pool, org.id)
            .await?
            .ok_or(AppError::NotFound("organization.no_acting_user"))?;

        let scope = TenantScope {
            user_id: acting_user.id,
            role: acting_user.role,
            organization_id: Some(org.id),
        };
        scope.authorize(Role::Operador)?;

        tracing::info!(
            organization_id = %org.id,
            acting_user = %acting_user.id,
            "🔔 Webhook '{}' recebido",
            event.tag()
        );

        self.dispatch(&scope, event).await
    }

    async fn dispatch(&self, scope: &TenantScope, event: WebhookEvent) -> Result<WebhookResponse, AppError> {
        match event {
            WebhookEvent::NewLead(data) => {
                let lead = self.lead_service.create_lead(scope, data.into()).await?;
                Ok(WebhookResponse { lead_id: Some(lead.id), ..WebhookResponse::ok() })
            }
            WebhookEvent::LeadQualified { lead_id } => {
                // O lead é revalidado contra (organização, responsável) dentro do serviço
                let lead = self
                    .lead_service
                    .transition_status(scope, lead_id, LeadStatus::Qualificado, None)
                    .await?;
                Ok(WebhookResponse { lead_id: Some(lead.id), ..WebhookResponse::ok() })
            }
            WebhookEvent::AppointmentCreated { lead_id, scheduled_at, notes } => {
                let appointment = self
                    .appointment_service
                    .create_appointment(scope, lead_id, &scheduled_at, notes.as_deref())
                    .await?;
                Ok(WebhookResponse {
                    lead_id: Some(appointment.lead_id),
                    appointment_id: Some(appointment.id),
                    ..WebhookResponse::ok()
                })
            }
            WebhookEvent::MetricEvent { event_type, metadata } => {
                let event = self.metrics_service.record_external(scope, event_type, metadata).await?;
                Ok(WebhookResponse { metric_event_id: Some(event.id), ..WebhookResponse::ok() })
            }
        }
    }
}
