// src/services/appointment_service.rs

use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{Page, Pagination},
    },
    db::{AppointmentRepository, LeadRepository, MetricsRepository},
    models::{
        appointment::{parse_scheduled_at, Appointment, AppointmentFilters, AppointmentStatus, AppointmentWithLead},
        auth::Role,
        lead::LeadStatus,
        metrics::MetricEventType,
    },
    services::authorization::TenantScope,
};

#[derive(Clone)]
pub struct AppointmentService {
    appointment_repo: AppointmentRepository,
    lead_repo: LeadRepository,
    metrics_repo: MetricsRepository,
    pool: PgPool,
}

impl AppointmentService {
    pub fn new(
        appointment_repo: AppointmentRepository,
        lead_repo: LeadRepository,
        metrics_repo: MetricsRepository,
        pool: PgPool,
    ) -> Self {
        Self { appointment_repo, lead_repo, metrics_repo, pool }
    }

    /// Agenda um lead. Tudo numa transação só:
    /// lead -> `agendado`, INSERT do agendamento e evento `scheduled`.
    pub async fn create_appointment(
        &self,
        scope: &TenantScope,
        lead_id: Uuid,
        scheduled_at: &str,
        notes: Option<&str>,
    ) -> Result<Appointment, AppError> {
        scope.authorize(Role::Operador)?;
        let organization_id = scope.require_organization()?;

        let mut tx = self.pool.begin().await?;

        let lead = self
            .lead_repo
            .find_for_update(&mut *tx, lead_id, organization_id, scope.user_id)
            .await?
            .ok_or(AppError::NotFound("lead.not_found"))?;

        let scheduled_at =
            parse_scheduled_at(scheduled_at).ok_or(AppError::BadRequest("appointment.invalid_scheduled_at"))?;

        // Sobrescreve qualquer status anterior (novo, qualificado, perdido...)
        self.lead_repo
            .update_status(&mut *tx, lead.id, lead.organization_id, scope.user_id, LeadStatus::Agendado, None)
            .await?;

        let appointment = self
            .appointment_repo
            .create(&mut *tx, lead.id, lead.organization_id, scope.user_id, scheduled_at, notes)
            .await?;

        self.metrics_repo
            .record(
                &mut *tx,
                MetricEventType::Scheduled,
                lead.organization_id,
                scope.user_id,
                json!({ "leadId": lead.id, "appointmentId": appointment.id }),
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            organization_id = %organization_id,
            lead_id = %lead.id,
            appointment_id = %appointment.id,
            event_type = "scheduled",
            "📅 Agendamento criado para {}",
            appointment.scheduled_at
        );
        Ok(appointment)
    }

    pub async fn transition_status(
        &self,
        scope: &TenantScope,
        appointment_id: Uuid,
        status: AppointmentStatus,
        notes: Option<&str>,
    ) -> Result<Appointment, AppError> {
        scope.authorize(Role::Operador)?;
        let organization_id = scope.require_organization()?;

        let mut tx = self.pool.begin().await?;

        let current = self
            .appointment_repo
            .find_for_update(&mut *tx, appointment_id, organization_id, scope.user_id)
            .await?
            .ok_or(AppError::NotFound("appointment.not_found"))?;

        current.status.check_transition(status)?;

        let updated = self
            .appointment_repo
            .update_status(&mut *tx, appointment_id, organization_id, scope.user_id, status, notes)
            .await?;

        let event = status.metric_on_enter();
        if let Some(event_type) = event {
            self.metrics_repo
                .record(
                    &mut *tx,
                    event_type,
                    organization_id,
                    scope.user_id,
                    json!({ "appointmentId": appointment_id }),
                )
                .await?;
        }

        tx.commit().await?;

        tracing::info!(
            organization_id = %organization_id,
            appointment_id = %appointment_id,
            event_type = event.map(MetricEventType::as_str),
            "🔄 Agendamento {:?} -> {:?}",
            current.status,
            updated.status
        );
        Ok(updated)
    }

    /// Exclusão física. Mantém o comportamento legado de registrar um
    /// `no_show` de auditoria junto com a exclusão.
    pub async fn delete_appointment(&self, scope: &TenantScope, appointment_id: Uuid) -> Result<Appointment, AppError> {
        scope.authorize(Role::Operador)?;
        let organization_id = scope.require_organization()?;

        let mut tx = self.pool.begin().await?;

        let deleted = self
            .appointment_repo
            .delete(&mut *tx, appointment_id, organization_id, scope.user_id)
            .await?
            .ok_or(AppError::NotFound("appointment.not_found"))?;

        self.metrics_repo
            .record(
                &mut *tx,
                MetricEventType::NoShow,
                organization_id,
                scope.user_id,
                json!({ "appointmentId": deleted.id, "action": "delete" }),
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            organization_id = %organization_id,
            appointment_id = %deleted.id,
            lead_id = %deleted.lead_id,
            event_type = "no_show",
            "🗑️ Agendamento excluído"
        );
        Ok(deleted)
    }

    pub async fn list_appointments(
        &self,
        scope: &TenantScope,
        filters: AppointmentFilters,
        pagination: Pagination,
    ) -> Result<Page<AppointmentWithLead>, AppError> {
        scope.authorize(Role::Operador)?;
        let Some(organization_id) = scope.organization_id else {
            return Ok(Page::empty(pagination));
        };

        let (items, total) = self.appointment_repo.list(organization_id, filters, pagination).await?;
        Ok(Page { items, meta: pagination.meta(total) })
    }
}
