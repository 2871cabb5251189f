// src/services/lead_service.rs

use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{Page, Pagination},
    },
    db::{LeadRepository, MetricsRepository},
    models::{
        auth::Role,
        lead::{Lead, LeadFilters, LeadListItem, LeadStatus, NewLead},
        metrics::MetricEventType,
    },
    services::authorization::TenantScope,
};

#[derive(Clone)]
pub struct LeadService {
    lead_repo: LeadRepository,
    metrics_repo: MetricsRepository,
    pool: PgPool,
}

impl LeadService {
    pub fn new(lead_repo: LeadRepository, metrics_repo: MetricsRepository, pool: PgPool) -> Self {
        Self { lead_repo, metrics_repo, pool }
    }

    /// Cria o lead e, na MESMA transação, o evento `lead_received`.
    pub async fn create_lead(&self, scope: &TenantScope, lead: NewLead) -> Result<Lead, AppError> {
        scope.authorize(Role::Operador)?;
        let organization_id = scope.require_organization()?;
        lead.validate_required()?;

        let mut tx = self.pool.begin().await?;

        let created = self
            .lead_repo
            .create(&mut *tx, organization_id, scope.user_id, &lead)
            .await?;

        self.metrics_repo
            .record(
                &mut *tx,
                MetricEventType::LeadReceived,
                organization_id,
                scope.user_id,
                json!({ "leadId": created.id, "source": created.source }),
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            organization_id = %organization_id,
            lead_id = %created.id,
            event_type = "lead_received",
            "📥 Lead '{}' recebido via {}",
            created.name,
            created.source
        );
        Ok(created)
    }

    /// Transição manual de status com o lead travado (FOR UPDATE). Toda chamada
    /// com destino `qualificado` grava um `qualified`, mesmo repetida.
    pub async fn transition_status(
        &self,
        scope: &TenantScope,
        lead_id: Uuid,
        status: LeadStatus,
        notes: Option<&str>,
    ) -> Result<Lead, AppError> {
        scope.authorize(Role::Operador)?;
        let organization_id = scope.require_organization()?;

        let mut tx = self.pool.begin().await?;

        let current = self
            .lead_repo
            .find_for_update(&mut *tx, lead_id, organization_id, scope.user_id)
            .await?
            .ok_or(AppError::NotFound("lead.not_found"))?;

        current.status.check_manual_transition(status)?;

        let updated = self
            .lead_repo
            .update_status(&mut *tx, lead_id, organization_id, scope.user_id, status, notes)
            .await?;

        let event = status.metric_on_enter();
        if let Some(event_type) = event {
            self.metrics_repo
                .record(&mut *tx, event_type, organization_id, scope.user_id, json!({ "leadId": lead_id }))
                .await?;
        }

        tx.commit().await?;

        tracing::info!(
            organization_id = %organization_id,
            lead_id = %lead_id,
            event_type = event.map(MetricEventType::as_str),
            "🔄 Lead {:?} -> {:?}",
            current.status,
            updated.status
        );
        Ok(updated)
    }

    /// Listagem paginada do dono. Super admin sem organização recebe página vazia.
    pub async fn list_leads(
        &self,
        scope: &TenantScope,
        filters: &LeadFilters,
        pagination: Pagination,
    ) -> Result<Page<LeadListItem>, AppError> {
        scope.authorize(Role::Operador)?;
        let Some(organization_id) = scope.organization_id else {
            return Ok(Page::empty(pagination));
        };

        let (items, total) = self
            .lead_repo
            .list(organization_id, scope.user_id, filters, pagination)
            .await?;

        Ok(Page { items, meta: pagination.meta(total) })
    }
}
