// src/common/i18n.rs

use std::{collections::HashMap, sync::Arc};

pub const DEFAULT_LANG: &str = "pt";
pub const SUPPORTED_LANGS: [&str; 2] = ["pt", "en"];

const PT: &[(&str, &str)] = &[
    ("validation.failed", "Um ou mais campos são inválidos."),
    ("request.invalid_body", "Corpo da requisição inválido."),
    ("request.invalid_query", "Parâmetros de consulta inválidos."),
    ("request.invalid_path", "Identificador inválido na URL."),
    ("lead.name_phone_required", "Nome e telefone são obrigatórios"),
    ("lead.scheduled_via_appointment", "O status 'agendado' é definido apenas pela criação de um agendamento"),
    ("lead.not_found", "Lead não encontrado"),
    ("appointment.not_found", "Agendamento não encontrado"),
    ("appointment.invalid_scheduled_at", "Data/hora do agendamento inválida"),
    ("appointment.terminal_status", "Agendamento finalizado não pode mudar de status"),
    ("organization.not_found", "Organização não encontrada"),
    ("organization.required", "Selecione uma organização para esta operação"),
    ("organization.invalid_id", "Identificador de organização inválido"),
    ("organization.invalid_slug", "Slug inválido: use apenas letras minúsculas, números e hífens"),
    ("organization.slug_taken", "Este slug já está em uso"),
    ("organization.no_acting_user", "Organização sem usuário responsável"),
    ("user.not_found", "Usuário não encontrado"),
    ("user.organization_required", "Usuários que não são super admin precisam de uma organização"),
    ("auth.unauthorized", "Não autorizado"),
    ("auth.invalid_token", "Token de autenticação inválido ou ausente."),
    ("auth.invalid_credentials", "E-mail ou senha inválidos."),
    ("auth.email_taken", "Este e-mail já está em uso."),
    ("access.denied_role", "Acesso negado: permissão insuficiente"),
    ("access.denied_organization", "Acesso negado: usuário não pertence a esta organização"),
    ("access.no_organization", "Acesso negado: usuário sem organização vinculada"),
    ("webhook.invalid_payload", "Payload do webhook inválido"),
    ("webhook.type_required", "Tipo de evento e organizationId são obrigatórios"),
    ("webhook.unknown_event_type", "Tipo de evento desconhecido"),
    ("webhook.invalid_secret", "Segredo do webhook inválido"),
    ("webhook.lead_id_required", "leadId é obrigatório"),
    ("webhook.appointment_fields_required", "leadId e scheduledAt são obrigatórios"),
    ("webhook.event_type_required", "eventType é obrigatório"),
    ("metrics.invalid_range", "Período inválido: a data inicial deve ser anterior à final"),
    ("storage.unavailable", "Serviço temporariamente indisponível. Tente novamente mais tarde."),
    ("internal", "Ocorreu um erro inesperado."),
];

const EN: &[(&str, &str)] = &[
    ("validation.failed", "One or more fields are invalid."),
    ("request.invalid_body", "Invalid request body."),
    ("request.invalid_query", "Invalid query parameters."),
    ("request.invalid_path", "Invalid identifier in URL."),
    ("lead.name_phone_required", "Name and phone are required"),
    ("lead.scheduled_via_appointment", "Status 'agendado' is only set by creating an appointment"),
    ("lead.not_found", "Lead not found"),
    ("appointment.not_found", "Appointment not found"),
    ("appointment.invalid_scheduled_at", "Invalid appointment date/time"),
    ("appointment.terminal_status", "A finished appointment cannot change status"),
    ("organization.not_found", "Organization not found"),
    ("organization.required", "Select an organization for this operation"),
    ("organization.invalid_id", "Invalid organization identifier"),
    ("organization.invalid_slug", "Invalid slug: use lowercase letters, digits and hyphens only"),
    ("organization.slug_taken", "This slug is already in use"),
    ("organization.no_acting_user", "Organization has no responsible user"),
    ("user.not_found", "User not found"),
    ("user.organization_required", "Non super-admin users need an organization"),
    ("auth.unauthorized", "Unauthorized"),
    ("auth.invalid_token", "Missing or invalid authentication token."),
    ("auth.invalid_credentials", "Invalid email or password."),
    ("auth.email_taken", "This email is already in use."),
    ("access.denied_role", "Access denied: insufficient role"),
    ("access.denied_organization", "Access denied: user does not belong to this organization"),
    ("access.no_organization", "Access denied: user has no organization"),
    ("webhook.invalid_payload", "Invalid webhook payload"),
    ("webhook.type_required", "Event type and organizationId are required"),
    ("webhook.unknown_event_type", "Unknown event type"),
    ("webhook.invalid_secret", "Invalid webhook secret"),
    ("webhook.lead_id_required", "leadId is required"),
    ("webhook.appointment_fields_required", "leadId and scheduledAt are required"),
    ("webhook.event_type_required", "eventType is required"),
    ("metrics.invalid_range", "Invalid range: start date must precede end date"),
    ("storage.unavailable", "Service temporarily unavailable. Please retry later."),
    ("internal", "An unexpected error occurred."),
];

/// Catálogo de mensagens por idioma, indexado pelo código do erro.
#[derive(Debug, Clone)]
pub struct I18nStore {
    messages: Arc<HashMap<&'static str, HashMap<&'static str, &'static str>>>,
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

impl I18nStore {
    pub fn new() -> Self {
        let mut messages = HashMap::new();
        messages.insert("pt", PT.iter().copied().collect());
        messages.insert("en", EN.iter().copied().collect());
        Self { messages: Arc::new(messages) }
    }

    /// Idioma desconhecido cai para o português; chave desconhecida volta como está.
    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.messages
            .get(lang)
            .and_then(|table| table.get(key))
            .or_else(|| self.messages.get(DEFAULT_LANG).and_then(|table| table.get(key)))
            .map(|msg| msg.to_string())
            .unwrap_or_else(|| key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_catalogs_cover_the_same_keys() {
        let pt: Vec<_> = PT.iter().map(|(k, _)| *k).collect();
        let en: Vec<_> = EN.iter().map(|(k, _)| *k).collect();
        assert_eq!(pt, en);
    }

    #[test]
    fn falls_back_to_portuguese_then_to_key() {
        let store = I18nStore::new();
        assert_eq!(store.translate("es", "lead.not_found"), "Lead não encontrado");
        assert_eq!(store.translate("en", "no.such.key"), "no.such.key");
    }
}
