// src/common/error.rs

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

// Erro interno da aplicação. Cada variante carrega um código estável
// (chave do I18nStore) em vez de uma frase pronta.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Requisição inválida ({0})")]
    BadRequest(&'static str),

    #[error("Tipo de evento desconhecido: {0}")]
    UnknownEventType(String),

    #[error("Organização obrigatória")]
    OrganizationRequired,

    #[error("Não autenticado")]
    Unauthorized,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Segredo do webhook inválido")]
    InvalidWebhookSecret,

    #[error("Acesso negado ({0})")]
    AccessDenied(&'static str),

    // "Não existe" e "existe em outro tenant" são propositalmente o mesmo erro.
    #[error("Não encontrado ({0})")]
    NotFound(&'static str),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Slug já existe")]
    SlugAlreadyExists,

    #[error("Banco de dados indisponível: {0}")]
    StorageUnavailable(String),

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if is_storage_unavailable(&e) {
            AppError::StorageUnavailable(e.to_string())
        } else {
            AppError::DatabaseError(e)
        }
    }
}

/// Reconhece a "assinatura" de banco fora do ar: falhas de pool/rede e os
/// SQLSTATE de conexão (classe 08), shutdown (57P0x) e excesso de conexões.
pub fn is_storage_unavailable(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => true,
        sqlx::Error::Database(db_err) => db_err
            .code()
            .map(|code| code.starts_with("08") || code.starts_with("57P") || code == "53300")
            .unwrap_or(false),
        _ => false,
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::BadRequest(_)
            | AppError::UnknownEventType(_)
            | AppError::OrganizationRequired => StatusCode::BAD_REQUEST,
            AppError::Unauthorized
            | AppError::InvalidToken
            | AppError::InvalidCredentials
            | AppError::InvalidWebhookSecret => StatusCode::UNAUTHORIZED,
            AppError::AccessDenied(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::EmailAlreadyExists | AppError::SlugAlreadyExists => StatusCode::CONFLICT,
            AppError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Chave de tradução usada pelo I18nStore.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation.failed",
            AppError::BadRequest(code) | AppError::AccessDenied(code) | AppError::NotFound(code) => code,
            AppError::UnknownEventType(_) => "webhook.unknown_event_type",
            AppError::OrganizationRequired => "organization.required",
            AppError::Unauthorized => "auth.unauthorized",
            AppError::InvalidToken => "auth.invalid_token",
            AppError::InvalidCredentials => "auth.invalid_credentials",
            AppError::InvalidWebhookSecret => "webhook.invalid_secret",
            AppError::EmailAlreadyExists => "auth.email_taken",
            AppError::SlugAlreadyExists => "organization.slug_taken",
            AppError::StorageUnavailable(_) => "storage.unavailable",
            _ => "internal",
        }
    }

    /// Converte para o erro de transporte, já traduzido para o idioma do cliente.
    pub fn to_api_error(self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let status = self.status();
        let message = i18n.translate(&locale.0, self.code());

        match self {
            AppError::ValidationError(errors) => {
                let mut details: HashMap<String, Vec<String>> = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                ApiError {
                    status,
                    error: message,
                    details: Some(json!(details)),
                }
            }
            AppError::UnknownEventType(tag) => ApiError {
                status,
                error: format!("{}: {}", message, tag),
                details: None,
            },
            AppError::StorageUnavailable(ref detail) => {
                tracing::error!("🔥 Banco de dados indisponível: {}", detail);
                ApiError { status, error: message, details: None }
            }
            ref e if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                ApiError { status, error: message, details: None }
            }
            _ => ApiError { status, error: message, details: None },
        }
    }
}

// Erro de transporte: é o que efetivamente vai para o cliente.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt() -> Locale {
        Locale("pt".to_string())
    }

    #[test]
    fn pool_timeout_and_io_errors_are_storage_unavailable() {
        assert!(is_storage_unavailable(&sqlx::Error::PoolTimedOut));
        assert!(is_storage_unavailable(&sqlx::Error::PoolClosed));
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert!(is_storage_unavailable(&sqlx::Error::Io(io)));

        let app_err: AppError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(app_err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn row_not_found_stays_a_database_error() {
        assert!(!is_storage_unavailable(&sqlx::Error::RowNotFound));
        let app_err: AppError = sqlx::Error::RowNotFound.into();
        assert_eq!(app_err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn taxonomy_maps_to_http_status() {
        assert_eq!(AppError::BadRequest("lead.name_phone_required").status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::OrganizationRequired.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::AccessDenied("access.denied_role").status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("lead.not_found").status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::SlugAlreadyExists.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn unknown_organization_message_is_localised() {
        let store = I18nStore::new();
        let api = AppError::NotFound("organization.not_found").to_api_error(&pt(), &store);
        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert_eq!(api.error, "Organização não encontrada");

        let api = AppError::NotFound("organization.not_found")
            .to_api_error(&Locale("en".to_string()), &store);
        assert_eq!(api.error, "Organization not found");
    }

    #[test]
    fn unknown_event_type_echoes_the_tag() {
        let store = I18nStore::new();
        let api = AppError::UnknownEventType("lead_deleted".into()).to_api_error(&pt(), &store);
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.error, "Tipo de evento desconhecido: lead_deleted");
    }

    #[test]
    fn validation_errors_carry_field_details() {
        let mut errors = validator::ValidationErrors::new();
        let mut err = validator::ValidationError::new("length");
        err.message = Some("required".into());
        errors.add("name", err);

        let api = AppError::ValidationError(errors).to_api_error(&pt(), &I18nStore::new());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.expect("details");
        assert_eq!(details["name"][0], "required");
    }
}
