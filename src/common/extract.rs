// src/common/extract.rs

// Versões dos extratores do axum que rejeitam com o nosso ApiError
// (JSON traduzido, sempre 400) em vez do texto puro padrão.

use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
};

fn rejected(code: &'static str, field: &str, reason: String, locale: &Locale, state: &AppState) -> ApiError {
    tracing::debug!(code, "Requisição rejeitada: {}", reason);
    let mut api_error = AppError::BadRequest(code).to_api_error(locale, &state.i18n_store);
    api_error.details = Some(json!({ field: [reason] }));
    api_error
}

/// Corpo JSON.
pub struct AppJson<T>(pub T);

impl<T> FromRequest<AppState> for AppJson<T>
where
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let locale = Locale::from_headers(req.headers());
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(rejected("request.invalid_body", "body", rejection.body_text(), &locale, state)),
        }
    }
}

/// Query string.
pub struct AppQuery<T>(pub T);

impl<T> FromRequestParts<AppState> for AppQuery<T>
where
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(AppQuery(value)),
            Err(rejection) => {
                let locale = Locale::from_headers(&parts.headers);
                Err(rejected("request.invalid_query", "query", rejection.body_text(), &locale, state))
            }
        }
    }
}

/// Parâmetros de rota.
pub struct AppPath<T>(pub T);

impl<T> FromRequestParts<AppState> for AppPath<T>
where
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(AppPath(value)),
            Err(rejection) => {
                let locale = Locale::from_headers(&parts.headers);
                Err(rejected("request.invalid_path", "path", rejection.body_text(), &locale, state))
            }
        }
    }
}
