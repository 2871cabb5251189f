// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::Role,
    services::authorization::authorize,
};

/// 1. O Trait que define o papel mínimo exigido
pub trait RoleRequirement: Send + Sync + 'static {
    const ROLE: Role;
}

/// 2. O Extractor (Guardião)
pub struct RequireRole<R>(pub PhantomData<R>);

// 3. Implementação do FromRequestParts
impl<R, S> FromRequestParts<S> for RequireRole<R>
where
    R: RoleRequirement,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_headers(&parts.headers);

        // A. Extrai Usuário (colocado pelo auth_guard/tenant_guard)
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or_else(|| AppError::Unauthorized.to_api_error(&locale, &app_state.i18n_store))?;

        // B. Compara pela hierarquia
        authorize(user.0.role, R::ROLE).map_err(|e| {
            tracing::warn!(user_id = %user.0.id, required = R::ROLE.as_str(), "🚫 Papel insuficiente");
            e.to_api_error(&locale, &app_state.i18n_store)
        })?;

        Ok(RequireRole(PhantomData))
    }
}

// ---
// PAPÉIS MÍNIMOS (TIPOS)
// ---

pub struct AtLeastAdmin;
impl RoleRequirement for AtLeastAdmin {
    const ROLE: Role = Role::Admin;
}

pub struct SuperAdminOnly;
impl RoleRequirement for SuperAdminOnly {
    const ROLE: Role = Role::SuperAdmin;
}
