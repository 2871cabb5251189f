// src/services/authorization.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::auth::{Role, User},
};

/// Compara papéis pela hierarquia numérica (super_admin=4, admin=3, operador=1).
pub fn authorize(role: Role, required: Role) -> Result<(), AppError> {
    if role.level() >= required.level() {
        Ok(())
    } else {
        Err(AppError::AccessDenied("access.denied_role"))
    }
}

/// Decide em qual organização o chamador está atuando.
///
/// - super_admin: a organização pedida, ou `None` ("nenhuma organização").
/// - demais papéis: sempre a do próprio usuário. Pedir outra é negado, e um
///   usuário sem organização é negado. Nunca há fallback para outro tenant.
pub fn resolve_organization(user: &User, requested: Option<Uuid>) -> Result<Option<Uuid>, AppError> {
    if user.role == Role::SuperAdmin {
        return Ok(requested);
    }

    let own = user
        .organization_id
        .ok_or(AppError::AccessDenied("access.no_organization"))?;

    match requested {
        Some(org_id) if org_id != own => Err(AppError::AccessDenied("access.denied_organization")),
        _ => Ok(Some(own)),
    }
}

// Escopo resolvido de uma requisição autenticada
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantScope {
    pub user_id: Uuid,
    pub role: Role,
    pub organization_id: Option<Uuid>,
}

impl TenantScope {
    pub fn resolve(user: &User, requested: Option<Uuid>) -> Result<Self, AppError> {
        Ok(Self {
            user_id: user.id,
            role: user.role,
            organization_id: resolve_organization(user, requested)?,
        })
    }

    /// Escritas exigem uma organização concreta.
    pub fn require_organization(&self) -> Result<Uuid, AppError> {
        self.organization_id.ok_or(AppError::OrganizationRequired)
    }

    pub fn authorize(&self, required: Role) -> Result<(), AppError> {
        authorize(self.role, required)
    }
}
