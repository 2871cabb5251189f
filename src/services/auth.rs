// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{Claims, CreateUserPayload, Role, User},
    services::authorization::{authorize, resolve_organization},
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    token_ttl_days: i64,
    pool: PgPool,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// bcrypt é CPU-bound: roda fora do runtime async
pub(crate) async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

pub(crate) async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    let valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;
    Ok(valid)
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String, token_ttl_days: i64, pool: PgPool) -> Self {
        Self { user_repo, jwt_secret, token_ttl_days, pool }
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .user_repo
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        // Usuário sem senha local (provedor externo) não entra por aqui
        let password_hash = user.password_hash.as_deref().ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!("🔑 Login de {} ({})", user.email, user.role.as_str());
        self.create_token(&user)
    }

    /// Token válido → usuário atual do banco (papel e organização sempre frescos).
    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        self.user_repo
            .find_by_id(token_data.claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)
    }

    /// Criação de usuário por um admin. Ninguém concede papel acima do próprio,
    /// e só o super admin escolhe a organização.
    pub async fn create_user(&self, actor: &User, payload: &CreateUserPayload) -> Result<User, AppError> {
        authorize(actor.role, Role::Admin)?;

        let role = payload.role.unwrap_or(Role::Operador);
        authorize(actor.role, role)?;

        let organization_id = match (actor.role, role) {
            (_, Role::SuperAdmin) => None,
            (Role::SuperAdmin, _) => Some(
                payload
                    .organization_id
                    .ok_or(AppError::BadRequest("user.organization_required"))?,
            ),
            _ => resolve_organization(actor, payload.organization_id)?,
        };

        let hashed_password = hash_password(&payload.password).await?;

        let user = self
            .user_repo
            .create_user(
                &self.pool,
                &normalize_email(&payload.email),
                &hashed_password,
                payload.name.trim(),
                role,
                organization_id,
            )
            .await?;

        tracing::info!(
            user_id = %user.id,
            organization_id = ?user.organization_id,
            "👤 Usuário {} criado como {}",
            user.email,
            role.as_str()
        );
        Ok(user)
    }

    /// Garante que o super admin da plataforma exista (boot).
    pub async fn ensure_super_admin(&self, email: &str, password: &str) -> Result<User, AppError> {
        let email = normalize_email(email);
        if let Some(existing) = self.user_repo.find_by_email(&email).await? {
            return Ok(existing);
        }

        let hashed_password = hash_password(password).await?;
        let user = self
            .user_repo
            .create_user(&self.pool, &email, &hashed_password, "Super Admin", Role::SuperAdmin, None)
            .await?;

        tracing::info!("🛡️ Super admin {} criado", user.email);
        Ok(user)
    }

    fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(self.token_ttl_days);

        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_normalised() {
        assert_eq!(normalize_email("  Ana@Clinica.COM "), "ana@clinica.com");
    }

    #[tokio::test]
    async fn hashed_secrets_verify() {
        let hashed = hash_password("segredo-super-forte").await.unwrap();
        assert!(verify_password("segredo-super-forte", &hashed).await.unwrap());
        assert!(!verify_password("outro", &hashed).await.unwrap());
    }
}
