// src/config.rs

use std::{env, str::FromStr, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{AppointmentRepository, LeadRepository, MetricsRepository, OrganizationRepository, UserRepository},
    services::{
        appointment_service::AppointmentService, auth::AuthService, lead_service::LeadService,
        metrics_service::MetricsService, organization_service::OrganizationService, webhook_service::WebhookService,
    },
};

// Configuração lida do ambiente (.env é opcional)
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub bind_addr: String,
    pub token_ttl_days: i64,
    pub super_admin: Option<(String, String)>,
}

fn parse_or<T: FromStr>(name: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} inválida: '{}'", name, raw)),
        Err(_) => Ok(default),
    }
}

pub const MAX_TOKEN_TTL_DAYS: i64 = 365;

fn token_ttl_days(days: i64) -> anyhow::Result<i64> {
    anyhow::ensure!(
        (1..=MAX_TOKEN_TTL_DAYS).contains(&days),
        "TOKEN_TTL_DAYS deve estar entre 1 e {}, recebido {}",
        MAX_TOKEN_TTL_DAYS,
        days
    );
    Ok(days)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let super_admin = match (env::var("SUPER_ADMIN_EMAIL"), env::var("SUPER_ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) if !email.trim().is_empty() && !password.is_empty() => Some((email, password)),
            _ => None,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 5)?,
            acquire_timeout: Duration::from_secs(parse_or("DATABASE_ACQUIRE_TIMEOUT_SECS", 3)?),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            token_ttl_days: token_ttl_days(parse_or("TOKEN_TTL_DAYS", 7)?)?,
            super_admin,
        })
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub i18n_store: I18nStore,
    pub auth_service: AuthService,
    pub organization_service: OrganizationService,
    pub lead_service: LeadService,
    pub appointment_service: AppointmentService,
    pub metrics_service: MetricsService,
    pub webhook_service: WebhookService,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::from_pool(db_pool, config))
    }

    /// Monta o gráfico de dependências sobre um pool já existente.
    pub fn from_pool(db_pool: PgPool, config: &Config) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let organization_repo = OrganizationRepository::new(db_pool.clone());
        let lead_repo = LeadRepository::new(db_pool.clone());
        let appointment_repo = AppointmentRepository::new(db_pool.clone());
        let metrics_repo = MetricsRepository::new(db_pool.clone());

        let auth_service = AuthService::new(
            user_repo.clone(),
            config.jwt_secret.clone(),
            config.token_ttl_days,
            db_pool.clone(),
        );
        let organization_service = OrganizationService::new(organization_repo, db_pool.clone());
        let lead_service = LeadService::new(lead_repo.clone(), metrics_repo.clone(), db_pool.clone());
        let appointment_service =
            AppointmentService::new(appointment_repo, lead_repo, metrics_repo.clone(), db_pool.clone());
        let metrics_service = MetricsService::new(metrics_repo, db_pool.clone());
        let webhook_service = WebhookService::new(
            organization_service.clone(),
            lead_service.clone(),
            appointment_service.clone(),
            metrics_service.clone(),
            user_repo,
            db_pool.clone(),
        );

        Self {
            db_pool,
            i18n_store: I18nStore::new(),
            auth_service,
            organization_service,
            lead_service,
            appointment_service,
            metrics_service,
            webhook_service,
        }
    }
}
