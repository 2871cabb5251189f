pub mod appointments;
pub mod auth;
pub mod health;
pub mod leads;
pub mod metrics;
pub mod organizations;
pub mod webhooks;
