pub mod appointment_service;
pub mod auth;
pub mod authorization;
pub mod lead_service;
pub mod metrics_service;
pub mod organization_service;
pub mod webhook_service;
