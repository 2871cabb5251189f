pub mod appointment;
pub mod auth;
pub mod lead;
pub mod metrics;
pub mod organization;
pub mod webhook;
