pub mod user_repo;
pub use user_repo::UserRepository;
pub mod organization_repo;
pub use organization_repo::OrganizationRepository;
pub mod lead_repo;
pub use lead_repo::LeadRepository;
pub mod appointment_repo;
pub use appointment_repo::AppointmentRepository;
pub mod metrics_repo;
pub use metrics_repo::MetricsRepository;
