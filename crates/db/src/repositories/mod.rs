//! Database repositories.

pub mod activity_log;
pub mod deletion;
pub mod event;
pub mod pending_deletion;
pub mod registration;
pub mod user;

pub use activity_log::ActivityLogRepository;
pub use deletion::DeletionRepository;
pub use event::EventRepository;
pub use pending_deletion::PendingDeletionRepository;
pub use registration::RegistrationRepository;
pub use user::UserRepository;
