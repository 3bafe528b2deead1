//! Business logic services.

pub mod activity_log;
pub mod deletion;
pub mod eligibility;
pub mod registration;
pub mod user;

pub use activity_log::ActivityLogService;
pub use deletion::{
    DeletionOutcome, DeletionService, DeletionTrigger, PendingDeletionEntry,
};
pub use eligibility::{Eligibility, EligibilityService, RETENTION_DAYS};
pub use registration::{RegistrationService, RegistrationView};
pub use user::{RegisterInput, UpdateProfileInput, UserService};
