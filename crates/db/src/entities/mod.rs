//! Database entities.

pub mod activity_log;
pub mod admin_role;
pub mod archived_user;
pub mod event;
pub mod pending_deletion;
pub mod registration;
pub mod user;

pub use activity_log::Entity as ActivityLog;
pub use admin_role::Entity as AdminRole;
pub use archived_user::Entity as ArchivedUser;
pub use event::Entity as Event;
pub use pending_deletion::Entity as PendingDeletion;
pub use registration::Entity as Registration;
pub use user::Entity as User;
