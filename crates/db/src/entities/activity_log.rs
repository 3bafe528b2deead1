//! Activity log entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of audited action.
///
/// Closed enum so every call site is compiler-checked when new action kinds
/// are added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(40))")]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Account created.
    #[sea_orm(string_value = "registered")]
    Registered,
    /// Successful login.
    #[sea_orm(string_value = "login")]
    Login,
    /// Profile fields changed.
    #[sea_orm(string_value = "profile_updated")]
    ProfileUpdated,
    /// Signed up for an event.
    #[sea_orm(string_value = "event_registered")]
    EventRegistered,
    /// Cancelled an event registration.
    #[sea_orm(string_value = "event_registration_cancelled")]
    EventRegistrationCancelled,
    /// Deletion deferred and account blocked.
    #[sea_orm(string_value = "profile_deletion_scheduled")]
    ProfileDeletionScheduled,
    /// Pending deletion cancelled, account unblocked.
    #[sea_orm(string_value = "profile_deletion_cancelled")]
    ProfileDeletionCancelled,
    /// Account deleted on direct request.
    #[sea_orm(string_value = "profile_deleted")]
    ProfileDeleted,
    /// Account deleted by the due-deletion sweep.
    #[sea_orm(string_value = "scheduled_deletion_executed")]
    ScheduledDeletionExecuted,
    /// The atomic deletion batch rolled back.
    #[sea_orm(string_value = "profile_deletion_failed")]
    ProfileDeletionFailed,
}

/// Append-only audit record.
///
/// `user_id` is nulled rather than cascaded when the owning user is deleted,
/// preserving audit history.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activity_log")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed, nullable)]
    pub user_id: Option<String>,

    pub action: ActionType,

    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub details: Option<Json>,

    #[sea_orm(nullable)]
    pub ip_address: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
