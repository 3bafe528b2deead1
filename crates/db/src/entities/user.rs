//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub email: String,

    pub email_lower: String,

    pub first_name: String,

    pub last_name: String,

    /// Argon2 password hash
    pub password: String,

    /// Session token
    #[sea_orm(unique, nullable)]
    pub token: Option<String>,

    /// Blocked accounts cannot authenticate. Set while a deletion is
    /// pending.
    #[sea_orm(default_value = false)]
    pub is_blocked: bool,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::registration::Entity")]
    Registration,
    #[sea_orm(has_one = "super::pending_deletion::Entity")]
    PendingDeletion,
    #[sea_orm(has_many = "super::activity_log::Entity")]
    ActivityLog,
    #[sea_orm(has_one = "super::admin_role::Entity")]
    AdminRole,
}

impl Related<super::registration::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Registration.def()
    }
}

impl Related<super::pending_deletion::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PendingDeletion.def()
    }
}

impl Related<super::activity_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ActivityLog.def()
    }
}

impl Related<super::admin_role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AdminRole.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
