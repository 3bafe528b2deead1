//! Archived user entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The minimal GDPR-permissible record kept after an account is deleted.
///
/// Written exactly once, inside the same transaction that removes the user
/// row. Never updated or deleted by the application. Deliberately carries no
/// foreign key to `user`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "archived_user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub first_name: String,

    pub last_name: String,

    /// When the account was originally created.
    pub registered_at: DateTimeWithTimeZone,

    pub deleted_at: DateTimeWithTimeZone,

    /// Serialized `[{eventId, title, date}]` for non-cancelled registrations
    /// whose event had already occurred at deletion time.
    #[sea_orm(column_type = "JsonBinary")]
    pub events_participated: Json,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
