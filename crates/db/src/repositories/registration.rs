//! Event registration repository.

use std::sync::Arc;

use crate::entities::{Registration, registration};
use gatherly_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

/// Registration repository for database operations.
#[derive(Clone)]
pub struct RegistrationRepository {
    db: Arc<DatabaseConnection>,
}

impl RegistrationRepository {
    /// Create a new registration repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user's registration for an event.
    pub async fn find_by_user_and_event(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> AppResult<Option<registration::Model>> {
        Registration::find()
            .filter(registration::Column::UserId.eq(user_id))
            .filter(registration::Column::EventId.eq(event_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All non-cancelled registrations for a user, oldest first.
    pub async fn find_active_by_user(&self, user_id: &str) -> AppResult<Vec<registration::Model>> {
        Registration::find()
            .filter(registration::Column::UserId.eq(user_id))
            .filter(registration::Column::CancelledAt.is_null())
            .order_by_asc(registration::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new registration.
    pub async fn create(&self, model: registration::ActiveModel) -> AppResult<registration::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a registration.
    pub async fn update(&self, model: registration::ActiveModel) -> AppResult<registration::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
