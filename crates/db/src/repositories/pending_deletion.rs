//! Pending deletion ledger repository.

use std::sync::Arc;

use crate::entities::{PendingDeletion, User, pending_deletion, user};
use chrono::{DateTime, Utc};
use gatherly_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    Set, SqlErr, TransactionTrait, sea_query::Expr,
};

/// Pending deletion repository for database operations.
#[derive(Clone)]
pub struct PendingDeletionRepository {
    db: Arc<DatabaseConnection>,
}

impl PendingDeletionRepository {
    /// Create a new pending deletion repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the pending deletion for a user.
    pub async fn find_by_user_id(
        &self,
        user_id: &str,
    ) -> AppResult<Option<pending_deletion::Model>> {
        PendingDeletion::find()
            .filter(pending_deletion::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All pending deletions due at or before `now`, earliest first.
    pub async fn find_due(&self, now: DateTime<Utc>) -> AppResult<Vec<pending_deletion::Model>> {
        PendingDeletion::find()
            .filter(pending_deletion::Column::DeletionDate.lte(now))
            .order_by_asc(pending_deletion::Column::DeletionDate)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All pending deletions, soonest deletion date first.
    pub async fn find_all_ordered(&self) -> AppResult<Vec<pending_deletion::Model>> {
        PendingDeletion::find()
            .order_by_asc(pending_deletion::Column::DeletionDate)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Register a pending deletion and block the account, atomically.
    ///
    /// The unique index on `user_id` makes concurrent schedule attempts for
    /// the same user collapse to a single winner; the loser gets
    /// [`AppError::AlreadyScheduled`].
    pub async fn schedule(
        &self,
        id: String,
        user_id: &str,
        deletion_date: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<pending_deletion::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let model = pending_deletion::ActiveModel {
            id: Set(id),
            user_id: Set(user_id.to_string()),
            deletion_date: Set(deletion_date.into()),
            created_at: Set(now.into()),
        };

        let pending = model.insert(&txn).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::AlreadyScheduled(user_id.to_string())
            }
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                AppError::UserNotFound(user_id.to_string())
            }
            _ => AppError::Database(e.to_string()),
        })?;

        User::update_many()
            .col_expr(user::Column::IsBlocked, Expr::value(true))
            .filter(user::Column::Id.eq(user_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(pending)
    }

    /// Remove the pending deletion and unblock the account, atomically.
    ///
    /// Fails with [`AppError::NotScheduled`] when no row exists.
    pub async fn cancel(&self, user_id: &str) -> AppResult<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let deleted = PendingDeletion::delete_many()
            .filter(pending_deletion::Column::UserId.eq(user_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if deleted.rows_affected == 0 {
            txn.rollback()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            return Err(AppError::NotScheduled(user_id.to_string()));
        }

        User::update_many()
            .col_expr(user::Column::IsBlocked, Expr::value(false))
            .filter(user::Column::Id.eq(user_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}
