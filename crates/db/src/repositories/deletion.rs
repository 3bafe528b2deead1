//! Account deletion executor repository.
//!
//! Performs the destructive multi-table removal as a single transaction:
//! archive insertion, admin-role and registration removal, ledger cleanup,
//! audit-trail detachment, and finally the user row itself. No intermediate
//! state is observable; any failure rolls the whole batch back.

use std::sync::Arc;

use crate::entities::{
    ActivityLog, AdminRole, Event, PendingDeletion, Registration, User, activity_log,
    archived_user, event, pending_deletion, registration,
};
use chrono::{DateTime, Utc};
use gatherly_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait, sea_query::Expr,
};
use serde_json::json;

/// Deletion executor repository.
#[derive(Clone)]
pub struct DeletionRepository {
    db: Arc<DatabaseConnection>,
}

impl DeletionRepository {
    /// Create a new deletion repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Delete a user and everything they own, atomically.
    ///
    /// The user is re-fetched inside the transaction, so a concurrent
    /// deletion of the same account makes the second caller fail with
    /// [`AppError::UserNotFound`] instead of double-deleting.
    ///
    /// Returns the archive row written as part of the batch.
    pub async fn delete_completely(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
        archive_id: String,
    ) -> AppResult<archived_user::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let user = User::find_by_id(user_id)
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::UserNotFound(user_id.to_string()))?;

        // Build the GDPR-permissible participation snapshot: non-cancelled
        // registrations whose event had already occurred at deletion time.
        let registrations = Registration::find()
            .filter(registration::Column::UserId.eq(user_id))
            .filter(registration::Column::CancelledAt.is_null())
            .all(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let event_ids: Vec<String> = registrations.iter().map(|r| r.event_id.clone()).collect();

        let events = if event_ids.is_empty() {
            vec![]
        } else {
            Event::find()
                .filter(event::Column::Id.is_in(event_ids))
                .all(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?
        };

        let archive = archived_user::ActiveModel {
            id: Set(archive_id),
            first_name: Set(user.first_name.clone()),
            last_name: Set(user.last_name.clone()),
            registered_at: Set(user.created_at),
            deleted_at: Set(now.into()),
            events_participated: Set(participation_snapshot(&events, now)),
        };
        let archive = archive
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        AdminRole::delete_by_id(user_id)
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Registration::delete_many()
            .filter(registration::Column::UserId.eq(user_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        PendingDeletion::delete_many()
            .filter(pending_deletion::Column::UserId.eq(user_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // Keep audit rows, detach identity
        ActivityLog::update_many()
            .col_expr(activity_log::Column::UserId, Expr::value(None::<String>))
            .filter(activity_log::Column::UserId.eq(user_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        User::delete_by_id(user_id)
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(archive)
    }
}

/// Serialize the events a user actually attended: only events dated at or
/// before `now` make it into the archive.
fn participation_snapshot(events: &[event::Model], now: DateTime<Utc>) -> serde_json::Value {
    let mut attended: Vec<&event::Model> = events
        .iter()
        .filter(|e| e.date.with_timezone(&Utc) <= now)
        .collect();
    attended.sort_by_key(|e| e.date);

    json!(
        attended
            .iter()
            .map(|e| {
                json!({
                    "eventId": e.id,
                    "title": e.title,
                    "date": e.date.with_timezone(&Utc).to_rfc3339(),
                })
            })
            .collect::<Vec<_>>()
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn make_event(id: &str, title: &str, date: DateTime<Utc>) -> event::Model {
        event::Model {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
            location: None,
            date: date.into(),
            created_at: date.into(),
        }
    }

    #[test]
    fn snapshot_keeps_only_past_events() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let events = vec![
            make_event("e1", "Spring Meetup", now - Duration::days(10)),
            make_event("e2", "Summer Gala", now + Duration::days(30)),
        ];

        let snapshot = participation_snapshot(&events, now);
        let entries = snapshot.as_array().unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["eventId"], "e1");
        assert_eq!(entries[0]["title"], "Spring Meetup");
    }

    #[test]
    fn snapshot_includes_event_happening_right_now() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let events = vec![make_event("e1", "Launch Day", now)];

        let snapshot = participation_snapshot(&events, now);
        assert_eq!(snapshot.as_array().unwrap().len(), 1);
    }

    #[test]
    fn snapshot_of_no_events_is_empty_array() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let snapshot = participation_snapshot(&[], now);
        assert_eq!(snapshot, serde_json::json!([]));
    }

    #[test]
    fn snapshot_is_ordered_by_event_date() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let events = vec![
            make_event("e2", "Second", now - Duration::days(5)),
            make_event("e1", "First", now - Duration::days(50)),
        ];

        let snapshot = participation_snapshot(&events, now);
        let entries = snapshot.as_array().unwrap();

        assert_eq!(entries[0]["eventId"], "e1");
        assert_eq!(entries[1]["eventId"], "e2");
    }
}
