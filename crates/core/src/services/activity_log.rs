//! Append-only activity audit trail.

use std::sync::Arc;

use gatherly_common::{Clock, IdGenerator};
use gatherly_db::{
    entities::activity_log::{self, ActionType},
    repositories::ActivityLogRepository,
};
use sea_orm::Set;

/// Writes audit entries for user-visible actions.
///
/// Logging is best-effort: a failed insert is reported via `tracing` and
/// otherwise swallowed, so audit problems never fail the action being
/// audited.
#[derive(Clone)]
pub struct ActivityLogService {
    repo: ActivityLogRepository,
    clock: Arc<dyn Clock>,
    id_gen: IdGenerator,
}

impl ActivityLogService {
    /// Create a new activity log service.
    pub fn new(repo: ActivityLogRepository, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            clock,
            id_gen: IdGenerator::new(),
        }
    }

    /// Append an audit entry.
    ///
    /// `user_id` is `None` for entries that outlive their user, such as the
    /// record written after an account deletion commits.
    pub async fn log(
        &self,
        user_id: Option<&str>,
        action: ActionType,
        details: Option<serde_json::Value>,
        ip_address: Option<&str>,
    ) {
        let model = activity_log::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.map(ToString::to_string)),
            action: Set(action),
            details: Set(details),
            ip_address: Set(ip_address.map(ToString::to_string)),
            created_at: Set(self.clock.now().into()),
        };

        if let Err(e) = self.repo.create(model).await {
            tracing::warn!(
                error = %e,
                action = ?action,
                "Failed to write activity log entry"
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use gatherly_common::FixedClock;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult, RuntimeErr};

    fn service(db: sea_orm::DatabaseConnection) -> ActivityLogService {
        let db = Arc::new(db);
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap());
        ActivityLogService::new(ActivityLogRepository::new(db), Arc::new(clock))
    }

    #[tokio::test]
    async fn log_writes_an_entry() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![activity_log::Model {
                id: "log1".to_string(),
                user_id: Some("user1".to_string()),
                action: ActionType::Login,
                details: None,
                ip_address: None,
                created_at: now.into(),
            }]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        service(db)
            .log(Some("user1"), ActionType::Login, None, None)
            .await;
    }

    #[tokio::test]
    async fn log_swallows_database_errors() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Query(RuntimeErr::Internal(
                "connection lost".to_string(),
            ))])
            .into_connection();

        // Must not propagate the failure
        service(db)
            .log(Some("user1"), ActionType::ProfileUpdated, None, None)
            .await;
    }
}
