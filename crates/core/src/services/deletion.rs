//! Account deletion lifecycle: immediate deletion, the pending-deletion
//! ledger, and the due-deletion sweep.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use gatherly_common::{AppError, AppResult, Clock, IdGenerator};
use gatherly_db::{
    entities::{activity_log::ActionType, archived_user},
    repositories::{DeletionRepository, PendingDeletionRepository, UserRepository},
};
use serde::Serialize;
use serde_json::json;

use crate::services::{ActivityLogService, EligibilityService};

/// What initiated a deletion, recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionTrigger {
    /// The user asked and was immediately eligible.
    Immediate,
    /// The due-deletion sweep executed a scheduled deletion.
    Scheduled,
}

/// Outcome of a deletion request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionOutcome {
    /// Whether the account was deleted right away.
    pub immediate: bool,
    /// When the deferred deletion will run, if it was deferred.
    pub deletion_date: Option<DateTime<Utc>>,
}

/// One row of the admin pending-deletions overview.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingDeletionEntry {
    pub user_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// When the account becomes due for deletion.
    pub deletion_date: DateTime<Utc>,
    /// When the user requested deletion.
    pub scheduled_at: DateTime<Utc>,
    /// Date of the event anchoring the retention window, if any remains.
    pub anchor_event_date: Option<DateTime<Utc>>,
}

/// Orchestrates the deletion lifecycle.
#[derive(Clone)]
pub struct DeletionService {
    deletion_repo: DeletionRepository,
    pending_repo: PendingDeletionRepository,
    user_repo: UserRepository,
    eligibility: EligibilityService,
    activity_log: ActivityLogService,
    clock: Arc<dyn Clock>,
    id_gen: IdGenerator,
}

impl DeletionService {
    /// Create a new deletion service.
    pub fn new(
        deletion_repo: DeletionRepository,
        pending_repo: PendingDeletionRepository,
        user_repo: UserRepository,
        eligibility: EligibilityService,
        activity_log: ActivityLogService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            deletion_repo,
            pending_repo,
            user_repo,
            eligibility,
            activity_log,
            clock,
            id_gen: IdGenerator::new(),
        }
    }

    /// Handle a user's deletion request.
    ///
    /// Eligible accounts are deleted on the spot; everyone else gets a
    /// ledger entry for the date their retention window closes and is
    /// blocked until then.
    pub async fn request_deletion(
        &self,
        user_id: &str,
        ip_address: Option<&str>,
    ) -> AppResult<DeletionOutcome> {
        let eligibility = self.eligibility.evaluate(user_id).await?;

        if eligibility.can_delete {
            self.delete_completely(user_id, DeletionTrigger::Immediate, ip_address)
                .await?;
            return Ok(DeletionOutcome {
                immediate: true,
                deletion_date: None,
            });
        }

        let deletion_date = eligibility.delete_date.ok_or_else(|| {
            AppError::Internal("deferred eligibility without a delete date".to_string())
        })?;
        self.schedule_at(user_id, deletion_date, ip_address).await?;

        Ok(DeletionOutcome {
            immediate: false,
            deletion_date: Some(deletion_date),
        })
    }

    /// Schedule a deferred deletion for a user who is not yet eligible.
    ///
    /// Rejects accounts that could simply be deleted now with
    /// [`AppError::AlreadyEligible`].
    pub async fn schedule(
        &self,
        user_id: &str,
        ip_address: Option<&str>,
    ) -> AppResult<DateTime<Utc>> {
        let eligibility = self.eligibility.evaluate(user_id).await?;

        if eligibility.can_delete {
            return Err(AppError::AlreadyEligible(user_id.to_string()));
        }

        let deletion_date = eligibility.delete_date.ok_or_else(|| {
            AppError::Internal("deferred eligibility without a delete date".to_string())
        })?;
        self.schedule_at(user_id, deletion_date, ip_address).await
    }

    async fn schedule_at(
        &self,
        user_id: &str,
        deletion_date: DateTime<Utc>,
        ip_address: Option<&str>,
    ) -> AppResult<DateTime<Utc>> {
        let now = self.clock.now();
        self.pending_repo
            .schedule(self.id_gen.generate(), user_id, deletion_date, now)
            .await?;

        self.activity_log
            .log(
                Some(user_id),
                ActionType::ProfileDeletionScheduled,
                Some(json!({ "deletionDate": deletion_date.to_rfc3339() })),
                ip_address,
            )
            .await;

        tracing::info!(
            user_id = user_id,
            deletion_date = %deletion_date,
            "Account deletion scheduled, account blocked"
        );

        Ok(deletion_date)
    }

    /// Cancel a scheduled deletion and unblock the account.
    pub async fn cancel(&self, user_id: &str, ip_address: Option<&str>) -> AppResult<()> {
        self.pending_repo.cancel(user_id).await?;

        self.activity_log
            .log(
                Some(user_id),
                ActionType::ProfileDeletionCancelled,
                None,
                ip_address,
            )
            .await;

        tracing::info!(user_id = user_id, "Scheduled deletion cancelled, account unblocked");

        Ok(())
    }

    /// Delete an account and all its data in one atomic batch.
    ///
    /// On success the audit entry is written after the commit, without a
    /// user reference (the user row no longer exists). On failure the
    /// rolled-back state is recorded as `profile_deletion_failed` and the
    /// caller sees [`AppError::DeletionFailed`].
    pub async fn delete_completely(
        &self,
        user_id: &str,
        trigger: DeletionTrigger,
        ip_address: Option<&str>,
    ) -> AppResult<archived_user::Model> {
        let now = self.clock.now();
        let archive_id = self.id_gen.generate();

        match self
            .deletion_repo
            .delete_completely(user_id, now, archive_id)
            .await
        {
            Ok(archive) => {
                let action = match trigger {
                    DeletionTrigger::Immediate => ActionType::ProfileDeleted,
                    DeletionTrigger::Scheduled => ActionType::ScheduledDeletionExecuted,
                };
                self.activity_log
                    .log(
                        None,
                        action,
                        Some(json!({ "userId": user_id, "archiveId": archive.id })),
                        ip_address,
                    )
                    .await;

                tracing::info!(
                    user_id = user_id,
                    archive_id = %archive.id,
                    trigger = ?trigger,
                    "Account deleted"
                );

                Ok(archive)
            }
            Err(e @ AppError::UserNotFound(_)) => Err(e),
            Err(e) => {
                self.activity_log
                    .log(
                        Some(user_id),
                        ActionType::ProfileDeletionFailed,
                        Some(json!({ "error": e.to_string() })),
                        ip_address,
                    )
                    .await;

                tracing::error!(user_id = user_id, error = %e, "Account deletion rolled back");

                Err(AppError::DeletionFailed(e.to_string()))
            }
        }
    }

    /// Admin overview of every scheduled deletion, soonest first.
    pub async fn list_pending(&self) -> AppResult<Vec<PendingDeletionEntry>> {
        let pending = self.pending_repo.find_all_ordered().await?;

        let mut entries = Vec::with_capacity(pending.len());
        for row in pending {
            let Some(user) = self.user_repo.find_by_id(&row.user_id).await? else {
                tracing::warn!(user_id = %row.user_id, "Pending deletion references a missing user");
                continue;
            };
            let anchor = self.eligibility.anchor_event(&row.user_id).await?;

            entries.push(PendingDeletionEntry {
                user_id: user.id,
                email: user.email,
                first_name: user.first_name,
                last_name: user.last_name,
                deletion_date: row.deletion_date.with_timezone(&Utc),
                scheduled_at: row.created_at.with_timezone(&Utc),
                anchor_event_date: anchor.map(|e| e.date.with_timezone(&Utc)),
            });
        }

        Ok(entries)
    }

    /// Execute every deletion whose date has arrived.
    ///
    /// Each account is processed independently; a failure is recorded and
    /// the sweep moves on, leaving the ledger row for the next run. Returns
    /// the number of accounts deleted.
    pub async fn run_due_sweep(&self) -> AppResult<u64> {
        let now = self.clock.now();
        let due = self.pending_repo.find_due(now).await?;
        let total = due.len();

        let mut deleted: u64 = 0;
        for row in due {
            match self
                .delete_completely(&row.user_id, DeletionTrigger::Scheduled, None)
                .await
            {
                Ok(_) => deleted += 1,
                Err(e) => {
                    tracing::error!(
                        user_id = %row.user_id,
                        error = %e,
                        "Scheduled deletion failed, row stays pending"
                    );
                }
            }
        }

        tracing::info!(due = total, deleted = deleted, "Deletion sweep finished");

        Ok(deleted)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use gatherly_common::FixedClock;
    use gatherly_db::{
        entities::{activity_log, event, pending_deletion, registration, user},
        repositories::{EventRepository, RegistrationRepository},
    };
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult, RuntimeErr};

    use crate::services::RETENTION_DAYS;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn make_user(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            email_lower: format!("{id}@example.com"),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            password: "hash".to_string(),
            token: None,
            is_blocked: false,
            created_at: (now() - Duration::days(400)).into(),
            updated_at: None,
        }
    }

    fn make_pending(id: &str, user_id: &str, due: DateTime<Utc>) -> pending_deletion::Model {
        pending_deletion::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            deletion_date: due.into(),
            created_at: (due - Duration::days(28)).into(),
        }
    }

    fn make_archive(id: &str) -> archived_user::Model {
        archived_user::Model {
            id: id.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            registered_at: (now() - Duration::days(400)).into(),
            deleted_at: now().into(),
            events_participated: serde_json::json!([]),
        }
    }

    fn make_log_row(id: &str, action: ActionType) -> activity_log::Model {
        activity_log::Model {
            id: id.to_string(),
            user_id: None,
            action,
            details: None,
            ip_address: None,
            created_at: now().into(),
        }
    }

    fn exec_ok() -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }
    }

    fn service(db: sea_orm::DatabaseConnection) -> DeletionService {
        service_with(Arc::new(db))
    }

    fn service_with(db: Arc<sea_orm::DatabaseConnection>) -> DeletionService {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(now()));
        let eligibility = EligibilityService::new(
            UserRepository::new(db.clone()),
            RegistrationRepository::new(db.clone()),
            EventRepository::new(db.clone()),
            clock.clone(),
        );
        let activity_log =
            ActivityLogService::new(gatherly_db::repositories::ActivityLogRepository::new(db.clone()), clock.clone());
        DeletionService::new(
            DeletionRepository::new(db.clone()),
            PendingDeletionRepository::new(db.clone()),
            UserRepository::new(db),
            eligibility,
            activity_log,
            clock,
        )
    }

    #[tokio::test]
    async fn schedule_refuses_an_already_eligible_account() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![make_user("user1")]])
            .append_query_results([Vec::<registration::Model>::new()])
            .into_connection();

        let result = service(db).schedule("user1", None).await;
        assert!(matches!(result, Err(AppError::AlreadyEligible(_))));
    }

    #[tokio::test]
    async fn request_deletion_defers_while_an_event_is_upcoming() {
        let event_date = now() + Duration::days(10);
        let expected_date = event_date + Duration::days(RETENTION_DAYS);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // eligibility: user, registrations, events
            .append_query_results([vec![make_user("user1")]])
            .append_query_results([vec![registration::Model {
                id: "reg1".to_string(),
                user_id: "user1".to_string(),
                event_id: "event1".to_string(),
                cancelled_at: None,
                created_at: now().into(),
            }]])
            .append_query_results([vec![event::Model {
                id: "event1".to_string(),
                title: "Summer Gala".to_string(),
                description: None,
                location: None,
                date: event_date.into(),
                created_at: now().into(),
            }]])
            // ledger transaction: insert pending, block user
            .append_query_results([vec![make_pending("pd1", "user1", expected_date)]])
            .append_exec_results([exec_ok()])
            // audit entry
            .append_query_results([vec![make_log_row("log1", ActionType::ProfileDeletionScheduled)]])
            .into_connection();

        let outcome = service(db).request_deletion("user1", None).await.unwrap();

        assert!(!outcome.immediate);
        assert_eq!(outcome.deletion_date, Some(expected_date));
    }

    #[tokio::test]
    async fn cancel_without_a_pending_row_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let result = service(db).cancel("user1", None).await;
        assert!(matches!(result, Err(AppError::NotScheduled(_))));
    }

    #[tokio::test]
    async fn sweep_continues_past_a_failing_account() {
        let due = now() - Duration::hours(1);
        let executed = ActionType::ScheduledDeletionExecuted;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // due rows
            .append_query_results([vec![
                make_pending("pd1", "user1", due),
                make_pending("pd2", "user2", due),
                make_pending("pd3", "user3", due),
            ]])
            // first account: full deletion batch succeeds
            .append_query_results([vec![make_user("user1")]])
            .append_query_results([Vec::<registration::Model>::new()])
            .append_query_results([vec![make_archive("arch1")]])
            .append_exec_results([exec_ok(), exec_ok(), exec_ok(), exec_ok(), exec_ok()])
            .append_query_results([vec![make_log_row("log1", executed)]])
            // second account: gone by the time its transaction looks
            .append_query_results([Vec::<user::Model>::new()])
            // third account still gets processed after the failure
            .append_query_results([vec![make_user("user3")]])
            .append_query_results([Vec::<registration::Model>::new()])
            .append_query_results([vec![make_archive("arch3")]])
            .append_exec_results([exec_ok(), exec_ok(), exec_ok(), exec_ok(), exec_ok()])
            .append_query_results([vec![make_log_row("log3", executed)]])
            .into_connection();

        let deleted = service(db).run_due_sweep().await.unwrap();
        assert_eq!(deleted, 2);
    }

    #[tokio::test]
    async fn failed_batch_rolls_back_and_records_the_failure() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![make_user("user1")]])
            .append_query_results([Vec::<registration::Model>::new()])
            .append_query_results([vec![make_archive("arch1")]])
            // admin-role delete succeeds, registration delete blows up
            .append_exec_results([exec_ok()])
            .append_exec_errors([DbErr::Exec(RuntimeErr::Internal(
                "deadlock detected".to_string(),
            ))])
            // failure audit entry
            .append_query_results([vec![make_log_row("log1", ActionType::ProfileDeletionFailed)]])
            .into_connection();

        let db = Arc::new(db);
        let svc = service_with(db.clone());

        let result = svc
            .delete_completely("user1", DeletionTrigger::Immediate, None)
            .await;
        assert!(matches!(result, Err(AppError::DeletionFailed(_))));

        drop(svc);
        let Ok(db) = Arc::try_unwrap(db) else {
            panic!("connection still shared");
        };
        let transactions = db.into_transaction_log();
        assert!(
            transactions
                .iter()
                .any(|t| format!("{t:?}").contains("profile_deletion_failed")),
            "no failure audit entry was written"
        );
    }
}
