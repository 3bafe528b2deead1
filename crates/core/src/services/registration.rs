//! Event registrations.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use gatherly_common::{AppError, AppResult, Clock, IdGenerator};
use gatherly_db::{
    entities::{activity_log::ActionType, event, registration},
    repositories::{EventRepository, RegistrationRepository},
};
use sea_orm::Set;
use serde::Serialize;
use serde_json::json;

use crate::services::ActivityLogService;

/// A registration joined with its event, for listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationView {
    pub registration_id: String,
    pub event_id: String,
    pub title: String,
    pub date: DateTime<Utc>,
    pub registered_at: DateTime<Utc>,
}

/// Event registration service.
#[derive(Clone)]
pub struct RegistrationService {
    registration_repo: RegistrationRepository,
    event_repo: EventRepository,
    activity_log: ActivityLogService,
    clock: Arc<dyn Clock>,
    id_gen: IdGenerator,
}

impl RegistrationService {
    /// Create a new registration service.
    pub fn new(
        registration_repo: RegistrationRepository,
        event_repo: EventRepository,
        activity_log: ActivityLogService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registration_repo,
            event_repo,
            activity_log,
            clock,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a user for an event.
    ///
    /// One registration per user and event; a previously cancelled one is
    /// reactivated instead of inserting a second row.
    pub async fn register(
        &self,
        user_id: &str,
        event_id: &str,
        ip_address: Option<&str>,
    ) -> AppResult<registration::Model> {
        let event = self.event_repo.get_by_id(event_id).await?;
        let now = self.clock.now();

        if event.date.with_timezone(&Utc) <= now {
            return Err(AppError::BadRequest(
                "This event has already taken place".to_string(),
            ));
        }

        let existing = self
            .registration_repo
            .find_by_user_and_event(user_id, event_id)
            .await?;

        let registration = match existing {
            Some(r) if r.cancelled_at.is_none() => {
                return Err(AppError::Conflict(
                    "Already registered for this event".to_string(),
                ));
            }
            Some(r) => {
                let mut active: registration::ActiveModel = r.into();
                active.cancelled_at = Set(None);
                self.registration_repo.update(active).await?
            }
            None => {
                let model = registration::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    user_id: Set(user_id.to_string()),
                    event_id: Set(event_id.to_string()),
                    cancelled_at: Set(None),
                    created_at: Set(now.into()),
                };
                self.registration_repo.create(model).await?
            }
        };

        self.activity_log
            .log(
                Some(user_id),
                ActionType::EventRegistered,
                Some(json!({ "eventId": event_id, "title": event.title })),
                ip_address,
            )
            .await;

        Ok(registration)
    }

    /// Cancel a user's registration for an event.
    pub async fn cancel(
        &self,
        user_id: &str,
        event_id: &str,
        ip_address: Option<&str>,
    ) -> AppResult<()> {
        let registration = self
            .registration_repo
            .find_by_user_and_event(user_id, event_id)
            .await?
            .filter(|r| r.cancelled_at.is_none())
            .ok_or_else(|| {
                AppError::NotFound("No active registration for this event".to_string())
            })?;

        let mut active: registration::ActiveModel = registration.into();
        active.cancelled_at = Set(Some(self.clock.now().into()));
        self.registration_repo.update(active).await?;

        self.activity_log
            .log(
                Some(user_id),
                ActionType::EventRegistrationCancelled,
                Some(json!({ "eventId": event_id })),
                ip_address,
            )
            .await;

        Ok(())
    }

    /// List a user's active registrations with their events, oldest first.
    pub async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<RegistrationView>> {
        let registrations = self.registration_repo.find_active_by_user(user_id).await?;
        let event_ids: Vec<String> = registrations.iter().map(|r| r.event_id.clone()).collect();
        let events = self.event_repo.find_by_ids(&event_ids).await?;

        let views = registrations
            .into_iter()
            .filter_map(|r| {
                let event = events.iter().find(|e| e.id == r.event_id)?;
                Some(RegistrationView {
                    registration_id: r.id,
                    event_id: event.id.clone(),
                    title: event.title.clone(),
                    date: event.date.with_timezone(&Utc),
                    registered_at: r.created_at.with_timezone(&Utc),
                })
            })
            .collect();

        Ok(views)
    }

    /// List upcoming events.
    pub async fn list_upcoming_events(
        &self,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<event::Model>> {
        self.event_repo
            .find_upcoming(self.clock.now(), limit, offset)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use gatherly_common::FixedClock;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn make_event(date: DateTime<Utc>) -> event::Model {
        event::Model {
            id: "event1".to_string(),
            title: "Summer Gala".to_string(),
            description: None,
            location: None,
            date: date.into(),
            created_at: now().into(),
        }
    }

    fn make_registration(cancelled: bool) -> registration::Model {
        registration::Model {
            id: "reg1".to_string(),
            user_id: "user1".to_string(),
            event_id: "event1".to_string(),
            cancelled_at: cancelled.then(|| now().into()),
            created_at: now().into(),
        }
    }

    fn service(db: sea_orm::DatabaseConnection) -> RegistrationService {
        let db = Arc::new(db);
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(now()));
        let activity_log = ActivityLogService::new(
            gatherly_db::repositories::ActivityLogRepository::new(db.clone()),
            clock.clone(),
        );
        RegistrationService::new(
            RegistrationRepository::new(db.clone()),
            EventRepository::new(db),
            activity_log,
            clock,
        )
    }

    #[tokio::test]
    async fn cannot_register_for_a_past_event() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![make_event(now() - Duration::days(1))]])
            .into_connection();

        let result = service(db).register("user1", "event1", None).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![make_event(now() + Duration::days(7))]])
            .append_query_results([vec![make_registration(false)]])
            .into_connection();

        let result = service(db).register("user1", "event1", None).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn cancelling_without_an_active_registration_fails() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![make_registration(true)]])
            .into_connection();

        let result = service(db).cancel("user1", "event1", None).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
