//! Deletion eligibility evaluation.
//!
//! An account can only be deleted once the user is 28 days past their
//! anchor event. The anchor is the earliest upcoming event the user is
//! registered for, or, failing that, the most recent past one. Users with
//! no active registrations are deletable immediately.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use gatherly_common::{AppResult, Clock};
use gatherly_db::{
    entities::event,
    repositories::{EventRepository, RegistrationRepository, UserRepository},
};
use serde::Serialize;

/// Days that must elapse after the anchor event before deletion is allowed.
pub const RETENTION_DAYS: i64 = 28;

/// Result of an eligibility evaluation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Eligibility {
    /// Whether the account can be deleted right now.
    pub can_delete: bool,
    /// Human-readable explanation when deletion is deferred.
    pub reason: Option<String>,
    /// Earliest instant at which deletion becomes possible.
    pub delete_date: Option<DateTime<Utc>>,
}

/// Evaluates whether an account may be deleted now.
#[derive(Clone)]
pub struct EligibilityService {
    user_repo: UserRepository,
    registration_repo: RegistrationRepository,
    event_repo: EventRepository,
    clock: Arc<dyn Clock>,
}

impl EligibilityService {
    /// Create a new eligibility service.
    pub fn new(
        user_repo: UserRepository,
        registration_repo: RegistrationRepository,
        event_repo: EventRepository,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            user_repo,
            registration_repo,
            event_repo,
            clock,
        }
    }

    /// Evaluate deletion eligibility for a user.
    ///
    /// Read-only: evaluation never changes state, so two successive calls
    /// with the same clock see the same answer.
    pub async fn evaluate(&self, user_id: &str) -> AppResult<Eligibility> {
        self.user_repo.get_by_id(user_id).await?;
        let anchor = self.anchor_event(user_id).await?;
        Ok(evaluate_anchor(anchor.as_ref(), self.clock.now()))
    }

    /// The event anchoring the user's retention window, if any.
    pub async fn anchor_event(&self, user_id: &str) -> AppResult<Option<event::Model>> {
        let registrations = self.registration_repo.find_active_by_user(user_id).await?;
        let event_ids: Vec<String> = registrations
            .into_iter()
            .map(|r| r.event_id)
            .collect();
        let events = self.event_repo.find_by_ids(&event_ids).await?;
        Ok(select_anchor(events, self.clock.now()))
    }
}

/// Pick the anchor event: earliest upcoming, else latest past.
fn select_anchor(events: Vec<event::Model>, now: DateTime<Utc>) -> Option<event::Model> {
    let (upcoming, past): (Vec<_>, Vec<_>) = events
        .into_iter()
        .partition(|e| e.date.with_timezone(&Utc) > now);

    upcoming
        .into_iter()
        .min_by_key(|e| e.date)
        .or_else(|| past.into_iter().max_by_key(|e| e.date))
}

/// Apply the retention rule to the anchor event.
fn evaluate_anchor(anchor: Option<&event::Model>, now: DateTime<Utc>) -> Eligibility {
    let Some(event) = anchor else {
        return Eligibility {
            can_delete: true,
            reason: None,
            delete_date: None,
        };
    };

    let event_date = event.date.with_timezone(&Utc);
    let unlock_date = event_date + Duration::days(RETENTION_DAYS);

    if now >= unlock_date {
        return Eligibility {
            can_delete: true,
            reason: None,
            delete_date: None,
        };
    }

    let reason = if event_date > now {
        format!(
            "You are registered for '{}' on {}. Your account can be deleted {} days after the event, from {}.",
            event.title,
            event_date.format("%Y-%m-%d"),
            RETENTION_DAYS,
            unlock_date.format("%Y-%m-%d"),
        )
    } else {
        format!(
            "Your most recent event '{}' took place on {}. Your account can be deleted from {}.",
            event.title,
            event_date.format("%Y-%m-%d"),
            unlock_date.format("%Y-%m-%d"),
        )
    };

    Eligibility {
        can_delete: false,
        reason: Some(reason),
        delete_date: Some(unlock_date),
    }
}
