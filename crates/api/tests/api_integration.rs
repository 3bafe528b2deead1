//! API integration tests over a mocked database.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware,
    Router,
};
use chrono::{TimeZone, Utc};
use gatherly_api::{middleware::AppState, router as api_router};
use gatherly_common::{Clock, FixedClock};
use gatherly_core::{
    ActivityLogService, DeletionService, EligibilityService, RegistrationService, UserService,
};
use gatherly_db::entities::{admin_role, event, registration, user};
use gatherly_db::repositories::{
    ActivityLogRepository, DeletionRepository, EventRepository, PendingDeletionRepository,
    RegistrationRepository, UserRepository,
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use tower::ServiceExt;

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

fn make_user(id: &str, blocked: bool) -> user::Model {
    user::Model {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        email_lower: format!("{id}@example.com"),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        password: "hash".to_string(),
        token: Some("token1".to_string()),
        is_blocked: blocked,
        created_at: now().into(),
        updated_at: None,
    }
}

/// Build the full app (router + auth middleware) over a mock connection.
fn make_app(db: DatabaseConnection) -> Router {
    let db = Arc::new(db);
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(now()));

    let user_repo = UserRepository::new(db.clone());
    let event_repo = EventRepository::new(db.clone());
    let registration_repo = RegistrationRepository::new(db.clone());

    let activity_log = ActivityLogService::new(ActivityLogRepository::new(db.clone()), clock.clone());
    let user_service = UserService::new(user_repo.clone(), activity_log.clone(), clock.clone());
    let registration_service = RegistrationService::new(
        registration_repo.clone(),
        event_repo.clone(),
        activity_log.clone(),
        clock.clone(),
    );
    let eligibility_service = EligibilityService::new(
        user_repo.clone(),
        registration_repo,
        event_repo,
        clock.clone(),
    );
    let deletion_service = DeletionService::new(
        DeletionRepository::new(db.clone()),
        PendingDeletionRepository::new(db),
        user_repo,
        eligibility_service.clone(),
        activity_log,
        clock,
    );

    let state = AppState {
        user_service,
        registration_service,
        eligibility_service,
        deletion_service,
    };

    Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gatherly_api::middleware::auth_middleware,
        ))
        .with_state(state)
}

#[tokio::test]
async fn eligibility_requires_authentication() {
    let app = make_app(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/account/deletion-eligibility")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn eligibility_succeeds_with_a_valid_token() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        // token resolution
        .append_query_results([vec![make_user("user1", false)]])
        // evaluation: user, registrations
        .append_query_results([vec![make_user("user1", false)]])
        .append_query_results([Vec::<registration::Model>::new()])
        .into_connection();

    let response = make_app(db)
        .oneshot(
            Request::builder()
                .uri("/api/account/deletion-eligibility")
                .header("Authorization", "Bearer token1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn blocked_account_token_is_rejected() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![make_user("user1", true)]])
        .into_connection();

    let response = make_app(db)
        .oneshot(
            Request::builder()
                .uri("/api/account/deletion-eligibility")
                .header("Authorization", "Bearer token1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Token resolution refuses blocked accounts, so the extractor sees no user
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn event_listing_is_public() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![event::Model {
            id: "event1".to_string(),
            title: "Summer Gala".to_string(),
            description: None,
            location: Some("Berlin".to_string()),
            date: (now() + chrono::Duration::days(7)).into(),
            created_at: now().into(),
        }]])
        .into_connection();

    let response = make_app(db)
        .oneshot(
            Request::builder()
                .uri("/api/events")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn admin_endpoints_refuse_regular_users() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        // token resolution
        .append_query_results([vec![make_user("user1", false)]])
        // admin role lookup comes back empty
        .append_query_results([Vec::<admin_role::Model>::new()])
        .into_connection();

    let response = make_app(db)
        .oneshot(
            Request::builder()
                .uri("/api/admin/pending-deletions")
                .header("Authorization", "Bearer token1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
