//! Event listing and registration endpoints.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use gatherly_common::AppResult;
use gatherly_core::RegistrationView;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, ClientIp},
    middleware::AppState,
    response::ApiResponse,
};

/// Pagination query.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    50
}

/// Public view of an event.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub date: DateTime<Utc>,
}

impl From<gatherly_db::entities::event::Model> for EventResponse {
    fn from(event: gatherly_db::entities::event::Model) -> Self {
        Self {
            id: event.id,
            title: event.title,
            description: event.description,
            location: event.location,
            date: event.date.with_timezone(&Utc),
        }
    }
}

/// List upcoming events, soonest first.
async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<EventResponse>>> {
    let events = state
        .registration_service
        .list_upcoming_events(query.limit.min(100), query.offset)
        .await?;

    Ok(ApiResponse::ok(
        events.into_iter().map(Into::into).collect(),
    ))
}

/// List the caller's active registrations.
async fn my_registrations(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<RegistrationView>>> {
    let registrations = state.registration_service.list_for_user(&user.id).await?;
    Ok(ApiResponse::ok(registrations))
}

/// Registration response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub registration_id: String,
    pub event_id: String,
}

/// Register the caller for an event.
async fn register_for_event(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Path(event_id): Path<String>,
) -> AppResult<ApiResponse<RegisterResponse>> {
    let registration = state
        .registration_service
        .register(&user.id, &event_id, ip.as_deref())
        .await?;

    Ok(ApiResponse::ok(RegisterResponse {
        registration_id: registration.id,
        event_id: registration.event_id,
    }))
}

/// Cancellation response.
#[derive(Serialize)]
pub struct CancelResponse {
    pub ok: bool,
}

/// Cancel the caller's registration for an event.
async fn cancel_registration(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Path(event_id): Path<String>,
) -> AppResult<ApiResponse<CancelResponse>> {
    state
        .registration_service
        .cancel(&user.id, &event_id, ip.as_deref())
        .await?;

    Ok(ApiResponse::ok(CancelResponse { ok: true }))
}

/// Create the events router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_events))
        .route("/mine", get(my_registrations))
        .route("/{id}/register", post(register_for_event))
        .route("/{id}/cancel", post(cancel_registration))
}
