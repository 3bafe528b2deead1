//! API endpoints.

mod account;
mod admin;
mod auth;
mod events;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/events", events::router())
        .nest("/account", account::router())
        .nest("/admin", admin::router())
}
