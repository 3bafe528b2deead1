//! API middleware.

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use gatherly_core::{DeletionService, EligibilityService, RegistrationService, UserService};

/// Application state shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub registration_service: RegistrationService,
    pub eligibility_service: EligibilityService,
    pub deletion_service: DeletionService,
}

/// Authentication middleware.
///
/// Resolves a `Bearer` token to its user and stashes the model in request
/// extensions for the [`crate::extractors::AuthUser`] extractor. Blocked
/// accounts fail token resolution, so a user with a scheduled deletion is
/// treated as unauthenticated everywhere.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
        && let Ok(user) = state.user_service.authenticate_by_token(token).await
    {
        req.extensions_mut().insert(user);
    }

    next.run(req).await
}
