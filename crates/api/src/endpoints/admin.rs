//! Admin endpoints.

use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use gatherly_common::{AppError, AppResult};
use gatherly_core::PendingDeletionEntry;
use gatherly_db::entities::user;
use serde::Serialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

async fn require_admin(state: &AppState, user: &user::Model) -> AppResult<()> {
    if state.user_service.is_admin(&user.id).await? {
        Ok(())
    } else {
        Err(AppError::Forbidden("Admin role required".to_string()))
    }
}

/// List every scheduled deletion, soonest first.
async fn pending_deletions(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<PendingDeletionEntry>>> {
    require_admin(&state, &user).await?;

    let entries = state.deletion_service.list_pending().await?;
    Ok(ApiResponse::ok(entries))
}

/// Sweep response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepResponse {
    pub deleted_count: u64,
}

/// Run the due-deletion sweep now.
///
/// The same sweep runs on a schedule in the server binary; this endpoint
/// exists so operators can trigger it on demand.
async fn run_sweep(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<SweepResponse>> {
    require_admin(&state, &user).await?;

    let deleted_count = state.deletion_service.run_due_sweep().await?;
    Ok(ApiResponse::ok(SweepResponse { deleted_count }))
}

/// Create the admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pending-deletions", get(pending_deletions))
        .route("/deletion-sweep", post(run_sweep))
}
