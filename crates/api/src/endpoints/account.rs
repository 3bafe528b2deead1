//! Account endpoints: profile and the deletion lifecycle.

use axum::{
    extract::State,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use gatherly_common::AppResult;
use gatherly_core::{Eligibility, UpdateProfileInput};
use serde::Serialize;

use crate::{
    endpoints::auth::UserResponse,
    extractors::{AuthUser, ClientIp},
    middleware::AppState,
    response::ApiResponse,
};

/// Check whether the caller's account can be deleted right now.
async fn deletion_eligibility(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Eligibility>> {
    let eligibility = state.eligibility_service.evaluate(&user.id).await?;
    Ok(ApiResponse::ok(eligibility))
}

/// Deletion request response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    /// Whether the account was removed immediately.
    pub immediate: bool,
    /// When the deferred deletion will run, if it was deferred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletion_date: Option<DateTime<Utc>>,
}

/// Request deletion of the caller's account.
///
/// Eligible accounts are removed on the spot; otherwise the deletion is
/// scheduled for the end of the retention window and the account is
/// blocked until the sweep runs or the request is cancelled.
async fn request_deletion(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
) -> AppResult<ApiResponse<DeleteResponse>> {
    let outcome = state
        .deletion_service
        .request_deletion(&user.id, ip.as_deref())
        .await?;

    Ok(ApiResponse::ok(DeleteResponse {
        immediate: outcome.immediate,
        deletion_date: outcome.deletion_date,
    }))
}

/// Cancellation request.
///
/// Credentials instead of a bearer token: a scheduled deletion blocks the
/// account, so token resolution fails exactly when the user wants to back
/// out.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelDeletionRequest {
    pub email: String,
    pub password: String,
}

/// Cancellation response.
#[derive(Serialize)]
pub struct CancelDeletionResponse {
    pub ok: bool,
}

/// Cancel a scheduled deletion and unblock the account.
async fn cancel_deletion(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(req): Json<CancelDeletionRequest>,
) -> AppResult<ApiResponse<CancelDeletionResponse>> {
    let user = state
        .user_service
        .verify_credentials(&req.email, &req.password)
        .await?;

    state
        .deletion_service
        .cancel(&user.id, ip.as_deref())
        .await?;

    Ok(ApiResponse::ok(CancelDeletionResponse { ok: true }))
}

/// Update the caller's profile fields.
async fn update_profile(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(req): Json<UpdateProfileInput>,
) -> AppResult<ApiResponse<UserResponse>> {
    let updated = state
        .user_service
        .update_profile(&user.id, req, ip.as_deref())
        .await?;

    Ok(ApiResponse::ok(updated.into()))
}

/// Create the account router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/deletion-eligibility", get(deletion_eligibility))
        .route("/delete", post(request_deletion))
        .route("/delete/cancel", post(cancel_deletion))
        .route("/profile", patch(update_profile))
}
