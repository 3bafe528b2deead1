//! Authentication endpoints.

use axum::{extract::State, routing::post, Json, Router};
use gatherly_common::AppResult;
use gatherly_core::RegisterInput;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, ClientIp},
    middleware::AppState,
    response::ApiResponse,
};

/// Public view of a user account.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<gatherly_db::entities::user::Model> for UserResponse {
    fn from(user: gatherly_db::entities::user::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

/// Create a new account.
async fn register(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(req): Json<RegisterInput>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.register(req, ip.as_deref()).await?;
    Ok(ApiResponse::ok(user.into()))
}

/// Login request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Sign in with email and password.
async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(req): Json<LoginRequest>,
) -> AppResult<ApiResponse<LoginResponse>> {
    let (user, token) = state
        .user_service
        .authenticate(&req.email, &req.password, ip.as_deref())
        .await?;

    Ok(ApiResponse::ok(LoginResponse {
        token,
        user: user.into(),
    }))
}

/// Logout response.
#[derive(Serialize)]
pub struct LogoutResponse {
    pub ok: bool,
}

/// Invalidate the current session token.
async fn logout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<LogoutResponse>> {
    state.user_service.logout(&user.id).await?;
    Ok(ApiResponse::ok(LogoutResponse { ok: true }))
}

/// Create the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}
