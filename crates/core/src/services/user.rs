//! User accounts: registration, authentication, profile updates.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use gatherly_common::{AppError, AppResult, Clock, IdGenerator};
use gatherly_db::{
    entities::{activity_log::ActionType, user},
    repositories::UserRepository,
};
use sea_orm::Set;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::services::ActivityLogService;

/// Input for creating an account.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(length(min = 8, max = 200))]
    pub password: String,
}

/// Input for updating profile fields.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileInput {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
}

/// User account service.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    activity_log: ActivityLogService,
    clock: Arc<dyn Clock>,
    id_gen: IdGenerator,
}

impl UserService {
    /// Create a new user service.
    pub fn new(
        user_repo: UserRepository,
        activity_log: ActivityLogService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            user_repo,
            activity_log,
            clock,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new account.
    pub async fn register(
        &self,
        input: RegisterInput,
        ip_address: Option<&str>,
    ) -> AppResult<user::Model> {
        input.validate()?;

        if self.user_repo.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::Conflict(
                "An account with this email already exists".to_string(),
            ));
        }

        let now = self.clock.now();
        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            email: Set(input.email.clone()),
            email_lower: Set(input.email.to_lowercase()),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            password: Set(hash_password(&input.password)?),
            token: Set(None),
            is_blocked: Set(false),
            created_at: Set(now.into()),
            updated_at: Set(None),
        };
        let user = self.user_repo.create(model).await?;

        self.activity_log
            .log(Some(&user.id), ActionType::Registered, None, ip_address)
            .await;

        tracing::info!(user_id = %user.id, "User registered");

        Ok(user)
    }

    /// Authenticate with email and password, issuing a session token.
    ///
    /// Blocked accounts are refused even with correct credentials.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
        ip_address: Option<&str>,
    ) -> AppResult<(user::Model, String)> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &user.password)? {
            return Err(AppError::Unauthorized);
        }

        if user.is_blocked {
            return Err(AppError::Forbidden(
                "Account is blocked pending deletion".to_string(),
            ));
        }

        let token = self.id_gen.generate_token();
        self.user_repo.set_token(&user.id, Some(&token)).await?;

        self.activity_log
            .log(Some(&user.id), ActionType::Login, None, ip_address)
            .await;

        Ok((user, token))
    }

    /// Check email and password without issuing a token.
    ///
    /// Blocked accounts pass: this is the path a user takes to cancel
    /// their own scheduled deletion, which is exactly when they are
    /// blocked.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &user.password)? {
            return Err(AppError::Unauthorized);
        }

        Ok(user)
    }

    /// Resolve a session token to its user.
    ///
    /// Blocked accounts are refused, which is what locks out a user whose
    /// deletion is scheduled.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if user.is_blocked {
            return Err(AppError::Forbidden(
                "Account is blocked pending deletion".to_string(),
            ));
        }

        Ok(user)
    }

    /// Invalidate a user's session token.
    pub async fn logout(&self, user_id: &str) -> AppResult<()> {
        self.user_repo.set_token(user_id, None).await
    }

    /// Update profile fields.
    pub async fn update_profile(
        &self,
        user_id: &str,
        input: UpdateProfileInput,
        ip_address: Option<&str>,
    ) -> AppResult<user::Model> {
        input.validate()?;

        let user = self.user_repo.get_by_id(user_id).await?;
        let mut active: user::ActiveModel = user.into();
        if let Some(first_name) = input.first_name {
            active.first_name = Set(first_name);
        }
        if let Some(last_name) = input.last_name {
            active.last_name = Set(last_name);
        }
        active.updated_at = Set(Some(self.clock.now().into()));
        let updated = self.user_repo.update(active).await?;

        self.activity_log
            .log(
                Some(user_id),
                ActionType::ProfileUpdated,
                Some(json!({ "fields": ["firstName", "lastName"] })),
                ip_address,
            )
            .await;

        Ok(updated)
    }

    /// Whether the user holds an admin role grant.
    pub async fn is_admin(&self, user_id: &str) -> AppResult<bool> {
        self.user_repo.is_admin(user_id).await
    }
}

/// Hash a password with argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a stored hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
