//! Signup, login and profiles.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use validator::Validate;

use shop_core::{Account, AccountType, NewAccount};

use super::{not_blank, TokenRequest};
use crate::auth::{self, AuthError};
use crate::db::AccountRepository;
use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(max = 100), custom = "not_blank")]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    /// `admin` or `user`; anything else registers a user
    #[serde(rename = "type", default)]
    pub account_type: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: Account,
}

#[derive(Debug, Serialize)]
pub struct ProfilesResponse {
    pub profiles: Vec<Account>,
}

/// Argon2 is CPU-bound; keep it off the async workers
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, AuthError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("password task failed: {}", e)))?
        .map_err(ApiError::from)
}

/// Register an account
#[instrument(skip(state, request), fields(email = %request.email))]
pub async fn signup(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<SignupRequest>,
) -> Result<StatusCode, ApiError> {
    request.validate()?;

    let account_type = request
        .account_type
        .as_deref()
        .map(AccountType::from_signup)
        .unwrap_or(AccountType::User);

    if account_type.is_admin() && !state.config.allow_admin_signup {
        return Err(AuthError::AdminSignupDisabled.into());
    }

    let password = request.password;
    let password_hash = blocking(move || auth::hash_password(&password)).await?;

    let account = AccountRepository::new(&state.pool)
        .create(&NewAccount {
            name: request.name.trim().to_string(),
            email: request.email.trim().to_lowercase(),
            password_hash,
            account_type,
        })
        .await?;

    info!("Registered account {} ({})", account.id, account.account_type);
    Ok(StatusCode::OK)
}

/// Exchange email and password for a session token
#[instrument(skip(state, request), fields(email = %request.email))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    request.validate()?;

    let (account, password_hash) = AccountRepository::new(&state.pool)
        .get_credentials(request.email.trim())
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let password = request.password;
    blocking(move || auth::verify_password(&password, &password_hash)).await?;

    let token = state.tokens.issue(&account)?;
    Ok(Json(LoginResponse { token }))
}

/// Profile of the token's account
#[instrument(skip_all)]
pub async fn profile(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<TokenRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let claims = state.authenticate(request.token.as_deref())?;

    // token outlived its account
    let profile = AccountRepository::new(&state.pool)
        .get_by_id(claims.account_id())
        .await?
        .ok_or(AuthError::InvalidToken)?;

    Ok(Json(ProfileResponse { profile }))
}

/// Every account's profile (admin only)
#[instrument(skip_all)]
pub async fn profiles(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<TokenRequest>,
) -> Result<Json<ProfilesResponse>, ApiError> {
    let claims = state.authenticate(request.token.as_deref())?;
    claims.require_admin("list profiles")?;

    let profiles = AccountRepository::new(&state.pool).list().await?;
    Ok(Json(ProfilesResponse { profiles }))
}
