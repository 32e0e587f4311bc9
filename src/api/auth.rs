use axum::{Json, extract::State};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::session::{self, SessionIdentity};
use super::validation;
use super::{ApiError, ApiResponse, AppState, MessageResponse, UserDto};
use crate::services::NewAccount;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub password_confirm: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct PasswordResetConfirmRequest {
    pub email: String,
    pub token: String,
    pub password: String,
    pub password_confirm: String,
}

#[derive(Deserialize)]
pub struct UsernameReminderRequest {
    pub email: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
/// Create an account and establish a session for it. Anonymous only.
pub async fn register(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    session::require_anonymous(&session).await?;

    validation::validate_username(&payload.username)?;
    validation::validate_password(&payload.password)?;
    validation::validate_confirmation(&payload.password, &payload.password_confirm)?;
    validation::validate_email(&payload.email)?;
    validation::validate_name("first_name", &payload.first_name)?;
    validation::validate_name("last_name", &payload.last_name)?;

    let user = state
        .accounts()
        .register(NewAccount {
            username: payload.username,
            password: payload.password,
            email: payload.email,
            first_name: payload.first_name,
            last_name: payload.last_name,
        })
        .await?;

    session::establish(
        &session,
        &SessionIdentity {
            username: user.username.clone(),
            is_admin: user.is_admin,
        },
    )
    .await?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// POST /auth/login
/// Authenticate with username and password. Anonymous only.
///
/// Failure messages distinguish unknown username from wrong password; a
/// deliberate usability trade-off against enumeration resistance.
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    session::require_anonymous(&session).await?;

    if payload.username.is_empty() {
        return Err(ApiError::validation("username", "Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("password", "Password is required"));
    }

    let user = state
        .accounts()
        .login(&payload.username, &payload.password)
        .await?;

    session::establish(
        &session,
        &SessionIdentity {
            username: user.username.clone(),
            is_admin: user.is_admin,
        },
    )
    .await?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// POST /auth/logout
/// Invalidate the current session
pub async fn logout(session: Session) -> Json<ApiResponse<MessageResponse>> {
    session::clear(&session).await;
    Json(ApiResponse::success(MessageResponse {
        message: "Logged out".to_string(),
    }))
}

/// POST /auth/password-reset
/// Issue a reset token for the given address and mail it out. Anonymous only.
pub async fn request_password_reset(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<PasswordResetRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    session::require_anonymous(&session).await?;
    validation::validate_email(&payload.email)?;

    state
        .accounts()
        .request_password_reset(&payload.email)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Password reset mail sent".to_string(),
    })))
}

/// POST /auth/password-reset/confirm
/// Trade an emailed token for a new password. Anonymous only; the token is
/// spent on success.
pub async fn confirm_password_reset(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<PasswordResetConfirmRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    session::require_anonymous(&session).await?;

    validation::validate_email(&payload.email)?;
    validation::validate_password(&payload.password)?;
    validation::validate_confirmation(&payload.password, &payload.password_confirm)?;

    if payload.token.is_empty() {
        return Err(ApiError::validation("token", "Reset token is required"));
    }

    state
        .accounts()
        .confirm_password_reset(&payload.email, &payload.token, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Password updated, you can now log in".to_string(),
    })))
}

/// POST /auth/username-reminder
/// Mail the username registered for an address. Anonymous only.
pub async fn username_reminder(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<UsernameReminderRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    session::require_anonymous(&session).await?;
    validation::validate_email(&payload.email)?;

    state
        .accounts()
        .send_username_reminder(&payload.email)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Username reminder mail sent".to_string(),
    })))
}
