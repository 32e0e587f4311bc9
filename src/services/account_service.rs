//! Domain service for account lifecycle.
//!
//! Handles registration, credential checks, password reset, and the account
//! deletion cascade. Session state is owned by the transport layer and never
//! touched here.

use serde::Serialize;
use thiserror::Error;

/// Errors specific to account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    /// Login failed and the username does not exist.
    #[error("Invalid username")]
    UnknownUsername,

    /// Login failed but the username exists.
    #[error("Invalid password")]
    WrongPassword,

    /// A unique constraint fired on the named field.
    #[error("{field} is already taken")]
    Duplicate { field: String },

    #[error("User not found")]
    NotFound,

    /// Reset token missing, mismatched, or already spent.
    #[error("Password reset rejected")]
    ResetRejected,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AccountError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AccountError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// User info DTO for responses. Never carries credential material.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub is_admin: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Input for registration. Field shape is validated at the transport
/// boundary before this reaches the service. Deliberately not `Debug`; it
/// carries a plaintext password.
#[derive(Clone)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Domain service trait for account lifecycle.
#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    /// Creates an account with a hashed password.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Duplicate`] when the store's uniqueness
    /// constraint on username or email fires at insert time. There is no
    /// existence pre-check; the constraint is the arbiter under concurrency.
    async fn register(&self, new: NewAccount) -> Result<UserInfo, AccountError>;

    /// Verifies credentials and returns the user.
    ///
    /// # Errors
    ///
    /// [`AccountError::UnknownUsername`] when the username does not exist,
    /// [`AccountError::WrongPassword`] when it does but the password is
    /// wrong. The split exists only for error messaging; both deny access.
    async fn login(&self, username: &str, password: &str) -> Result<UserInfo, AccountError>;

    /// Gets information for a specific user.
    async fn get_user(&self, username: &str) -> Result<UserInfo, AccountError>;

    /// Deletes a user and, first, every feedback entry they own.
    ///
    /// The two deletes are sequential; re-invoking after a partial failure
    /// re-runs the (now no-op) feedback phase and retries the user delete.
    async fn delete_user(&self, username: &str) -> Result<(), AccountError>;

    /// Issues a reset token for the account registered under `email`,
    /// persists it, and dispatches the token by mail.
    async fn request_password_reset(&self, email: &str) -> Result<(), AccountError>;

    /// Consumes a reset token: verifies it against the stored one, rehashes
    /// the password, and clears the token. Single-use.
    async fn confirm_password_reset(
        &self,
        email: &str,
        token: &str,
        new_password: &str,
    ) -> Result<(), AccountError>;

    /// Mails the username registered under `email`.
    async fn send_username_reminder(&self, email: &str) -> Result<(), AccountError>;
}
