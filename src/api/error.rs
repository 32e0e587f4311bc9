use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::{AccountError, FeedbackError};

#[derive(Debug)]
pub enum ApiError {
    /// No session on a protected action, or a credential check failed.
    Unauthenticated(String),

    /// Session present but the authorization policy denies the action.
    /// Kept separate from [`ApiError::Unauthenticated`] all the way to the
    /// status code.
    Forbidden(String),

    NotFound(String),

    /// Field-level input failure, user-correctable.
    ValidationError { field: String, message: String },

    /// A store uniqueness constraint fired on the named field.
    DuplicateKey { field: String },

    Conflict(String),

    DatabaseError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthenticated(msg) => write!(f, "Unauthenticated: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ValidationError { field, message } => {
                write!(f, "Validation error on {}: {}", field, message)
            }
            ApiError::DuplicateKey { field } => write!(f, "Duplicate {}", field),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, field, error_message) = match self {
            ApiError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, None, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, None, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, None, msg),
            ApiError::ValidationError { field, message } => {
                (StatusCode::BAD_REQUEST, Some(field), message)
            }
            ApiError::DuplicateKey { field } => {
                let message = format!("{field} is already taken");
                (StatusCode::CONFLICT, Some(field), message)
            }
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, None, msg),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    None,
                    "A database error occurred, please retry".to_string(),
                )
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    None,
                    "An internal error occurred, please retry".to_string(),
                )
            }
        };

        let mut body = ApiResponse::<()>::error(error_message);
        body.field = field;
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::UnknownUsername => ApiError::Unauthenticated("Invalid username".to_string()),
            AccountError::WrongPassword => ApiError::Unauthenticated("Invalid password".to_string()),
            AccountError::Duplicate { field } => ApiError::DuplicateKey { field },
            AccountError::NotFound => ApiError::NotFound("User not found".to_string()),
            AccountError::ResetRejected => {
                ApiError::Unauthenticated("Password reset rejected".to_string())
            }
            AccountError::Database(msg) => ApiError::DatabaseError(msg),
            AccountError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<FeedbackError> for ApiError {
    fn from(err: FeedbackError) -> Self {
        match err {
            FeedbackError::NotFound => ApiError::NotFound("Feedback not found".to_string()),
            FeedbackError::OwnerNotFound => ApiError::NotFound("User not found".to_string()),
            FeedbackError::Database(msg) => ApiError::DatabaseError(msg),
            FeedbackError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl ApiError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        ApiError::ValidationError {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        ApiError::Unauthenticated(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ApiError::Forbidden(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }
}
