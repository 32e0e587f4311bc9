//! Domain service for feedback entries.
//!
//! Ownership checks live at the transport boundary where the session
//! identity is available; this service only knows about rows and owners.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("Feedback not found")]
    NotFound,

    #[error("User not found")]
    OwnerNotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for FeedbackError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for FeedbackError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Feedback DTO for responses.
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackInfo {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub username: String,
    pub created_at: String,
    pub updated_at: String,
}

#[async_trait::async_trait]
pub trait FeedbackService: Send + Sync {
    /// Lists feedback owned by a user, oldest first.
    async fn list_for_user(&self, username: &str) -> Result<Vec<FeedbackInfo>, FeedbackError>;

    /// Creates a feedback entry owned by `username`.
    ///
    /// # Errors
    ///
    /// Returns [`FeedbackError::OwnerNotFound`] when the owner does not
    /// exist; every entry has exactly one owning user at creation time.
    async fn add(
        &self,
        username: &str,
        title: &str,
        content: &str,
    ) -> Result<FeedbackInfo, FeedbackError>;

    /// Fetches a single entry.
    async fn get(&self, id: i32) -> Result<FeedbackInfo, FeedbackError>;

    /// Replaces title and content of an entry. Ownership never changes.
    async fn update(
        &self,
        id: i32,
        title: &str,
        content: &str,
    ) -> Result<FeedbackInfo, FeedbackError>;

    /// Deletes an entry.
    async fn delete(&self, id: i32) -> Result<(), FeedbackError>;
}
