use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::session::{self, may_act};
use super::validation;
use super::{ApiError, ApiResponse, AppState, FeedbackDto, MessageResponse};

#[derive(Deserialize)]
pub struct FeedbackRequest {
    pub title: String,
    pub content: String,
}

/// GET /users/{username}/feedback
/// List a user's feedback. Owner or admin.
pub async fn list_feedback(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<Vec<FeedbackDto>>>, ApiError> {
    let identity = session::require_identity(&session).await?;
    may_act(Some(&identity), &username)?;

    let entries = state.feedback().list_for_user(&username).await?;

    Ok(Json(ApiResponse::success(
        entries.into_iter().map(FeedbackDto::from).collect(),
    )))
}

/// POST /users/{username}/feedback
/// Create feedback owned by `{username}`. Owner or admin.
pub async fn add_feedback(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(username): Path<String>,
    Json(payload): Json<FeedbackRequest>,
) -> Result<Json<ApiResponse<FeedbackDto>>, ApiError> {
    let identity = session::require_identity(&session).await?;
    may_act(Some(&identity), &username)?;

    validation::validate_title(&payload.title)?;
    validation::validate_content(&payload.content)?;

    let entry = state
        .feedback()
        .add(&username, &payload.title, &payload.content)
        .await?;

    Ok(Json(ApiResponse::success(FeedbackDto::from(entry))))
}

/// PUT /feedback/{id}
/// Replace title/content of an entry. Feedback owner or admin; ownership is
/// resolved through the entry itself.
pub async fn update_feedback(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i32>,
    Json(payload): Json<FeedbackRequest>,
) -> Result<Json<ApiResponse<FeedbackDto>>, ApiError> {
    let identity = session::require_identity(&session).await?;

    let existing = state.feedback().get(id).await?;
    may_act(Some(&identity), &existing.username)?;

    validation::validate_title(&payload.title)?;
    validation::validate_content(&payload.content)?;

    let entry = state
        .feedback()
        .update(id, &payload.title, &payload.content)
        .await?;

    Ok(Json(ApiResponse::success(FeedbackDto::from(entry))))
}

/// DELETE /feedback/{id}
/// Delete an entry. Feedback owner or admin.
pub async fn delete_feedback(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let identity = session::require_identity(&session).await?;

    let existing = state.feedback().get(id).await?;
    may_act(Some(&identity), &existing.username)?;

    state.feedback().delete(id).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: format!("Feedback {id} deleted"),
    })))
}
