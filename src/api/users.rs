use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;
use tower_sessions::Session;

use super::session::{self, may_act};
use super::{ApiError, ApiResponse, AppState, MessageResponse, UserDto};

/// GET /users/{username}
/// View a user. Owner or admin.
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let identity = session::require_identity(&session).await?;
    may_act(Some(&identity), &username)?;

    let user = state.accounts().get_user(&username).await?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// DELETE /users/{username}
/// Delete a user and all their feedback. Owner or admin. A self-delete also
/// clears the acting session; an admin deleting someone else keeps theirs.
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let identity = session::require_identity(&session).await?;
    may_act(Some(&identity), &username)?;

    state.accounts().delete_user(&username).await?;

    if identity.username == username {
        session::clear(&session).await;
    }

    Ok(Json(ApiResponse::success(MessageResponse {
        message: format!("User '{username}' deleted"),
    })))
}
