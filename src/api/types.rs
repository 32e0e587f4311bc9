use serde::Serialize;

use crate::services::{FeedbackInfo, UserInfo};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Form field the error belongs to, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            field: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            field: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub is_admin: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<UserInfo> for UserDto {
    fn from(info: UserInfo) -> Self {
        Self {
            username: info.username,
            email: info.email,
            first_name: info.first_name,
            last_name: info.last_name,
            full_name: info.full_name,
            is_admin: info.is_admin,
            created_at: info.created_at,
            updated_at: info.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FeedbackDto {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub username: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<FeedbackInfo> for FeedbackDto {
    fn from(info: FeedbackInfo) -> Self {
        Self {
            id: info.id,
            title: info.title,
            content: info.content,
            username: info.username,
            created_at: info.created_at,
            updated_at: info.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
