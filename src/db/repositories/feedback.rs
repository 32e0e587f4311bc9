use crate::entities::{feedback, prelude::*};
use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

/// Feedback row as surfaced to services
#[derive(Debug, Clone)]
pub struct FeedbackEntry {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub username: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Repository for feedback operations
pub struct FeedbackRepository {
    conn: DatabaseConnection,
}

impl FeedbackRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(m: feedback::Model) -> FeedbackEntry {
        FeedbackEntry {
            id: m.id,
            title: m.title,
            content: m.content,
            username: m.username,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }

    pub async fn add(&self, username: &str, title: &str, content: &str) -> Result<FeedbackEntry> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = feedback::ActiveModel {
            title: Set(title.to_string()),
            content: Set(content.to_string()),
            username: Set(username.to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active.insert(&self.conn).await?;
        Ok(Self::map_model(model))
    }

    pub async fn get(&self, id: i32) -> Result<Option<FeedbackEntry>> {
        let result = Feedback::find_by_id(id).one(&self.conn).await?;
        Ok(result.map(Self::map_model))
    }

    pub async fn list_for_user(&self, username: &str) -> Result<Vec<FeedbackEntry>> {
        let rows = Feedback::find()
            .filter(feedback::Column::Username.eq(username))
            .order_by_asc(feedback::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    /// Update title and content. Returns the new row, or None if the id is
    /// unknown.
    pub async fn update(
        &self,
        id: i32,
        title: &str,
        content: &str,
    ) -> Result<Option<FeedbackEntry>> {
        let Some(existing) = Feedback::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let now = chrono::Utc::now().to_rfc3339();

        let mut active: feedback::ActiveModel = existing.into();
        active.title = Set(title.to_string());
        active.content = Set(content.to_string());
        active.updated_at = Set(now);
        let model = active.update(&self.conn).await?;

        Ok(Some(Self::map_model(model)))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let res = Feedback::delete_by_id(id).exec(&self.conn).await?;
        Ok(res.rows_affected > 0)
    }

    /// Remove every feedback row owned by the user. First phase of the
    /// account deletion cascade; a retry against zero remaining rows is a
    /// no-op.
    pub async fn delete_all_for_user(&self, username: &str) -> Result<u64> {
        let res = Feedback::delete_many()
            .filter(feedback::Column::Username.eq(username))
            .exec(&self.conn)
            .await?;

        Ok(res.rows_affected)
    }
}
