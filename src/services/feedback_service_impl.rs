//! `SeaORM` implementation of the `FeedbackService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::{FeedbackEntry, Store};
use crate::services::feedback_service::{FeedbackError, FeedbackInfo, FeedbackService};

pub struct SeaOrmFeedbackService {
    store: Store,
}

impl SeaOrmFeedbackService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    fn info(entry: FeedbackEntry) -> FeedbackInfo {
        FeedbackInfo {
            id: entry.id,
            title: entry.title,
            content: entry.content,
            username: entry.username,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}

#[async_trait]
impl FeedbackService for SeaOrmFeedbackService {
    async fn list_for_user(&self, username: &str) -> Result<Vec<FeedbackInfo>, FeedbackError> {
        if self
            .store
            .get_user_by_username(username)
            .await?
            .is_none()
        {
            return Err(FeedbackError::OwnerNotFound);
        }

        let rows = self.store.list_feedback_for_user(username).await?;
        Ok(rows.into_iter().map(Self::info).collect())
    }

    async fn add(
        &self,
        username: &str,
        title: &str,
        content: &str,
    ) -> Result<FeedbackInfo, FeedbackError> {
        if self
            .store
            .get_user_by_username(username)
            .await?
            .is_none()
        {
            return Err(FeedbackError::OwnerNotFound);
        }

        let entry = self.store.add_feedback(username, title, content).await?;
        info!("Added feedback {} for {username}", entry.id);
        Ok(Self::info(entry))
    }

    async fn get(&self, id: i32) -> Result<FeedbackInfo, FeedbackError> {
        let entry = self
            .store
            .get_feedback(id)
            .await?
            .ok_or(FeedbackError::NotFound)?;

        Ok(Self::info(entry))
    }

    async fn update(
        &self,
        id: i32,
        title: &str,
        content: &str,
    ) -> Result<FeedbackInfo, FeedbackError> {
        let entry = self
            .store
            .update_feedback(id, title, content)
            .await?
            .ok_or(FeedbackError::NotFound)?;

        info!("Updated feedback {id}");
        Ok(Self::info(entry))
    }

    async fn delete(&self, id: i32) -> Result<(), FeedbackError> {
        if !self.store.delete_feedback(id).await? {
            return Err(FeedbackError::NotFound);
        }

        info!("Deleted feedback {id}");
        Ok(())
    }
}
