use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;

pub mod migrator;
pub mod repositories;

pub use repositories::feedback::FeedbackEntry;
pub use repositories::user::{NewUser, User, generate_reset_token};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.trim_start_matches("sqlite:").starts_with(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn feedback_repo(&self) -> repositories::feedback::FeedbackRepository {
        repositories::feedback::FeedbackRepository::new(self.conn.clone())
    }

    /// Insert a user. Surfaces the raw [`DbErr`] so the caller can map
    /// unique-constraint violations on username/email to field errors.
    pub async fn insert_user(&self, new: NewUser, config: &SecurityConfig) -> Result<User, DbErr> {
        self.user_repo().insert(new, config).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn authenticate_user(&self, username: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().authenticate(username, password).await
    }

    pub async fn set_password_reset_token(&self, username: &str, token: &str) -> Result<()> {
        self.user_repo().set_reset_token(username, token).await
    }

    pub async fn get_password_reset_token(&self, username: &str) -> Result<Option<String>> {
        self.user_repo().get_reset_token(username).await
    }

    pub async fn update_user_password(
        &self,
        username: &str,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<()> {
        self.user_repo()
            .update_password(username, new_password, config)
            .await
    }

    pub async fn delete_user(&self, username: &str) -> Result<bool> {
        self.user_repo().delete(username).await
    }

    pub async fn add_feedback(
        &self,
        username: &str,
        title: &str,
        content: &str,
    ) -> Result<FeedbackEntry> {
        self.feedback_repo().add(username, title, content).await
    }

    pub async fn get_feedback(&self, id: i32) -> Result<Option<FeedbackEntry>> {
        self.feedback_repo().get(id).await
    }

    pub async fn list_feedback_for_user(&self, username: &str) -> Result<Vec<FeedbackEntry>> {
        self.feedback_repo().list_for_user(username).await
    }

    pub async fn update_feedback(
        &self,
        id: i32,
        title: &str,
        content: &str,
    ) -> Result<Option<FeedbackEntry>> {
        self.feedback_repo().update(id, title, content).await
    }

    pub async fn delete_feedback(&self, id: i32) -> Result<bool> {
        self.feedback_repo().delete(id).await
    }

    pub async fn delete_all_feedback_for_user(&self, username: &str) -> Result<u64> {
        self.feedback_repo().delete_all_for_user(username).await
    }
}
