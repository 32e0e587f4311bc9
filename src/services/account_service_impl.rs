//! `SeaORM` implementation of the `AccountService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::SqlErr;
use tracing::{info, warn};

use crate::config::{MailConfig, SecurityConfig};
use crate::db::{NewUser, Store, User, generate_reset_token};
use crate::services::account_service::{AccountError, AccountService, NewAccount, UserInfo};
use crate::services::mailer::Mailer;

pub struct SeaOrmAccountService {
    store: Store,
    mailer: Arc<dyn Mailer>,
    security: SecurityConfig,
    mail: MailConfig,
}

impl SeaOrmAccountService {
    #[must_use]
    pub fn new(
        store: Store,
        mailer: Arc<dyn Mailer>,
        security: SecurityConfig,
        mail: MailConfig,
    ) -> Self {
        Self {
            store,
            mailer,
            security,
            mail,
        }
    }

    fn user_info(user: User) -> UserInfo {
        UserInfo {
            full_name: user.full_name(),
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            is_admin: user.is_admin,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }

    /// Map a unique-constraint violation to the field that fired, so the
    /// transport layer can attach the error to the right form field.
    fn duplicate_field(err: &sea_orm::DbErr) -> Option<String> {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => {
                if msg.contains("username") {
                    Some("username".to_string())
                } else if msg.contains("email") {
                    Some("email".to_string())
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Dispatch mail without blocking the operation that triggered it.
    fn send_mail(&self, to: String, subject: String, body: String) {
        let mailer = self.mailer.clone();
        let subject = format!("{} {subject}", self.mail.subject_prefix);
        tokio::spawn(async move {
            if let Err(e) = mailer.send(&to, &subject, &body).await {
                warn!("Failed to send mail to {to}: {e}");
            }
        });
    }
}

#[async_trait]
impl AccountService for SeaOrmAccountService {
    async fn register(&self, new: NewAccount) -> Result<UserInfo, AccountError> {
        let user = self
            .store
            .insert_user(
                NewUser {
                    username: new.username,
                    password: new.password,
                    email: new.email,
                    first_name: new.first_name,
                    last_name: new.last_name,
                },
                &self.security,
            )
            .await
            .map_err(|err| match Self::duplicate_field(&err) {
                Some(field) => AccountError::Duplicate { field },
                None => AccountError::from(err),
            })?;

        info!("Registered user: {}", user.username);
        Ok(Self::user_info(user))
    }

    async fn login(&self, username: &str, password: &str) -> Result<UserInfo, AccountError> {
        if let Some(user) = self.store.authenticate_user(username, password).await? {
            return Ok(Self::user_info(user));
        }

        // The authentication decision is already made; a second lookup only
        // picks the error message. Documented usability trade-off against
        // username-enumeration resistance.
        if self.store.get_user_by_username(username).await?.is_some() {
            Err(AccountError::WrongPassword)
        } else {
            Err(AccountError::UnknownUsername)
        }
    }

    async fn get_user(&self, username: &str) -> Result<UserInfo, AccountError> {
        let user = self
            .store
            .get_user_by_username(username)
            .await?
            .ok_or(AccountError::NotFound)?;

        Ok(Self::user_info(user))
    }

    async fn delete_user(&self, username: &str) -> Result<(), AccountError> {
        // Feedback rows go first so the owning row never dangles. A retry
        // after a partial failure finds zero feedback rows and proceeds
        // straight to the user delete.
        let removed = self.store.delete_all_feedback_for_user(username).await?;

        if !self.store.delete_user(username).await? {
            return Err(AccountError::NotFound);
        }

        info!("Deleted user {username} and {removed} feedback entries");
        Ok(())
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), AccountError> {
        let user = self
            .store
            .get_user_by_email(email)
            .await?
            .ok_or(AccountError::NotFound)?;

        let token = generate_reset_token();
        self.store
            .set_password_reset_token(&user.username, &token)
            .await?;

        info!("Issued password reset token for {}", user.username);

        self.send_mail(
            user.email,
            "Password reset".to_string(),
            format!(
                "A password reset was requested for this address.\n\
                 Present the token below together with your email to choose a new password.\n\
                 Token: {token}"
            ),
        );

        Ok(())
    }

    async fn confirm_password_reset(
        &self,
        email: &str,
        token: &str,
        new_password: &str,
    ) -> Result<(), AccountError> {
        let Some(user) = self.store.get_user_by_email(email).await? else {
            return Err(AccountError::ResetRejected);
        };

        let stored = self.store.get_password_reset_token(&user.username).await?;
        match stored {
            Some(open_token) if open_token == token => {}
            // No open token, or a mismatch: either way the presented token
            // buys nothing.
            _ => return Err(AccountError::ResetRejected),
        }

        // Rehash and clear the token in a single update, which is what makes
        // the token single-use.
        self.store
            .update_user_password(&user.username, new_password, &self.security)
            .await?;

        info!("Password reset completed for {}", user.username);
        Ok(())
    }

    async fn send_username_reminder(&self, email: &str) -> Result<(), AccountError> {
        let user = self
            .store
            .get_user_by_email(email)
            .await?
            .ok_or(AccountError::NotFound)?;

        self.send_mail(
            user.email.clone(),
            "Username reminder".to_string(),
            format!("The username registered for this address is: {}", user.username),
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::account_service::NewAccount;

    struct NullMailer;

    #[async_trait]
    impl Mailer for NullMailer {
        async fn send(&self, _to: &str, _subject: &str, _body: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    async fn service() -> SeaOrmAccountService {
        let store = Store::new("sqlite::memory:").await.unwrap();
        SeaOrmAccountService::new(
            store,
            Arc::new(NullMailer),
            SecurityConfig::default(),
            MailConfig::default(),
        )
    }

    fn alice() -> NewAccount {
        NewAccount {
            username: "alice".to_string(),
            password: "Secret123!".to_string(),
            email: "alice@x.com".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Ames".to_string(),
        }
    }

    #[tokio::test]
    async fn register_then_login() {
        let svc = service().await;
        let info = svc.register(alice()).await.unwrap();
        assert_eq!(info.username, "alice");
        assert_eq!(info.full_name, "Alice Ames");
        assert!(!info.is_admin);

        let logged_in = svc.login("alice", "Secret123!").await.unwrap();
        assert_eq!(logged_in.username, "alice");

        assert!(matches!(
            svc.login("alice", "Secret123?").await,
            Err(AccountError::WrongPassword)
        ));
        assert!(matches!(
            svc.login("bob", "Secret123!").await,
            Err(AccountError::UnknownUsername)
        ));
    }

    #[tokio::test]
    async fn duplicate_username_and_email_map_to_fields() {
        let svc = service().await;
        svc.register(alice()).await.unwrap();

        let mut same_username = alice();
        same_username.email = "other@x.com".to_string();
        match svc.register(same_username).await {
            Err(AccountError::Duplicate { field }) => assert_eq!(field, "username"),
            other => panic!("expected duplicate username, got {other:?}"),
        }

        let mut same_email = alice();
        same_email.username = "alice2".to_string();
        match svc.register(same_email).await {
            Err(AccountError::Duplicate { field }) => assert_eq!(field, "email"),
            other => panic!("expected duplicate email, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn reset_token_is_single_use() {
        let svc = service().await;
        svc.register(alice()).await.unwrap();

        svc.request_password_reset("alice@x.com").await.unwrap();
        let token = svc
            .store
            .get_password_reset_token("alice")
            .await
            .unwrap()
            .expect("token should be persisted");

        // Wrong token is rejected and leaves the open token in place
        assert!(matches!(
            svc.confirm_password_reset("alice@x.com", "bogus", "NewSecret99!").await,
            Err(AccountError::ResetRejected)
        ));

        svc.confirm_password_reset("alice@x.com", &token, "NewSecret99!")
            .await
            .unwrap();

        assert!(svc.login("alice", "NewSecret99!").await.is_ok());
        assert!(matches!(
            svc.login("alice", "Secret123!").await,
            Err(AccountError::WrongPassword)
        ));

        // Replay of the spent token
        assert!(matches!(
            svc.confirm_password_reset("alice@x.com", &token, "Another11!").await,
            Err(AccountError::ResetRejected)
        ));
    }

    #[tokio::test]
    async fn delete_cascade_is_idempotent() {
        let svc = service().await;
        svc.register(alice()).await.unwrap();
        svc.store
            .add_feedback("alice", "t1", "some content")
            .await
            .unwrap();
        svc.store
            .add_feedback("alice", "t2", "more content")
            .await
            .unwrap();

        svc.delete_user("alice").await.unwrap();
        assert!(
            svc.store
                .list_feedback_for_user("alice")
                .await
                .unwrap()
                .is_empty()
        );

        assert!(matches!(
            svc.delete_user("alice").await,
            Err(AccountError::NotFound)
        ));
    }
}
