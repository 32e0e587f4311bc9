use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::users;

/// User data returned from the repository (never carries the password hash)
#[derive(Debug, Clone)]
pub struct User {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_admin: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            username: model.username,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            is_admin: model.is_admin,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Input for creating a user. The password is hashed before insert.
/// Deliberately not `Debug`; it carries a plaintext password.
#[derive(Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert a new user with a freshly computed password hash.
    ///
    /// Returns the raw [`DbErr`] so callers can inspect unique-constraint
    /// violations on username/email. No existence pre-check is made; the
    /// store's constraints are the only defence against the check-then-act
    /// race between concurrent registrations.
    pub async fn insert(&self, new: NewUser, config: &SecurityConfig) -> Result<User, DbErr> {
        let password = new.password.clone();
        let config = config.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .map_err(|e| DbErr::Custom(format!("Password hashing task panicked: {e}")))?
            .map_err(|e| DbErr::Custom(e.to_string()))?;

        let now = chrono::Utc::now().to_rfc3339();

        let active = users::ActiveModel {
            username: Set(new.username),
            password_hash: Set(password_hash),
            email: Set(new.email),
            first_name: Set(new.first_name),
            last_name: Set(new.last_name),
            is_admin: Set(false),
            password_reset_token: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        };

        let model = active.insert(&self.conn).await?;
        Ok(User::from(model))
    }

    /// Get user by username
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(username)
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user.map(User::from))
    }

    /// Get user by email
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(User::from))
    }

    /// Verify a password and return the user on match, `None` otherwise.
    ///
    /// Unknown username and wrong password both come back as `None`; callers
    /// wanting to distinguish the two for error messaging must perform a
    /// separate existence lookup afterwards.
    ///
    /// Note: uses `spawn_blocking` because Argon2 verification is
    /// CPU-intensive and would block the async runtime if run directly.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(username)
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(None);
        };

        let password_hash = user.password_hash.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            let argon2 = Argon2::default();
            Ok::<bool, anyhow::Error>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        if is_valid {
            Ok(Some(User::from(user)))
        } else {
            Ok(None)
        }
    }

    /// Store a reset token for the user. Replaces any previously open token.
    pub async fn set_reset_token(&self, username: &str, token: &str) -> Result<()> {
        let user = users::Entity::find_by_id(username)
            .one(&self.conn)
            .await
            .context("Failed to query user for reset token update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {username}"))?;

        let now = chrono::Utc::now().to_rfc3339();

        let mut active: users::ActiveModel = user.into();
        active.password_reset_token = Set(Some(token.to_string()));
        active.updated_at = Set(now);
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Read the currently open reset token, if any.
    pub async fn get_reset_token(&self, username: &str) -> Result<Option<String>> {
        let user = users::Entity::find_by_id(username)
            .one(&self.conn)
            .await
            .context("Failed to query user for reset token")?;

        Ok(user.and_then(|u| u.password_reset_token))
    }

    /// Rehash and store a new password, clearing the reset token in the same
    /// update statement so a successful rehash can never leave a live token
    /// behind.
    pub async fn update_password(
        &self,
        username: &str,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<()> {
        let user = users::Entity::find_by_id(username)
            .one(&self.conn)
            .await
            .context("Failed to query user for password update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {username}"))?;

        let password = new_password.to_string();
        let config = config.clone();
        let new_hash = task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .context("Password hashing task panicked")??;

        let now = chrono::Utc::now().to_rfc3339();

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(new_hash);
        active.password_reset_token = Set(None);
        active.updated_at = Set(now);
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Delete a user row. Returns false if no such user existed.
    pub async fn delete(&self, username: &str) -> Result<bool> {
        let res = users::Entity::delete_by_id(username)
            .exec(&self.conn)
            .await
            .context("Failed to delete user")?;

        Ok(res.rows_affected > 0)
    }
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses default params.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None, // output length (use default)
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Generate a password reset token (16 random bytes, hex-encoded)
#[must_use]
pub fn generate_reset_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();

    bytes.iter().fold(String::with_capacity(32), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_never_stores_plaintext() {
        let hash = hash_password("hunter2-extra!", None).unwrap();
        assert_ne!(hash, "hunter2-extra!");
        assert!(hash.starts_with("$argon2"));
    }

    #[test]
    fn test_generate_reset_token_shape() {
        let token = generate_reset_token();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));

        // 128 bits of entropy makes a collision here astronomically unlikely
        assert_ne!(token, generate_reset_token());
    }
}
