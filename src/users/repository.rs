//! User repository - the narrow persistence interface the auth core sees

use chrono::Utc;
use sqlx::SqlitePool;

use super::models::{NewUser, User, UserUpdate};
use crate::common::generate_user_id;

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, user_id: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Email lookup is case-insensitive; emails are stored lowercased.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email.to_lowercase())
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn create(&self, new: NewUser) -> Result<User, sqlx::Error> {
        let id = generate_user_id();

        sqlx::query(
            r#"
            INSERT INTO users
                (id, email, email_verified, username, hashed_password,
                 display_name, avatar_url, locale, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(new.email.as_deref().map(str::to_lowercase))
        .bind(new.email_verified)
        .bind(new.username.as_deref())
        .bind(new.hashed_password.as_deref())
        .bind(new.display_name.as_deref())
        .bind(new.avatar_url.as_deref())
        .bind(new.locale.as_deref())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(&id)
            .fetch_one(&self.pool)
            .await
    }

    /// Applies a partial update. Only the fields set in `update` change;
    /// COALESCE keeps every other column as-is.
    pub async fn update(
        &self,
        user_id: &str,
        update: UserUpdate,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users SET
                email = COALESCE(?, email),
                email_verified = COALESCE(?, email_verified),
                display_name = COALESCE(?, display_name),
                avatar_url = COALESCE(?, avatar_url),
                locale = COALESCE(?, locale),
                hashed_password = COALESCE(?, hashed_password),
                is_active = COALESCE(?, is_active)
            WHERE id = ?
            "#,
        )
        .bind(update.email.as_deref().map(str::to_lowercase))
        .bind(update.email_verified)
        .bind(update.display_name.as_deref())
        .bind(update.avatar_url.as_deref())
        .bind(update.locale.as_deref())
        .bind(update.hashed_password.as_deref())
        .bind(update.is_active)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        self.get(user_id).await
    }

    /// Resets the failure counter and stamps the login time.
    pub async fn record_login_success(&self, user_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET failed_login_attempts = 0, last_login_at = ? WHERE id = ?",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn record_login_failure(&self, user_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET failed_login_attempts = failed_login_attempts + 1 WHERE id = ?",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
