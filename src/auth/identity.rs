//! AuthIdentity repository - external identity rows keyed by
//! (provider, provider_user_id)

use chrono::Utc;
use sqlx::SqlitePool;

use super::models::{AuthIdentity, Provider};
use crate::common::generate_identity_id;

/// Field set for creating an identity row.
#[derive(Debug)]
pub struct NewIdentity {
    pub user_id: String,
    pub provider: Provider,
    pub provider_user_id: String,
    pub provider_email: Option<String>,
    pub email_verified: Option<bool>,
}

/// Partial update of an identity row. `None` leaves a column untouched.
#[derive(Debug, Default)]
pub struct IdentityUpdate {
    pub provider_email: Option<String>,
    pub email_verified: Option<bool>,
    pub access_token_enc: Option<String>,
    pub refresh_token_enc: Option<String>,
    pub token_expires_at: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AuthIdentityRepository {
    pool: SqlitePool,
}

impl AuthIdentityRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_by_provider_and_subject(
        &self,
        provider: Provider,
        provider_user_id: &str,
    ) -> Result<Option<AuthIdentity>, sqlx::Error> {
        sqlx::query_as::<_, AuthIdentity>(
            "SELECT * FROM auth_identity WHERE provider = ? AND provider_user_id = ?",
        )
        .bind(provider.as_str())
        .bind(provider_user_id)
        .fetch_optional(&self.pool)
        .await
    }

    #[allow(dead_code)]
    pub async fn get_by_user_id(&self, user_id: &str) -> Result<Vec<AuthIdentity>, sqlx::Error> {
        sqlx::query_as::<_, AuthIdentity>("SELECT * FROM auth_identity WHERE user_id = ?")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
    }

    /// Creates an identity row. The UNIQUE(provider, provider_user_id)
    /// constraint makes a duplicate insert fail; callers treat that as a
    /// fatal integrity error, not a retryable condition.
    pub async fn create(&self, new: NewIdentity) -> Result<AuthIdentity, sqlx::Error> {
        let id = generate_identity_id();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO auth_identity
                (id, user_id, provider, provider_user_id, provider_email,
                 email_verified, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&new.user_id)
        .bind(new.provider.as_str())
        .bind(&new.provider_user_id)
        .bind(new.provider_email.as_deref().map(str::to_lowercase))
        .bind(new.email_verified)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        sqlx::query_as::<_, AuthIdentity>("SELECT * FROM auth_identity WHERE id = ?")
            .bind(&id)
            .fetch_one(&self.pool)
            .await
    }

    pub async fn update(
        &self,
        identity_id: &str,
        update: IdentityUpdate,
    ) -> Result<Option<AuthIdentity>, sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE auth_identity SET
                provider_email = COALESCE(?, provider_email),
                email_verified = COALESCE(?, email_verified),
                access_token_enc = COALESCE(?, access_token_enc),
                refresh_token_enc = COALESCE(?, refresh_token_enc),
                token_expires_at = COALESCE(?, token_expires_at),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(update.provider_email.as_deref().map(str::to_lowercase))
        .bind(update.email_verified)
        .bind(update.access_token_enc.as_deref())
        .bind(update.refresh_token_enc.as_deref())
        .bind(update.token_expires_at.as_deref())
        .bind(Utc::now().to_rfc3339())
        .bind(identity_id)
        .execute(&self.pool)
        .await?;

        sqlx::query_as::<_, AuthIdentity>("SELECT * FROM auth_identity WHERE id = ?")
            .bind(identity_id)
            .fetch_optional(&self.pool)
            .await
    }
}
