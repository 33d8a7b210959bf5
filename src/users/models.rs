//! User data models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// User database model
///
/// `hashed_password` and `username` are NULL for OAuth-only accounts; an
/// account may exist without either as long as it has at least one linked
/// auth identity.
#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub username: Option<String>,
    #[serde(skip)]
    pub hashed_password: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub locale: Option<String>,
    pub is_active: bool,
    pub failed_login_attempts: i64,
    pub last_login_at: Option<String>,
    pub created_at: Option<String>,
}

/// Field set for creating a user.
#[derive(Debug, Default)]
pub struct NewUser {
    pub email: Option<String>,
    pub email_verified: bool,
    pub username: Option<String>,
    pub hashed_password: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub locale: Option<String>,
}

/// Partial update of the fields a caller is allowed to change.
///
/// `None` leaves a column untouched; there is no way to express "set to
/// NULL" here, which keeps profile syncs strictly additive.
#[derive(Debug, Default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub email_verified: Option<bool>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub locale: Option<String>,
    pub hashed_password: Option<String>,
    pub is_active: Option<bool>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.email_verified.is_none()
            && self.display_name.is_none()
            && self.avatar_url.is_none()
            && self.locale.is_none()
            && self.hashed_password.is_none()
            && self.is_active.is_none()
    }
}
