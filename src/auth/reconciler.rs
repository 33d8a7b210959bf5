//! Identity reconciliation - maps a provider profile to a local user
//!
//! Exactly one of three things happens per reconciliation: the identity
//! already exists (returning user), the profile email matches an existing
//! local account (link), or a new account is provisioned. The
//! (provider, provider_user_id) uniqueness constraint guarantees an identity
//! is never created twice.

use tracing::{info, warn};

use super::identity::{AuthIdentityRepository, NewIdentity};
use super::models::{AuthIdentity, Provider};
use crate::common::{safe_email_log, ApiError};
use crate::services::ProviderProfile;
use crate::users::models::{NewUser, User, UserUpdate};
use crate::users::repository::UserRepository;

/// Resolves a provider profile to a canonical local user.
///
/// Returns `(user, identity, is_new_user)`; `is_new_user` is true only when
/// a brand-new account was provisioned.
pub async fn reconcile(
    users: &UserRepository,
    identities: &AuthIdentityRepository,
    provider: Provider,
    profile: &ProviderProfile,
) -> Result<(User, AuthIdentity, bool), ApiError> {
    // A profile without a stable subject id cannot be linked to anything
    let Some(subject) = profile.subject.as_deref().filter(|s| !s.is_empty()) else {
        warn!(provider = %provider, "Provider profile missing subject identifier");
        return Err(ApiError::BadRequest(
            "No se pudo obtener el ID del usuario del proveedor".to_string(),
        ));
    };

    // Case 1: identity already known - returning user
    if let Some(identity) = identities
        .get_by_provider_and_subject(provider, subject)
        .await?
    {
        let user = users.get(&identity.user_id).await?.ok_or_else(|| {
            ApiError::InternalServer(format!(
                "auth identity {} references missing user {}",
                identity.id, identity.user_id
            ))
        })?;

        let user = sync_profile_fields(users, user, profile).await?;
        return Ok((user, identity, false));
    }

    // Case 2: no identity yet, but the provider email matches a local
    // account - link instead of creating a duplicate
    let mut linked_user = None;
    if let Some(email) = profile.email.as_deref() {
        linked_user = users.get_by_email(email).await?;
    }

    let (user, is_new_user) = match linked_user {
        Some(user) => {
            info!(
                user_id = %user.id,
                provider = %provider,
                "Linking new provider identity to existing account"
            );
            (user, false)
        }
        // Case 3: provision a new account from the profile (email may be
        // absent - providers are not required to share it)
        None => {
            let display_name = profile
                .display_name
                .clone()
                .or_else(|| profile.email.clone())
                .unwrap_or_else(|| "Usuario".to_string());

            let user = users
                .create(NewUser {
                    email: profile.email.clone(),
                    email_verified: profile.email_verified.unwrap_or(false),
                    display_name: Some(display_name),
                    avatar_url: profile.avatar_url.clone(),
                    locale: profile.locale.clone(),
                    ..NewUser::default()
                })
                .await?;

            info!(
                user_id = %user.id,
                email = %safe_email_log(user.email.as_deref().unwrap_or("")),
                provider = %provider,
                "New user account provisioned from provider profile"
            );
            (user, true)
        }
    };

    let identity = identities
        .create(NewIdentity {
            user_id: user.id.clone(),
            provider,
            provider_user_id: subject.to_string(),
            provider_email: profile.email.clone(),
            email_verified: profile.email_verified,
        })
        .await?;

    info!(
        user_id = %user.id,
        provider = %provider,
        identity_id = %identity.id,
        "Auth identity created"
    );

    Ok((user, identity, is_new_user))
}

/// Fills currently-empty local fields from fresher provider data.
///
/// Already-set local values are never overwritten; the only upgrade allowed
/// is email_verified false -> true.
async fn sync_profile_fields(
    users: &UserRepository,
    user: User,
    profile: &ProviderProfile,
) -> Result<User, ApiError> {
    let mut update = UserUpdate::default();

    if user.email.is_none() {
        update.email = profile.email.clone();
    }
    if !user.email_verified && profile.email_verified == Some(true) {
        update.email_verified = Some(true);
    }
    if user.display_name.is_none() {
        update.display_name = profile.display_name.clone();
    }
    if user.avatar_url.is_none() {
        update.avatar_url = profile.avatar_url.clone();
    }
    if user.locale.is_none() {
        update.locale = profile.locale.clone();
    }

    if update.is_empty() {
        return Ok(user);
    }

    let user_id = user.id.clone();
    users.update(&user_id, update).await?.ok_or_else(|| {
        ApiError::InternalServer(format!("user {} vanished during profile sync", user_id))
    })
}
