//! Tests for the auth module
//!
//! Reconciler and identity repository tests run against an in-memory SQLite
//! database with the real schema.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use super::identity::AuthIdentityRepository;
use super::models::Provider;
use super::reconciler::reconcile;
use crate::common::migrations::run_migrations;
use crate::services::ProviderProfile;
use crate::users::models::NewUser;
use crate::users::repository::UserRepository;

/// One-connection in-memory pool; every connection would otherwise get its
/// own empty :memory: database.
async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    run_migrations(&pool).await.expect("Failed to run migrations");
    pool
}

fn google_profile(subject: &str, email: Option<&str>) -> ProviderProfile {
    ProviderProfile {
        subject: Some(subject.to_string()),
        email: email.map(str::to_string),
        email_verified: Some(true),
        display_name: Some("Alice Example".to_string()),
        avatar_url: Some("https://lh3.example.com/alice.jpg".to_string()),
        locale: Some("es-ES".to_string()),
    }
}

#[tokio::test]
async fn test_reconcile_provisions_new_user_then_recognizes_it() {
    let pool = test_pool().await;
    let users = UserRepository::new(pool.clone());
    let identities = AuthIdentityRepository::new(pool);

    let profile = google_profile("google-sub-1", Some("alice@example.com"));

    let (user1, identity1, is_new1) =
        reconcile(&users, &identities, Provider::Google, &profile)
            .await
            .expect("first reconcile failed");
    assert!(is_new1);
    assert_eq!(user1.email.as_deref(), Some("alice@example.com"));
    assert!(user1.email_verified);
    assert_eq!(identity1.provider, "google");
    assert_eq!(identity1.provider_user_id, "google-sub-1");

    // Same profile again: recognized, not recreated
    let (user2, identity2, is_new2) =
        reconcile(&users, &identities, Provider::Google, &profile)
            .await
            .expect("second reconcile failed");
    assert!(!is_new2);
    assert_eq!(user1.id, user2.id);
    assert_eq!(identity1.id, identity2.id);
}

#[tokio::test]
async fn test_reconcile_links_to_existing_account_by_email() {
    let pool = test_pool().await;
    let users = UserRepository::new(pool.clone());
    let identities = AuthIdentityRepository::new(pool);

    // Existing local password account
    let local = users
        .create(NewUser {
            email: Some("alice@example.com".to_string()),
            email_verified: true,
            username: Some("alice".to_string()),
            hashed_password: Some("$argon2id$fake".to_string()),
            ..NewUser::default()
        })
        .await
        .expect("failed to create local user");

    // First Google login with the same email must attach to it
    let profile = google_profile("google-sub-2", Some("alice@example.com"));
    let (user, identity, is_new) = reconcile(&users, &identities, Provider::Google, &profile)
        .await
        .expect("reconcile failed");

    assert!(!is_new);
    assert_eq!(user.id, local.id);
    assert_eq!(identity.user_id, local.id);
}

#[tokio::test]
async fn test_reconcile_email_linking_is_case_insensitive() {
    let pool = test_pool().await;
    let users = UserRepository::new(pool.clone());
    let identities = AuthIdentityRepository::new(pool);

    let local = users
        .create(NewUser {
            email: Some("Alice@Example.com".to_string()),
            ..NewUser::default()
        })
        .await
        .expect("failed to create local user");

    let profile = google_profile("google-sub-3", Some("ALICE@EXAMPLE.COM"));
    let (user, _, is_new) = reconcile(&users, &identities, Provider::Google, &profile)
        .await
        .expect("reconcile failed");

    assert!(!is_new);
    assert_eq!(user.id, local.id);
}

#[tokio::test]
async fn test_reconcile_does_not_overwrite_local_fields() {
    let pool = test_pool().await;
    let users = UserRepository::new(pool.clone());
    let identities = AuthIdentityRepository::new(pool);

    let profile = google_profile("google-sub-4", Some("alice@example.com"));
    let (user, _, _) = reconcile(&users, &identities, Provider::Google, &profile)
        .await
        .expect("reconcile failed");

    // The user customizes their display name locally
    users
        .update(
            &user.id,
            crate::users::models::UserUpdate {
                display_name: Some("Alicia".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("update failed");

    // A later login with fresher provider data must not clobber it
    let mut fresher = profile.clone();
    fresher.display_name = Some("Alice From Google".to_string());

    let (user, _, _) = reconcile(&users, &identities, Provider::Google, &fresher)
        .await
        .expect("reconcile failed");
    assert_eq!(user.display_name.as_deref(), Some("Alicia"));
}

#[tokio::test]
async fn test_reconcile_fills_empty_fields_from_provider() {
    let pool = test_pool().await;
    let users = UserRepository::new(pool.clone());
    let identities = AuthIdentityRepository::new(pool);

    // Provider shares nothing but the subject on the first login
    let bare = ProviderProfile {
        subject: Some("google-sub-5".to_string()),
        ..ProviderProfile::default()
    };
    let (user, _, is_new) = reconcile(&users, &identities, Provider::Google, &bare)
        .await
        .expect("reconcile failed");
    assert!(is_new);
    assert_eq!(user.email, None);

    // On a later login the provider shares more; empty fields get filled
    let full = google_profile("google-sub-5", Some("alice@example.com"));
    let (user, _, is_new) = reconcile(&users, &identities, Provider::Google, &full)
        .await
        .expect("reconcile failed");
    assert!(!is_new);
    assert_eq!(user.email.as_deref(), Some("alice@example.com"));
    assert!(user.email_verified);
    assert_eq!(user.avatar_url.as_deref(), Some("https://lh3.example.com/alice.jpg"));
}

#[tokio::test]
async fn test_reconcile_rejects_profile_without_subject() {
    let pool = test_pool().await;
    let users = UserRepository::new(pool.clone());
    let identities = AuthIdentityRepository::new(pool);

    let profile = ProviderProfile {
        subject: None,
        email: Some("alice@example.com".to_string()),
        ..ProviderProfile::default()
    };

    let result = reconcile(&users, &identities, Provider::Google, &profile).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_same_email_different_providers_share_one_account() {
    let pool = test_pool().await;
    let users = UserRepository::new(pool.clone());
    let identities = AuthIdentityRepository::new(pool);

    let google = google_profile("google-sub-6", Some("alice@example.com"));
    let (user_a, _, _) = reconcile(&users, &identities, Provider::Google, &google)
        .await
        .expect("google reconcile failed");

    let github = ProviderProfile {
        subject: Some("1234567".to_string()),
        email: Some("alice@example.com".to_string()),
        display_name: Some("alice".to_string()),
        ..ProviderProfile::default()
    };
    let (user_b, _, is_new) = reconcile(&users, &identities, Provider::Github, &github)
        .await
        .expect("github reconcile failed");

    assert!(!is_new);
    assert_eq!(user_a.id, user_b.id);

    let linked = identities
        .get_by_user_id(&user_a.id)
        .await
        .expect("lookup failed");
    assert_eq!(linked.len(), 2);
}

#[tokio::test]
async fn test_identity_uniqueness_is_enforced() {
    let pool = test_pool().await;
    let users = UserRepository::new(pool.clone());
    let identities = AuthIdentityRepository::new(pool);

    let user = users
        .create(NewUser::default())
        .await
        .expect("failed to create user");

    let first = identities
        .create(super::identity::NewIdentity {
            user_id: user.id.clone(),
            provider: Provider::Google,
            provider_user_id: "dup-sub".to_string(),
            provider_email: None,
            email_verified: None,
        })
        .await;
    assert!(first.is_ok());

    // Second insert with the same (provider, provider_user_id) must fail
    let second = identities
        .create(super::identity::NewIdentity {
            user_id: user.id,
            provider: Provider::Google,
            provider_user_id: "dup-sub".to_string(),
            provider_email: None,
            email_verified: None,
        })
        .await;
    assert!(second.is_err());
}
