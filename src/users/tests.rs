//! Tests for the users module

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use super::models::{NewUser, UserUpdate};
use super::repository::UserRepository;
use crate::common::migrations::run_migrations;

async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    run_migrations(&pool).await.expect("Failed to run migrations");
    pool
}

#[tokio::test]
async fn test_create_and_lookup() {
    let repo = UserRepository::new(test_pool().await);

    let user = repo
        .create(NewUser {
            email: Some("alice@example.com".to_string()),
            username: Some("alice".to_string()),
            hashed_password: Some("$argon2id$fake".to_string()),
            ..NewUser::default()
        })
        .await
        .expect("create failed");

    assert!(user.id.starts_with("U_"));
    assert!(user.is_active);
    assert_eq!(user.failed_login_attempts, 0);

    let by_id = repo.get(&user.id).await.expect("get failed");
    assert_eq!(by_id.map(|u| u.id), Some(user.id.clone()));

    let by_username = repo.get_by_username("alice").await.expect("get failed");
    assert_eq!(by_username.map(|u| u.id), Some(user.id));
}

#[tokio::test]
async fn test_email_lookup_is_case_insensitive() {
    let repo = UserRepository::new(test_pool().await);

    repo.create(NewUser {
        email: Some("Alice@Example.COM".to_string()),
        ..NewUser::default()
    })
    .await
    .expect("create failed");

    let found = repo
        .get_by_email("alice@example.com")
        .await
        .expect("lookup failed");
    assert!(found.is_some());
    // Stored lowercased
    assert_eq!(found.unwrap().email.as_deref(), Some("alice@example.com"));

    let found_upper = repo
        .get_by_email("ALICE@EXAMPLE.COM")
        .await
        .expect("lookup failed");
    assert!(found_upper.is_some());
}

#[tokio::test]
async fn test_duplicate_email_is_rejected_by_schema() {
    let repo = UserRepository::new(test_pool().await);

    repo.create(NewUser {
        email: Some("alice@example.com".to_string()),
        ..NewUser::default()
    })
    .await
    .expect("create failed");

    let duplicate = repo
        .create(NewUser {
            email: Some("alice@example.com".to_string()),
            ..NewUser::default()
        })
        .await;
    assert!(duplicate.is_err());
}

#[tokio::test]
async fn test_update_touches_only_set_fields() {
    let repo = UserRepository::new(test_pool().await);

    let user = repo
        .create(NewUser {
            email: Some("alice@example.com".to_string()),
            display_name: Some("Alice".to_string()),
            ..NewUser::default()
        })
        .await
        .expect("create failed");

    let updated = repo
        .update(
            &user.id,
            UserUpdate {
                avatar_url: Some("https://example.com/a.png".to_string()),
                ..UserUpdate::default()
            },
        )
        .await
        .expect("update failed")
        .expect("user exists");

    assert_eq!(updated.avatar_url.as_deref(), Some("https://example.com/a.png"));
    // Untouched fields survive
    assert_eq!(updated.display_name.as_deref(), Some("Alice"));
    assert_eq!(updated.email.as_deref(), Some("alice@example.com"));
}

#[tokio::test]
async fn test_update_unknown_user_returns_none() {
    let repo = UserRepository::new(test_pool().await);
    let result = repo
        .update("U_MISSING", UserUpdate::default())
        .await
        .expect("update failed");
    assert!(result.is_none());
}

#[tokio::test]
async fn test_login_bookkeeping() {
    let repo = UserRepository::new(test_pool().await);

    let user = repo
        .create(NewUser {
            username: Some("alice".to_string()),
            ..NewUser::default()
        })
        .await
        .expect("create failed");

    repo.record_login_failure(&user.id).await.expect("failure");
    repo.record_login_failure(&user.id).await.expect("failure");

    let u = repo.get(&user.id).await.expect("get").expect("exists");
    assert_eq!(u.failed_login_attempts, 2);
    assert!(u.last_login_at.is_none());

    repo.record_login_success(&user.id).await.expect("success");

    let u = repo.get(&user.id).await.expect("get").expect("exists");
    assert_eq!(u.failed_login_attempts, 0);
    assert!(u.last_login_at.is_some());
}

#[tokio::test]
async fn test_deactivation_via_update() {
    let repo = UserRepository::new(test_pool().await);

    let user = repo
        .create(NewUser {
            username: Some("alice".to_string()),
            ..NewUser::default()
        })
        .await
        .expect("create failed");
    assert!(user.is_active);

    let updated = repo
        .update(
            &user.id,
            UserUpdate {
                is_active: Some(false),
                ..UserUpdate::default()
            },
        )
        .await
        .expect("update failed")
        .expect("user exists");
    assert!(!updated.is_active);
}
