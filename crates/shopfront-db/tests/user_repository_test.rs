//! Integration tests for User repository using in-memory SurrealDB.

use chrono::{Duration, Utc};
use shopfront_core::error::ShopError;
use shopfront_core::models::media::{ImageRef, MediaKind};
use shopfront_core::models::user::{CreateUser, Role, UpdateUser};
use shopfront_core::repository::{Pagination, UserRepository};
use shopfront_db::repository::{SurrealUserRepository, verify_password};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    shopfront_db::run_migrations(&db).await.unwrap();
    db
}

fn new_user(email: &str) -> CreateUser {
    CreateUser {
        full_name: "Asha Rao".into(),
        email: email.into(),
        phone: Some("9999999999".into()),
        password: "hunter22".into(),
        avatar: None,
        role: Role::User,
    }
}

#[tokio::test]
async fn create_and_get_user() {
    let repo = SurrealUserRepository::new(setup().await);

    let user = repo.create(new_user("Asha@Example.com")).await.unwrap();
    assert_eq!(user.email, "asha@example.com");
    assert_eq!(user.role, Role::User);
    assert!(user.avatar.is_none());
    assert!(user.password_hash.starts_with("$argon2id$"));
    assert!(verify_password("hunter22", &user.password_hash, None).unwrap());

    let fetched = repo.get_by_id(user.id).await.unwrap();
    assert_eq!(fetched.id, user.id);
    assert_eq!(fetched.full_name, "Asha Rao");

    let by_email = repo.get_by_email("  ASHA@example.com ").await.unwrap();
    assert_eq!(by_email.id, user.id);
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let repo = SurrealUserRepository::new(setup().await);

    repo.create(new_user("dup@example.com")).await.unwrap();
    let err = repo.create(new_user("DUP@example.com")).await.unwrap_err();
    assert!(matches!(err, ShopError::AlreadyExists { .. }), "got {err:?}");
}

#[tokio::test]
async fn missing_user_is_not_found() {
    let repo = SurrealUserRepository::new(setup().await);

    let err = repo.get_by_id(uuid::Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ShopError::NotFound { .. }));
    let err = repo.get_by_email("ghost@example.com").await.unwrap_err();
    assert!(matches!(err, ShopError::NotFound { .. }));
}

#[tokio::test]
async fn update_sets_and_clears_fields() {
    let repo = SurrealUserRepository::new(setup().await);
    let user = repo.create(new_user("upd@example.com")).await.unwrap();

    let updated = repo
        .update(
            user.id,
            UpdateUser {
                full_name: Some("Asha R.".into()),
                avatar: Some(ImageRef {
                    public_id: "avatars/a1".into(),
                    url: "http://media/avatars/a1.png".into(),
                    kind: MediaKind::Image,
                }),
                role: Some(Role::Admin),
                refresh_token: Some(Some("rt".into())),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.full_name, "Asha R.");
    assert_eq!(updated.role, Role::Admin);
    assert_eq!(updated.refresh_token.as_deref(), Some("rt"));
    assert_eq!(updated.avatar.unwrap().public_id, "avatars/a1");

    let cleared = repo
        .update(
            user.id,
            UpdateUser {
                refresh_token: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(cleared.refresh_token.is_none());
    assert_eq!(cleared.full_name, "Asha R.");
}

#[tokio::test]
async fn reset_token_lookup_honours_expiry() {
    let repo = SurrealUserRepository::new(setup().await);
    let user = repo.create(new_user("reset@example.com")).await.unwrap();

    repo.update(
        user.id,
        UpdateUser {
            reset_password_token: Some(Some("live-hash".into())),
            reset_password_expires_at: Some(Some(Utc::now() + Duration::minutes(30))),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let found = repo.get_by_reset_token("live-hash").await.unwrap();
    assert_eq!(found.id, user.id);

    repo.update(
        user.id,
        UpdateUser {
            reset_password_expires_at: Some(Some(Utc::now() - Duration::minutes(1))),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(repo.get_by_reset_token("live-hash").await.is_err());
}

#[tokio::test]
async fn set_password_rehashes_and_clears_reset_token() {
    let repo = SurrealUserRepository::with_pepper(setup().await, Some("pep".into()));
    let user = repo.create(new_user("pw@example.com")).await.unwrap();
    repo.update(
        user.id,
        UpdateUser {
            reset_password_token: Some(Some("h".into())),
            reset_password_expires_at: Some(Some(Utc::now() + Duration::minutes(5))),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let updated = repo.set_password(user.id, "new-secret").await.unwrap();
    assert!(verify_password("new-secret", &updated.password_hash, Some("pep")).unwrap());
    assert!(!verify_password("hunter22", &updated.password_hash, Some("pep")).unwrap());
    assert!(updated.reset_password_token.is_none());
    assert!(updated.reset_password_expires_at.is_none());
}

#[tokio::test]
async fn delete_and_list_users() {
    let repo = SurrealUserRepository::new(setup().await);
    let a = repo.create(new_user("a@example.com")).await.unwrap();
    repo.create(new_user("b@example.com")).await.unwrap();
    repo.create(new_user("c@example.com")).await.unwrap();

    let page = repo
        .list(Pagination {
            offset: 0,
            limit: 2,
        })
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 2);

    let removed = repo.delete(a.id).await.unwrap();
    assert_eq!(removed.email, "a@example.com");
    assert!(repo.get_by_id(a.id).await.is_err());
    assert!(repo.delete(a.id).await.is_err());

    let page = repo.list(Pagination::default()).await.unwrap();
    assert_eq!(page.total, 2);
}
