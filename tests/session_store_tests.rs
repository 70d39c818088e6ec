//! Session store behavior over the relational backend.

use gatehouse::config::DatabaseConfig;
use gatehouse::db::Stores;
use gatehouse::models::{Id, NewSession, NewUser, SessionChanges};

async fn spawn_stores() -> Stores {
    let db_path =
        std::env::temp_dir().join(format!("gatehouse-session-test-{}.db", uuid::Uuid::new_v4()));

    let config = DatabaseConfig {
        url: format!("sqlite:{}", db_path.display()),
        ..Default::default()
    };

    Stores::connect(&config).await.expect("failed to connect")
}

async fn create_user(stores: &Stores, email: &str) -> Id {
    stores
        .users
        .create(NewUser {
            email: Some(email.to_string()),
            ..Default::default()
        })
        .await
        .unwrap()
        .id
}

async fn create_session(stores: &Stores, user_id: &Id, hash: &str) -> Id {
    stores
        .sessions
        .create(NewSession {
            user_id: user_id.clone(),
            hash: hash.to_string(),
        })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn deleted_session_is_absent() {
    let stores = spawn_stores().await;
    let user = create_user(&stores, "absent@example.com").await;
    let session = create_session(&stores, &user, "h1").await;

    stores.sessions.delete_by_id(&session).await.unwrap();

    assert!(stores.sessions.find_by_id(&session).await.unwrap().is_none());

    // Idempotent: deleting again is fine.
    stores.sessions.delete_by_id(&session).await.unwrap();
}

#[tokio::test]
async fn delete_by_user_only_touches_that_user() {
    let stores = spawn_stores().await;
    let alice = create_user(&stores, "alice@example.com").await;
    let bob = create_user(&stores, "bob@example.com").await;

    let alice_session = create_session(&stores, &alice, "ha").await;
    let bob_session = create_session(&stores, &bob, "hb").await;

    stores.sessions.delete_by_user_id(&alice).await.unwrap();

    assert!(
        stores
            .sessions
            .find_by_id(&alice_session)
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        stores
            .sessions
            .find_by_id(&bob_session)
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn delete_by_user_excluding_spares_one_session() {
    let stores = spawn_stores().await;
    let user = create_user(&stores, "multi@example.com").await;

    let first = create_session(&stores, &user, "h1").await;
    let second = create_session(&stores, &user, "h2").await;
    let third = create_session(&stores, &user, "h3").await;

    stores
        .sessions
        .delete_by_user_id_excluding(&user, &second)
        .await
        .unwrap();

    assert!(stores.sessions.find_by_id(&first).await.unwrap().is_none());
    assert!(stores.sessions.find_by_id(&third).await.unwrap().is_none());

    let kept = stores
        .sessions
        .find_by_id(&second)
        .await
        .unwrap()
        .expect("excluded session must survive");
    assert_eq!(kept.hash, "h2");
}

#[tokio::test]
async fn rotate_hash_is_conditional_on_the_current_secret() {
    let stores = spawn_stores().await;
    let user = create_user(&stores, "cas@example.com").await;
    let session = create_session(&stores, &user, "original").await;

    // First rotation wins.
    assert!(
        stores
            .sessions
            .rotate_hash(&session, "original", "rotated-1")
            .await
            .unwrap()
    );

    // A competing rotation still presenting the old secret loses, and the
    // stored hash is untouched by the losing attempt.
    assert!(
        !stores
            .sessions
            .rotate_hash(&session, "original", "rotated-2")
            .await
            .unwrap()
    );

    let current = stores
        .sessions
        .find_by_id(&session)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.hash, "rotated-1");
}

#[tokio::test]
async fn rotate_hash_fails_for_deleted_sessions() {
    let stores = spawn_stores().await;
    let user = create_user(&stores, "gone@example.com").await;
    let session = create_session(&stores, &user, "h1").await;

    stores.sessions.delete_by_id(&session).await.unwrap();

    assert!(
        !stores
            .sessions
            .rotate_hash(&session, "h1", "h2")
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn update_replaces_the_hash_and_misses_unknown_ids() {
    let stores = spawn_stores().await;
    let user = create_user(&stores, "update@example.com").await;
    let session = create_session(&stores, &user, "before").await;

    let updated = stores
        .sessions
        .update(
            &session,
            SessionChanges {
                hash: Some("after".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .expect("session should exist");
    assert_eq!(updated.hash, "after");
    assert_eq!(updated.id, session);

    let missing = stores
        .sessions
        .update(
            &Id::from_int(999_999),
            SessionChanges {
                hash: Some("x".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(missing.is_none());
}
