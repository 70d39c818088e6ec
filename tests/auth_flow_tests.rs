//! End-to-end login / refresh / logout lifecycle over the relational
//! backend.

use gatehouse::config::Config;
use gatehouse::models::{Id, NewSession, NewUser, RoleId, StatusId};
use gatehouse::services::auth_service::{AuthError, LoginInput, RegisterInput};
use gatehouse::token::generate_session_secret;
use gatehouse::{AuthContext, bootstrap};

async fn spawn_context() -> AuthContext {
    let db_path =
        std::env::temp_dir().join(format!("gatehouse-auth-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.auth.access_secret = "test-access-secret".to_string();
    config.auth.refresh_secret = "test-refresh-secret".to_string();
    config.database.url = format!("sqlite:{}", db_path.display());

    bootstrap(config).await.expect("failed to bootstrap")
}

async fn register_and_login(
    ctx: &AuthContext,
    email: &str,
    password: &str,
) -> gatehouse::services::auth_service::LoginOutcome {
    ctx.auth
        .register(RegisterInput {
            email: email.to_string(),
            password: password.to_string(),
            first_name: Some("Test".to_string()),
            last_name: Some("User".to_string()),
        })
        .await
        .expect("registration failed");

    ctx.auth
        .login(LoginInput {
            email: email.to_string(),
            password: password.to_string(),
        })
        .await
        .expect("login failed")
}

/// Pulls `(session_id, hash)` out of a refresh token the way the boundary
/// layer would.
fn refresh_claims(ctx: &AuthContext, refresh_token: &str) -> (Id, String) {
    let claims = ctx
        .refresh_verifier
        .verify(refresh_token)
        .expect("refresh token failed verification");
    (claims.session_id.unwrap(), claims.hash.unwrap())
}

#[tokio::test]
async fn login_with_unknown_email_is_not_found() {
    let ctx = spawn_context().await;

    let err = ctx
        .auth
        .login(LoginInput {
            email: "a@x.com".to_string(),
            password: "secret1".to_string(),
        })
        .await
        .unwrap_err();

    match err {
        AuthError::NotFound { errors } => {
            assert_eq!(errors.get("email").map(String::as_str), Some("notFound"));
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn login_with_wrong_password_is_invalid_credentials() {
    let ctx = spawn_context().await;
    register_and_login(&ctx, "wrong-pass@example.com", "right-password").await;

    let err = ctx
        .auth
        .login(LoginInput {
            email: "wrong-pass@example.com".to_string(),
            password: "wrong-password".to_string(),
        })
        .await
        .unwrap_err();

    match err {
        AuthError::InvalidCredentials { errors } => {
            assert_eq!(
                errors.get("password").map(String::as_str),
                Some("incorrectPassword")
            );
        }
        other => panic!("expected InvalidCredentials, got {other:?}"),
    }
}

#[tokio::test]
async fn login_without_stored_password_is_invalid_credentials() {
    let ctx = spawn_context().await;

    // Social-only account: no local credential.
    ctx.stores
        .users
        .create(NewUser {
            email: Some("social-only@example.com".to_string()),
            password_hash: None,
            social_id: Some("provider-123".to_string()),
            role: Some(RoleId::USER),
            status: Some(StatusId::ACTIVE),
            ..Default::default()
        })
        .await
        .unwrap();

    let err = ctx
        .auth
        .login(LoginInput {
            email: "social-only@example.com".to_string(),
            password: "anything".to_string(),
        })
        .await
        .unwrap_err();

    match err {
        AuthError::InvalidCredentials { errors } => {
            assert_eq!(
                errors.get("password").map(String::as_str),
                Some("incorrectPassword")
            );
        }
        other => panic!("expected InvalidCredentials, got {other:?}"),
    }
}

#[tokio::test]
async fn login_binds_claims_to_user_and_stored_session() {
    let ctx = spawn_context().await;
    let outcome = register_and_login(&ctx, "claims@example.com", "secret1").await;

    let access = ctx.access_verifier.verify(&outcome.token).unwrap();
    assert_eq!(access.id.as_ref(), Some(&outcome.user.id));
    assert_eq!(access.role, Some(RoleId::USER));

    let (session_id, hash) = refresh_claims(&ctx, &outcome.refresh_token);
    assert_eq!(access.session_id.as_ref(), Some(&session_id));

    let session = ctx
        .sessions
        .find_by_id(&session_id)
        .await
        .unwrap()
        .expect("session missing after login");
    assert_eq!(session.hash, hash);
    assert_eq!(session.user_id, outcome.user.id);
}

#[tokio::test]
async fn refresh_is_single_use() {
    let ctx = spawn_context().await;
    let outcome = register_and_login(&ctx, "rotate@example.com", "secret1").await;
    let (session_id, old_hash) = refresh_claims(&ctx, &outcome.refresh_token);

    let refreshed = ctx.auth.refresh(&session_id, &old_hash).await.unwrap();

    // The session id survives rotation; only the secret changes.
    let (new_session_id, new_hash) = refresh_claims(&ctx, &refreshed.refresh_token);
    assert_eq!(new_session_id, session_id);
    assert_ne!(new_hash, old_hash);

    // Replaying the previous refresh token must fail.
    let err = ctx.auth.refresh(&session_id, &old_hash).await.unwrap_err();
    assert!(matches!(err, AuthError::Unauthorized));

    // The new secret is good for exactly one more rotation.
    ctx.auth.refresh(&session_id, &new_hash).await.unwrap();
}

#[tokio::test]
async fn logout_revokes_refresh_and_is_idempotent() {
    let ctx = spawn_context().await;
    let outcome = register_and_login(&ctx, "logout@example.com", "secret1").await;
    let (session_id, hash) = refresh_claims(&ctx, &outcome.refresh_token);

    ctx.auth.logout(&session_id).await.unwrap();

    let err = ctx.auth.refresh(&session_id, &hash).await.unwrap_err();
    assert!(matches!(err, AuthError::Unauthorized));

    // Second logout of the same session is not an error.
    ctx.auth.logout(&session_id).await.unwrap();
}

#[tokio::test]
async fn access_token_outlives_its_session() {
    let ctx = spawn_context().await;
    let outcome = register_and_login(&ctx, "stateless@example.com", "secret1").await;
    let (session_id, _) = refresh_claims(&ctx, &outcome.refresh_token);

    ctx.auth.logout(&session_id).await.unwrap();

    // The verifier never consults storage, so the access token still
    // verifies until it expires.
    assert!(ctx.access_verifier.verify(&outcome.token).is_ok());
}

#[tokio::test]
async fn registration_forces_defaults_and_normalizes_email() {
    let ctx = spawn_context().await;

    ctx.auth
        .register(RegisterInput {
            email: "  Mixed.Case@Example.COM ".to_string(),
            password: "secret1".to_string(),
            first_name: None,
            last_name: None,
        })
        .await
        .unwrap();

    let user = ctx
        .stores
        .users
        .find_by_email("mixed.case@example.com")
        .await
        .unwrap()
        .expect("registered user not found by normalized email");

    assert_eq!(user.role, Some(RoleId::USER));
    assert_eq!(user.status, Some(StatusId::INACTIVE));
    assert!(user.password_hash.is_some());
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let ctx = spawn_context().await;

    let input = RegisterInput {
        email: "dup@example.com".to_string(),
        password: "secret1".to_string(),
        first_name: None,
        last_name: None,
    };

    ctx.auth.register(input.clone()).await.unwrap();

    let err = ctx.auth.register(input).await.unwrap_err();
    match err {
        AuthError::Conflict { errors } => {
            assert_eq!(
                errors.get("email").map(String::as_str),
                Some("emailAlreadyExists")
            );
        }
        other => panic!("expected Conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn refresh_requires_a_user_with_a_role() {
    let ctx = spawn_context().await;

    let user = ctx
        .stores
        .users
        .create(NewUser {
            email: Some("roleless@example.com".to_string()),
            password_hash: None,
            role: None,
            status: Some(StatusId::ACTIVE),
            ..Default::default()
        })
        .await
        .unwrap();

    let hash = generate_session_secret();
    let session = ctx
        .sessions
        .create(NewSession {
            user_id: user.id,
            hash: hash.clone(),
        })
        .await
        .unwrap();

    let err = ctx.auth.refresh(&session.id, &hash).await.unwrap_err();
    assert!(matches!(err, AuthError::Unauthorized));
}

#[tokio::test]
async fn logout_other_devices_spares_the_current_session() {
    let ctx = spawn_context().await;
    let first = register_and_login(&ctx, "devices@example.com", "secret1").await;
    let (first_session, _) = refresh_claims(&ctx, &first.refresh_token);

    let second = ctx
        .auth
        .login(LoginInput {
            email: "devices@example.com".to_string(),
            password: "secret1".to_string(),
        })
        .await
        .unwrap();
    let (second_session, second_hash) = refresh_claims(&ctx, &second.refresh_token);

    ctx.auth
        .logout_other_devices(&second.user.id, &second_session)
        .await
        .unwrap();

    assert!(
        ctx.sessions
            .find_by_id(&first_session)
            .await
            .unwrap()
            .is_none()
    );

    // The kept session still refreshes.
    ctx.auth
        .refresh(&second_session, &second_hash)
        .await
        .unwrap();
}
