//! Store-backed implementation of the `AuthService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::db::UserStore;
use crate::models::{Id, NewSession, NewUser, RoleId, StatusId};
use crate::services::auth_service::{
    AuthError, AuthService, LoginInput, LoginOutcome, RefreshOutcome, RegisterInput,
};
use crate::services::password::{hash_password, verify_password};
use crate::services::session_service::SessionService;
use crate::token::{TokenIssuer, generate_session_secret};

pub struct DefaultAuthService {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionService>,
    issuer: TokenIssuer,
}

impl DefaultAuthService {
    #[must_use]
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionService>,
        issuer: TokenIssuer,
    ) -> Self {
        Self {
            users,
            sessions,
            issuer,
        }
    }
}

#[async_trait]
impl AuthService for DefaultAuthService {
    async fn login(&self, input: LoginInput) -> Result<LoginOutcome, AuthError> {
        let user = self
            .users
            .find_by_email(&input.email)
            .await?
            .ok_or_else(|| AuthError::not_found("email", "notFound"))?;

        // A user without a local credential (social-only account) must fail
        // password login instead of comparing against nothing.
        let Some(stored_hash) = user.password_hash.as_deref() else {
            return Err(AuthError::invalid_credentials(
                "password",
                "incorrectPassword",
            ));
        };

        let is_valid = verify_password(&input.password, stored_hash)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        if !is_valid {
            return Err(AuthError::invalid_credentials(
                "password",
                "incorrectPassword",
            ));
        }

        let hash = generate_session_secret();

        let session = self
            .sessions
            .create(NewSession {
                user_id: user.id.clone(),
                hash: hash.clone(),
            })
            .await?;

        debug!(user_id = %user.id, session_id = %session.id, "login succeeded");

        let pair = self
            .issuer
            .issue_pair(&user.id, user.role, &session.id, &hash)?;

        Ok(LoginOutcome {
            token: pair.token,
            refresh_token: pair.refresh_token,
            token_expires: pair.token_expires,
            user,
        })
    }

    async fn register(&self, input: RegisterInput) -> Result<(), AuthError> {
        if self.users.find_by_email(&input.email).await?.is_some() {
            return Err(AuthError::conflict("email", "emailAlreadyExists"));
        }

        let password_hash = hash_password(&input.password)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        self.users
            .create(NewUser {
                email: Some(input.email),
                password_hash: Some(password_hash),
                social_id: None,
                first_name: input.first_name,
                last_name: input.last_name,
                role: Some(RoleId::USER),
                status: Some(StatusId::INACTIVE),
            })
            .await?;

        Ok(())
    }

    async fn refresh(
        &self,
        session_id: &Id,
        presented_hash: &str,
    ) -> Result<RefreshOutcome, AuthError> {
        let session = self
            .sessions
            .find_by_id(session_id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        if session.hash != presented_hash {
            return Err(AuthError::Unauthorized);
        }

        let user = self
            .users
            .find_by_id(&session.user_id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        // A role is mandatory for a valid access token.
        let Some(role) = user.role else {
            return Err(AuthError::Unauthorized);
        };

        let hash = generate_session_secret();

        // Conditional rotation: if another refresh with the same secret got
        // here first, the stored hash no longer matches and this call loses.
        let rotated = self
            .sessions
            .rotate_hash(&session.id, presented_hash, &hash)
            .await?;

        if !rotated {
            return Err(AuthError::Unauthorized);
        }

        debug!(session_id = %session.id, "session rotated");

        let pair = self
            .issuer
            .issue_pair(&session.user_id, Some(role), &session.id, &hash)?;

        Ok(RefreshOutcome {
            token: pair.token,
            refresh_token: pair.refresh_token,
            token_expires: pair.token_expires,
        })
    }

    async fn logout(&self, session_id: &Id) -> Result<(), AuthError> {
        self.sessions.delete_by_id(session_id).await?;
        Ok(())
    }

    async fn logout_other_devices(
        &self,
        user_id: &Id,
        keep_session_id: &Id,
    ) -> Result<(), AuthError> {
        self.sessions
            .delete_by_user_id_excluding(user_id, keep_session_id)
            .await?;
        Ok(())
    }
}
