//! Domain service for authentication and the login-session lifecycle.
//!
//! Handles credential verification, token issuance, session rotation on
//! refresh, and session removal on logout.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Id, User};
use crate::services::session_service::SessionError;
use crate::token::TokenError;

/// Errors specific to authentication operations.
///
/// Lookup and credential failures carry a `{field: code}` detail map; the
/// codes are stable identifiers for the boundary layer, not display text.
/// All session/claim failures collapse to [`AuthError::Unauthorized`] so a
/// response never distinguishes "no such session" from "wrong hash".
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not found")]
    NotFound { errors: HashMap<String, String> },

    #[error("Invalid credentials")]
    InvalidCredentials { errors: HashMap<String, String> },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Conflict")]
    Conflict { errors: HashMap<String, String> },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    fn detail(field: &str, code: &str) -> HashMap<String, String> {
        HashMap::from([(field.to_string(), code.to_string())])
    }

    #[must_use]
    pub fn not_found(field: &str, code: &str) -> Self {
        Self::NotFound {
            errors: Self::detail(field, code),
        }
    }

    #[must_use]
    pub fn invalid_credentials(field: &str, code: &str) -> Self {
        Self::InvalidCredentials {
            errors: Self::detail(field, code),
        }
    }

    #[must_use]
    pub fn conflict(field: &str, code: &str) -> Self {
        Self::Conflict {
            errors: Self::detail(field, code),
        }
    }

    /// Field-level details, when the error kind carries them.
    #[must_use]
    pub fn errors(&self) -> Option<&HashMap<String, String>> {
        match self {
            Self::NotFound { errors }
            | Self::InvalidCredentials { errors }
            | Self::Conflict { errors } => Some(errors),
            _ => None,
        }
    }

    /// Structured body for the boundary layer: a stable kind plus the
    /// optional detail map.
    #[must_use]
    pub fn to_body(&self) -> serde_json::Value {
        let kind = match self {
            Self::NotFound { .. } => "notFound",
            Self::InvalidCredentials { .. } => "invalidCredentials",
            Self::Unauthorized => "unauthorized",
            Self::Conflict { .. } => "conflict",
            Self::Database(_) => "database",
            Self::Internal(_) => "internal",
        };

        match self.errors() {
            Some(errors) => serde_json::json!({ "kind": kind, "errors": errors }),
            None => serde_json::json!({ "kind": kind }),
        }
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<SessionError> for AuthError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Database(msg) => Self::Database(msg),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Unauthorized => Self::Unauthorized,
            TokenError::Signing(msg) => Self::Internal(msg),
        }
    }
}

/// Validated login payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Validated registration payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Login response: token pair plus the authenticated user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutcome {
    pub token: String,
    pub refresh_token: String,
    /// Informational access-token expiry in epoch milliseconds.
    pub token_expires: i64,
    pub user: User,
}

/// Refresh response. Deliberately omits the user: the caller already has it
/// from the original login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshOutcome {
    pub token: String,
    pub refresh_token: String,
    pub token_expires: i64,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials, creates a session, and issues a token pair.
    async fn login(&self, input: LoginInput) -> Result<LoginOutcome, AuthError>;

    /// Creates an account. Role and status are forced to their defaults
    /// regardless of caller input; a caller cannot self-elevate or
    /// self-activate at registration time.
    async fn register(&self, input: RegisterInput) -> Result<(), AuthError>;

    /// Rotates the session secret and issues a fresh token pair. The
    /// presented hash becomes permanently invalid on success, which is what
    /// makes each refresh token single-use.
    async fn refresh(
        &self,
        session_id: &Id,
        presented_hash: &str,
    ) -> Result<RefreshOutcome, AuthError>;

    /// Deletes the session. Idempotent; revokes future refreshes but not
    /// outstanding access tokens.
    async fn logout(&self, session_id: &Id) -> Result<(), AuthError>;

    /// Deletes every other session of the user, keeping the current device
    /// logged in.
    async fn logout_other_devices(
        &self,
        user_id: &Id,
        keep_session_id: &Id,
    ) -> Result<(), AuthError>;
}
