//! Signed token support: issuing access/refresh pairs and the two
//! verification strategies the boundary layer runs before a request reaches
//! the auth service.
//!
//! Access and refresh tokens are HS256-signed JWTs with independently
//! configured secrets, so a leaked refresh secret cannot forge access tokens
//! and vice versa. Access tokens carry no server-side revocation; refresh
//! tokens are made single-use by session hash rotation.

pub mod issuer;
pub mod verify;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Id, RoleId};

pub use issuer::{TokenIssuer, TokenPair, generate_session_secret};
pub use verify::{AccessTokenVerifier, RefreshTokenVerifier};

/// Claims embedded in an access token.
///
/// Identity fields are optional at the wire level; the access verifier
/// rejects a claim set without a user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    #[serde(default)]
    pub id: Option<Id>,
    #[serde(default)]
    pub role: Option<RoleId>,
    #[serde(default)]
    pub session_id: Option<Id>,
    pub iat: i64,
    pub exp: i64,
}

/// Claims embedded in a refresh token.
///
/// The refresh verifier rejects a claim set without a session id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshClaims {
    #[serde(default)]
    pub session_id: Option<Id>,
    #[serde(default)]
    pub hash: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

/// Token-layer failures.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Bad signature, expired, or a claim set missing its identity field.
    #[error("Unauthorized")]
    Unauthorized,

    /// Signing failed. Only reachable through misconfiguration.
    #[error("Token signing failed: {0}")]
    Signing(String),
}
