//! Access/refresh token pair issuance.

use anyhow::Result;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::AuthConfig;
use crate::models::{Id, RoleId};

use super::{AccessClaims, RefreshClaims, TokenError};

/// A freshly signed token pair.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub token: String,
    pub refresh_token: String,
    /// Informational access-token expiry in epoch milliseconds, for
    /// client-side proactive refresh scheduling. The `exp` claim inside the
    /// token is what is actually enforced.
    pub token_expires: i64,
}

/// Signs access and refresh tokens from a small claim set.
///
/// Stateless; pure function of inputs and config. Construction is the only
/// failure point (missing secret), which callers treat as startup-fatal.
pub struct TokenIssuer {
    access_key: EncodingKey,
    refresh_key: EncodingKey,
    access_expires_secs: u64,
    refresh_expires_secs: u64,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Result<Self> {
        if config.access_secret.is_empty() || config.refresh_secret.is_empty() {
            anyhow::bail!("token secrets must be configured");
        }

        Ok(Self {
            access_key: EncodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_key: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            access_expires_secs: config.access_expires_secs,
            refresh_expires_secs: config.refresh_expires_secs,
        })
    }

    /// Signs a pair bound to `{user, role, session, hash}`.
    ///
    /// The refresh token embeds the session's current secret; after the next
    /// rotation the stored hash no longer matches and the token is dead.
    pub fn issue_pair(
        &self,
        user_id: &Id,
        role: Option<RoleId>,
        session_id: &Id,
        hash: &str,
    ) -> Result<TokenPair, TokenError> {
        let now = chrono::Utc::now();
        let iat = now.timestamp();

        let access_claims = AccessClaims {
            id: Some(user_id.clone()),
            role,
            session_id: Some(session_id.clone()),
            iat,
            exp: iat + self.access_expires_secs as i64,
        };

        let refresh_claims = RefreshClaims {
            session_id: Some(session_id.clone()),
            hash: Some(hash.to_string()),
            iat,
            exp: iat + self.refresh_expires_secs as i64,
        };

        let token = encode(&Header::default(), &access_claims, &self.access_key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        let refresh_token = encode(&Header::default(), &refresh_claims, &self.refresh_key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        let token_expires = now.timestamp_millis() + (self.access_expires_secs as i64) * 1000;

        Ok(TokenPair {
            token,
            refresh_token,
            token_expires,
        })
    }
}

/// Generates a fresh session secret.
///
/// The stored value is the SHA-256 digest of a random token, not the raw
/// random value, so a storage read never yields a reusable secret.
#[must_use]
pub fn generate_session_secret() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
