//! Token verification strategies.
//!
//! Two independent, stateless verifiers run by the boundary layer before a
//! request reaches the auth service. Neither touches storage: a verified
//! access token is trusted for its full validity window even if its session
//! has since been deleted.

use anyhow::Result;
use jsonwebtoken::{DecodingKey, Validation, decode};

use crate::config::AuthConfig;

use super::{AccessClaims, RefreshClaims, TokenError};

/// Checks access-token signature and expiry with the access secret.
pub struct AccessTokenVerifier {
    key: DecodingKey,
}

impl AccessTokenVerifier {
    pub fn new(config: &AuthConfig) -> Result<Self> {
        if config.access_secret.is_empty() {
            anyhow::bail!("access token secret must be configured");
        }

        Ok(Self {
            key: DecodingKey::from_secret(config.access_secret.as_bytes()),
        })
    }

    /// Rejects bad signatures, expired tokens, and claim sets without a
    /// user identifier.
    pub fn verify(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let data = decode::<AccessClaims>(token, &self.key, &Validation::default())
            .map_err(|_| TokenError::Unauthorized)?;

        if data.claims.id.is_none() {
            return Err(TokenError::Unauthorized);
        }

        Ok(data.claims)
    }
}

/// Checks refresh-token signature and expiry with the refresh secret.
pub struct RefreshTokenVerifier {
    key: DecodingKey,
}

impl RefreshTokenVerifier {
    pub fn new(config: &AuthConfig) -> Result<Self> {
        if config.refresh_secret.is_empty() {
            anyhow::bail!("refresh token secret must be configured");
        }

        Ok(Self {
            key: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
        })
    }

    /// Rejects bad signatures, expired tokens, and claim sets without a
    /// session identifier.
    pub fn verify(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        let data = decode::<RefreshClaims>(token, &self.key, &Validation::default())
            .map_err(|_| TokenError::Unauthorized)?;

        if data.claims.session_id.is_none() {
            return Err(TokenError::Unauthorized);
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde::Serialize;

    fn test_config() -> AuthConfig {
        AuthConfig {
            access_secret: "verify-access-secret".to_string(),
            access_expires_secs: 900,
            refresh_secret: "verify-refresh-secret".to_string(),
            refresh_expires_secs: 60 * 60,
        }
    }

    fn sign<T: Serialize>(claims: &T, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn expired_access_token_is_rejected() {
        let config = test_config();
        let now = chrono::Utc::now().timestamp();
        let claims = AccessClaims {
            id: Some(crate::models::Id::from_int(1)),
            role: None,
            session_id: Some(crate::models::Id::from_int(2)),
            iat: now - 600,
            // Past the default 60s leeway.
            exp: now - 300,
        };

        let token = sign(&claims, &config.access_secret);
        assert!(
            AccessTokenVerifier::new(&config)
                .unwrap()
                .verify(&token)
                .is_err()
        );
    }

    #[test]
    fn access_claims_without_user_id_are_rejected() {
        let config = test_config();
        let now = chrono::Utc::now().timestamp();
        let claims = AccessClaims {
            id: None,
            role: None,
            session_id: Some(crate::models::Id::from_int(2)),
            iat: now,
            exp: now + 600,
        };

        let token = sign(&claims, &config.access_secret);
        assert!(
            AccessTokenVerifier::new(&config)
                .unwrap()
                .verify(&token)
                .is_err()
        );
    }

    #[test]
    fn refresh_claims_without_session_id_are_rejected() {
        let config = test_config();
        let now = chrono::Utc::now().timestamp();
        let claims = RefreshClaims {
            session_id: None,
            hash: Some("h".to_string()),
            iat: now,
            exp: now + 600,
        };

        let token = sign(&claims, &config.refresh_secret);
        assert!(
            RefreshTokenVerifier::new(&config)
                .unwrap()
                .verify(&token)
                .is_err()
        );
    }

    #[test]
    fn tampered_token_is_rejected() {
        let config = test_config();
        let now = chrono::Utc::now().timestamp();
        let claims = RefreshClaims {
            session_id: Some(crate::models::Id::from_int(9)),
            hash: Some("h".to_string()),
            iat: now,
            exp: now + 600,
        };

        let token = sign(&claims, "a-different-secret");
        assert!(
            RefreshTokenVerifier::new(&config)
                .unwrap()
                .verify(&token)
                .is_err()
        );
    }
}
