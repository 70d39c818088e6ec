//! Authentication and login-session management for a multi-tenant backend.
//!
//! Issues short-lived access tokens and longer-lived refresh tokens, binds
//! each refresh token to a persisted session record with a rotating secret,
//! and lets a session be rotated or revoked without touching the user's
//! other sessions. User and session records live in either a relational or
//! a document store behind one behavioral contract, selected once at
//! startup.

pub mod config;
pub mod db;
pub mod entities;
pub mod models;
pub mod services;
pub mod token;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

pub use config::Config;
use db::Stores;
use services::{AuthService, DefaultAuthService, DefaultSessionService, SessionService};
use token::{AccessTokenVerifier, RefreshTokenVerifier, TokenIssuer};

/// Fully wired auth subsystem: services, stores, and the token verifiers
/// the boundary layer runs before requests reach the services.
pub struct AuthContext {
    pub auth: Arc<dyn AuthService>,
    pub sessions: Arc<dyn SessionService>,
    pub stores: Stores,
    pub access_verifier: AccessTokenVerifier,
    pub refresh_verifier: RefreshTokenVerifier,
}

/// Validates config, connects the configured storage backend, and builds
/// the service graph. Misconfiguration fails here, before any request.
pub async fn bootstrap(config: Config) -> Result<AuthContext> {
    config.validate()?;

    let stores = Stores::connect(&config.database).await?;

    let issuer = TokenIssuer::new(&config.auth)?;
    let access_verifier = AccessTokenVerifier::new(&config.auth)?;
    let refresh_verifier = RefreshTokenVerifier::new(&config.auth)?;

    let sessions: Arc<dyn SessionService> =
        Arc::new(DefaultSessionService::new(stores.sessions.clone()));
    let auth: Arc<dyn AuthService> = Arc::new(DefaultAuthService::new(
        stores.users.clone(),
        sessions.clone(),
        issuer,
    ));

    info!("Auth subsystem initialized");

    Ok(AuthContext {
        auth,
        sessions,
        stores,
        access_verifier,
        refresh_verifier,
    })
}

/// Installs a `tracing` subscriber honoring `RUST_LOG`, defaulting to
/// `info`. Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
