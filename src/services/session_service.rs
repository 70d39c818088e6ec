//! Domain service for session lifecycle.
//!
//! Thin orchestration over the session store: the service adds no policy of
//! its own, it gives the auth layer a storage-agnostic seam.

use thiserror::Error;

use crate::models::{Id, NewSession, Session, SessionChanges};

/// Errors specific to session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for SessionError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Domain service trait for sessions.
#[async_trait::async_trait]
pub trait SessionService: Send + Sync {
    async fn find_by_id(&self, id: &Id) -> Result<Option<Session>, SessionError>;

    async fn create(&self, data: NewSession) -> Result<Session, SessionError>;

    async fn update(
        &self,
        id: &Id,
        changes: SessionChanges,
    ) -> Result<Option<Session>, SessionError>;

    /// Conditional rotation; `false` means the stored hash no longer equals
    /// `current_hash` (already rotated or deleted).
    async fn rotate_hash(
        &self,
        id: &Id,
        current_hash: &str,
        new_hash: &str,
    ) -> Result<bool, SessionError>;

    /// Idempotent delete.
    async fn delete_by_id(&self, id: &Id) -> Result<(), SessionError>;

    /// Deletes every session owned by the user.
    async fn delete_by_user_id(&self, user_id: &Id) -> Result<(), SessionError>;

    /// Deletes every session owned by the user except one.
    async fn delete_by_user_id_excluding(
        &self,
        user_id: &Id,
        exclude_session_id: &Id,
    ) -> Result<(), SessionError>;
}
