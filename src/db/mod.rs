//! Storage layer.
//!
//! [`UserStore`] and [`SessionStore`] are the behavioral contracts both
//! backends satisfy; [`Stores::connect`] selects the backend exactly once at
//! startup from config. Nothing downstream of the factory branches on the
//! backend again.
//!
//! Write payloads (`NewUser`, `UserChanges`, `NewSession`, `SessionChanges`)
//! structurally exclude id and timestamp fields, so no caller can overwrite
//! backend-owned columns through an update.

pub mod document;
pub mod migrator;
pub mod relational;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::config::{DatabaseConfig, StorageBackend};
use crate::models::{
    Id, NewSession, NewUser, Pagination, Session, SessionChanges, User, UserChanges, UserFilter,
    UserSort,
};

/// Persistence contract for user records.
///
/// All lookups exclude soft-deleted users. Email values are case-normalized
/// (trimmed, lowercased) by the store on both write and lookup.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, data: NewUser) -> Result<User>;

    async fn find_by_id(&self, id: &Id) -> Result<Option<User>>;

    async fn find_by_ids(&self, ids: &[Id]) -> Result<Vec<User>>;

    /// Short-circuits to `None` on an empty email without querying storage.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_many_with_pagination(
        &self,
        filter: Option<&UserFilter>,
        sort: &[UserSort],
        pagination: &Pagination,
    ) -> Result<Vec<User>>;

    /// Partial update. Returns `None` when the id names no live record.
    async fn update(&self, id: &Id, changes: UserChanges) -> Result<Option<User>>;

    /// Soft delete. A removed user disappears from every lookup but the
    /// record is retained.
    async fn remove(&self, id: &Id) -> Result<()>;
}

/// Persistence contract for session records.
///
/// Deletion semantics differ per backend as a retention policy: the
/// relational backend soft-deletes (audit trail), the document backend
/// hard-deletes. Both agree that a deleted session is absent from
/// `find_by_id` and can no longer be rotated.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, data: NewSession) -> Result<Session>;

    async fn find_by_id(&self, id: &Id) -> Result<Option<Session>>;

    /// Partial update. Returns `None` when the id names no live record.
    async fn update(&self, id: &Id, changes: SessionChanges) -> Result<Option<Session>>;

    /// Conditional hash rotation: replaces the stored hash only if it still
    /// equals `current_hash`. Returns `false` when the session is gone or
    /// the hash was rotated concurrently, making rotation exactly-once
    /// under contention.
    async fn rotate_hash(&self, id: &Id, current_hash: &str, new_hash: &str) -> Result<bool>;

    /// Idempotent; deleting an absent session is not an error.
    async fn delete_by_id(&self, id: &Id) -> Result<()>;

    async fn delete_by_user_id(&self, user_id: &Id) -> Result<()>;

    /// Deletes every session of `user_id` except `exclude_session_id`.
    /// Used to log a user out of other devices while keeping the current
    /// one alive.
    async fn delete_by_user_id_excluding(
        &self,
        user_id: &Id,
        exclude_session_id: &Id,
    ) -> Result<()>;
}

/// Canonical email form used for storage and lookup.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Store handles for the backend selected at startup.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<dyn SessionStore>,
}

impl Stores {
    /// Connects the configured backend and returns its store handles.
    ///
    /// This is the single point where the relational/document choice is
    /// made; everything else programs against the traits.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        match config.backend {
            StorageBackend::Relational => {
                let store = relational::RelationalStore::connect(config).await?;
                info!("Storage backend: relational");
                Ok(Self {
                    users: Arc::new(relational::SeaOrmUserStore::new(store.conn.clone())),
                    sessions: Arc::new(relational::SeaOrmSessionStore::new(store.conn)),
                })
            }
            StorageBackend::Document => {
                let store = document::DocumentStore::connect(config).await?;
                info!("Storage backend: document");
                Ok(Self {
                    users: Arc::new(document::MongoUserStore::new(store.db.clone())),
                    sessions: Arc::new(document::MongoSessionStore::new(store.db)),
                })
            }
        }
    }
}
