//! Store-backed implementation of the `SessionService` trait.

use std::sync::Arc;

use async_trait::async_trait;

use crate::db::SessionStore;
use crate::models::{Id, NewSession, Session, SessionChanges};
use crate::services::session_service::{SessionError, SessionService};

pub struct DefaultSessionService {
    store: Arc<dyn SessionStore>,
}

impl DefaultSessionService {
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SessionService for DefaultSessionService {
    async fn find_by_id(&self, id: &Id) -> Result<Option<Session>, SessionError> {
        Ok(self.store.find_by_id(id).await?)
    }

    async fn create(&self, data: NewSession) -> Result<Session, SessionError> {
        Ok(self.store.create(data).await?)
    }

    async fn update(
        &self,
        id: &Id,
        changes: SessionChanges,
    ) -> Result<Option<Session>, SessionError> {
        Ok(self.store.update(id, changes).await?)
    }

    async fn rotate_hash(
        &self,
        id: &Id,
        current_hash: &str,
        new_hash: &str,
    ) -> Result<bool, SessionError> {
        Ok(self.store.rotate_hash(id, current_hash, new_hash).await?)
    }

    async fn delete_by_id(&self, id: &Id) -> Result<(), SessionError> {
        Ok(self.store.delete_by_id(id).await?)
    }

    async fn delete_by_user_id(&self, user_id: &Id) -> Result<(), SessionError> {
        Ok(self.store.delete_by_user_id(user_id).await?)
    }

    async fn delete_by_user_id_excluding(
        &self,
        user_id: &Id,
        exclude_session_id: &Id,
    ) -> Result<(), SessionError> {
        Ok(self
            .store
            .delete_by_user_id_excluding(user_id, exclude_session_id)
            .await?)
    }
}
