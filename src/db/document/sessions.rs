use anyhow::{Context, Result};
use async_trait::async_trait;
use mongodb::Collection;
use mongodb::bson::{DateTime as BsonDateTime, doc, oid::ObjectId};
use serde::{Deserialize, Serialize};

use crate::db::SessionStore;
use crate::models::{Id, NewSession, Session, SessionChanges};

use super::users::document_key;
use super::{bson_now, to_bson_datetime, to_chrono_datetime};

const COLLECTION: &str = "sessions";

/// Embedded owner reference, stored as a subdocument rather than a foreign
/// key; the mapper folds it back into the flat domain shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct UserRefDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SessionDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user: UserRefDoc,
    pub hash: String,
    pub created_at: BsonDateTime,
    pub updated_at: BsonDateTime,
    pub deleted_at: Option<BsonDateTime>,
}

/// Pure translation from the stored document to the domain entity.
pub(crate) fn session_to_domain(doc: SessionDoc) -> Result<Session> {
    Ok(Session {
        id: Id::new(doc.id.to_hex()),
        user_id: Id::new(doc.user.id.to_hex()),
        hash: doc.hash,
        created_at: to_chrono_datetime(doc.created_at)?,
        updated_at: to_chrono_datetime(doc.updated_at)?,
        deleted_at: doc.deleted_at.map(to_chrono_datetime).transpose()?,
    })
}

/// Pure translation from the domain entity back to the document shape.
pub(crate) fn session_to_doc(session: &Session) -> Result<SessionDoc> {
    let id = document_key(&session.id)
        .ok_or_else(|| anyhow::anyhow!("Session id {} is not a document key", session.id))?;
    let user_id = document_key(&session.user_id).ok_or_else(|| {
        anyhow::anyhow!("Session user id {} is not a document key", session.user_id)
    })?;

    Ok(SessionDoc {
        id,
        user: UserRefDoc { id: user_id },
        hash: session.hash.clone(),
        created_at: to_bson_datetime(session.created_at),
        updated_at: to_bson_datetime(session.updated_at),
        deleted_at: session.deleted_at.map(to_bson_datetime),
    })
}

pub struct MongoSessionStore {
    collection: Collection<SessionDoc>,
}

impl MongoSessionStore {
    #[must_use]
    pub fn new(db: mongodb::Database) -> Self {
        Self {
            collection: db.collection(COLLECTION),
        }
    }
}

#[async_trait]
impl SessionStore for MongoSessionStore {
    async fn create(&self, data: NewSession) -> Result<Session> {
        let user_id = document_key(&data.user_id).ok_or_else(|| {
            anyhow::anyhow!("Session user id {} is not a document key", data.user_id)
        })?;
        let now = bson_now();

        let doc = SessionDoc {
            id: ObjectId::new(),
            user: UserRefDoc { id: user_id },
            hash: data.hash,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        self.collection
            .insert_one(&doc)
            .await
            .context("Failed to insert session document")?;

        session_to_domain(doc)
    }

    async fn find_by_id(&self, id: &Id) -> Result<Option<Session>> {
        let Some(key) = document_key(id) else {
            return Ok(None);
        };

        let doc = self
            .collection
            .find_one(doc! { "_id": key })
            .await
            .context("Failed to query session document by id")?;

        doc.map(session_to_domain).transpose()
    }

    async fn update(&self, id: &Id, changes: SessionChanges) -> Result<Option<Session>> {
        let Some(key) = document_key(id) else {
            return Ok(None);
        };

        let filter = doc! { "_id": key };
        let Some(existing) = self
            .collection
            .find_one(filter.clone())
            .await
            .context("Failed to query session document for update")?
        else {
            return Ok(None);
        };

        let mut session = session_to_domain(existing)?;
        if let Some(user_id) = changes.user_id {
            session.user_id = user_id;
        }
        if let Some(hash) = changes.hash {
            session.hash = hash;
        }
        session.updated_at = chrono::Utc::now();

        let replacement = session_to_doc(&session)?;
        self.collection
            .replace_one(filter, &replacement)
            .await
            .context("Failed to update session document")?;

        session_to_domain(replacement).map(Some)
    }

    async fn rotate_hash(&self, id: &Id, current_hash: &str, new_hash: &str) -> Result<bool> {
        let Some(key) = document_key(id) else {
            return Ok(false);
        };

        // Single conditional update; the hash filter makes rotation
        // exactly-once when two refresh calls race on the same secret.
        let result = self
            .collection
            .update_one(
                doc! { "_id": key, "hash": current_hash },
                doc! { "$set": { "hash": new_hash, "updatedAt": bson_now() } },
            )
            .await
            .context("Failed to rotate session hash")?;

        Ok(result.matched_count == 1)
    }

    async fn delete_by_id(&self, id: &Id) -> Result<()> {
        let Some(key) = document_key(id) else {
            return Ok(());
        };

        self.collection
            .delete_one(doc! { "_id": key })
            .await
            .context("Failed to delete session document")?;

        Ok(())
    }

    async fn delete_by_user_id(&self, user_id: &Id) -> Result<()> {
        let Some(user_key) = document_key(user_id) else {
            return Ok(());
        };

        self.collection
            .delete_many(doc! { "user._id": user_key })
            .await
            .context("Failed to delete session documents by user")?;

        Ok(())
    }

    async fn delete_by_user_id_excluding(
        &self,
        user_id: &Id,
        exclude_session_id: &Id,
    ) -> Result<()> {
        let Some(user_key) = document_key(user_id) else {
            return Ok(());
        };

        let mut filter = doc! { "user._id": user_key };
        if let Some(exclude_key) = document_key(exclude_session_id) {
            filter.insert("_id", doc! { "$ne": exclude_key });
        }

        self.collection
            .delete_many(filter)
            .await
            .context("Failed to delete other session documents")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_round_trips_through_the_domain_entity() {
        let now = bson_now();
        let doc = SessionDoc {
            id: ObjectId::new(),
            user: UserRefDoc {
                id: ObjectId::new(),
            },
            hash: "b".repeat(64),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let domain = session_to_domain(doc.clone()).unwrap();
        assert_eq!(domain.user_id, Id::new(doc.user.id.to_hex()));

        let back = session_to_doc(&domain).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn relational_id_cannot_name_a_session_document() {
        let session = Session {
            id: Id::from_int(7),
            user_id: Id::new(ObjectId::new().to_hex()),
            hash: "h".to_string(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
            deleted_at: None,
        };

        assert!(session_to_doc(&session).is_err());
    }
}
