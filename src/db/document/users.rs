use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::Collection;
use mongodb::bson::{Bson, DateTime as BsonDateTime, Document, doc, oid::ObjectId};
use serde::{Deserialize, Serialize};

use crate::db::{UserStore, normalize_email};
use crate::models::{
    Id, NewUser, Pagination, RoleId, SortOrder, StatusId, User, UserChanges, UserFilter, UserSort,
    UserSortField,
};

use super::{bson_now, to_bson_datetime, to_chrono_datetime};

const COLLECTION: &str = "users";

/// Embedded role/status reference; the referenced id is kept in its string
/// form inside the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct RefDoc {
    #[serde(rename = "_id")]
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub email: Option<String>,
    pub password: Option<String>,
    pub social_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<RefDoc>,
    pub status: Option<RefDoc>,
    pub created_at: BsonDateTime,
    pub updated_at: BsonDateTime,
    pub deleted_at: Option<BsonDateTime>,
}

/// Pure translation from the stored document to the domain entity.
pub(crate) fn user_to_domain(doc: UserDoc) -> Result<User> {
    Ok(User {
        id: Id::new(doc.id.to_hex()),
        email: doc.email,
        password_hash: doc.password,
        social_id: doc.social_id,
        first_name: doc.first_name,
        last_name: doc.last_name,
        role: doc.role.map(|r| parse_ref(&r.id)).transpose()?.map(RoleId),
        status: doc
            .status
            .map(|s| parse_ref(&s.id))
            .transpose()?
            .map(StatusId),
        created_at: to_chrono_datetime(doc.created_at)?,
        updated_at: to_chrono_datetime(doc.updated_at)?,
        deleted_at: doc.deleted_at.map(to_chrono_datetime).transpose()?,
    })
}

/// Pure translation from the domain entity back to the document shape.
pub(crate) fn user_to_doc(user: &User) -> Result<UserDoc> {
    let id = document_key(&user.id)
        .ok_or_else(|| anyhow::anyhow!("User id {} is not a document key", user.id))?;

    Ok(UserDoc {
        id,
        email: user.email.clone(),
        password: user.password_hash.clone(),
        social_id: user.social_id.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        role: user.role.map(|r| RefDoc {
            id: r.0.to_string(),
        }),
        status: user.status.map(|s| RefDoc {
            id: s.0.to_string(),
        }),
        created_at: to_bson_datetime(user.created_at),
        updated_at: to_bson_datetime(user.updated_at),
        deleted_at: user.deleted_at.map(to_bson_datetime),
    })
}

fn parse_ref(raw: &str) -> Result<i32> {
    raw.parse()
        .map_err(|_| anyhow::anyhow!("Invalid stored reference id: {raw:?}"))
}

/// An opaque id only names a document if it parses as an ObjectId.
pub(crate) fn document_key(id: &Id) -> Option<ObjectId> {
    ObjectId::parse_str(id.as_str()).ok()
}

pub struct MongoUserStore {
    collection: Collection<UserDoc>,
}

impl MongoUserStore {
    #[must_use]
    pub fn new(db: mongodb::Database) -> Self {
        Self {
            collection: db.collection(COLLECTION),
        }
    }

    fn live_filter(extra: Document) -> Document {
        let mut filter = extra;
        filter.insert("deletedAt", Bson::Null);
        filter
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn create(&self, data: NewUser) -> Result<User> {
        let now = bson_now();
        let doc = UserDoc {
            id: ObjectId::new(),
            email: data.email.as_deref().map(normalize_email),
            password: data.password_hash,
            social_id: data.social_id,
            first_name: data.first_name,
            last_name: data.last_name,
            role: data.role.map(|r| RefDoc {
                id: r.0.to_string(),
            }),
            status: data.status.map(|s| RefDoc {
                id: s.0.to_string(),
            }),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        self.collection
            .insert_one(&doc)
            .await
            .context("Failed to insert user document")?;

        user_to_domain(doc)
    }

    async fn find_by_id(&self, id: &Id) -> Result<Option<User>> {
        let Some(key) = document_key(id) else {
            return Ok(None);
        };

        let doc = self
            .collection
            .find_one(Self::live_filter(doc! { "_id": key }))
            .await
            .context("Failed to query user document by id")?;

        doc.map(user_to_domain).transpose()
    }

    async fn find_by_ids(&self, ids: &[Id]) -> Result<Vec<User>> {
        let keys: Vec<ObjectId> = ids.iter().filter_map(document_key).collect();
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let cursor = self
            .collection
            .find(Self::live_filter(doc! { "_id": { "$in": keys } }))
            .await
            .context("Failed to query user documents by ids")?;

        let docs: Vec<UserDoc> = cursor
            .try_collect()
            .await
            .context("Failed to read user documents")?;

        docs.into_iter().map(user_to_domain).collect()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        if email.is_empty() {
            return Ok(None);
        }

        let doc = self
            .collection
            .find_one(Self::live_filter(doc! { "email": normalize_email(email) }))
            .await
            .context("Failed to query user document by email")?;

        doc.map(user_to_domain).transpose()
    }

    async fn find_many_with_pagination(
        &self,
        filter: Option<&UserFilter>,
        sort: &[UserSort],
        pagination: &Pagination,
    ) -> Result<Vec<User>> {
        let mut query = Document::new();
        if let Some(filter) = filter {
            if !filter.roles.is_empty() {
                let role_ids: Vec<String> =
                    filter.roles.iter().map(|r| r.0.to_string()).collect();
                query.insert("role._id", doc! { "$in": role_ids });
            }
        }

        let mut sort_doc = Document::new();
        for criterion in sort {
            let field = match criterion.field {
                UserSortField::Id => "_id",
                UserSortField::Email => "email",
                UserSortField::FirstName => "firstName",
                UserSortField::LastName => "lastName",
                UserSortField::CreatedAt => "createdAt",
            };
            let direction = match criterion.order {
                SortOrder::Asc => 1,
                SortOrder::Desc => -1,
            };
            sort_doc.insert(field, direction);
        }

        let mut find = self.collection.find(Self::live_filter(query));
        if !sort_doc.is_empty() {
            find = find.sort(sort_doc);
        }

        let cursor = find
            .skip(pagination.offset())
            .limit(i64::try_from(pagination.limit).unwrap_or(i64::MAX))
            .await
            .context("Failed to list user documents")?;

        let docs: Vec<UserDoc> = cursor
            .try_collect()
            .await
            .context("Failed to read user documents")?;

        docs.into_iter().map(user_to_domain).collect()
    }

    async fn update(&self, id: &Id, changes: UserChanges) -> Result<Option<User>> {
        let Some(key) = document_key(id) else {
            return Ok(None);
        };

        let filter = Self::live_filter(doc! { "_id": key });
        let Some(existing) = self
            .collection
            .find_one(filter.clone())
            .await
            .context("Failed to query user document for update")?
        else {
            return Ok(None);
        };

        let mut user = user_to_domain(existing)?;
        if let Some(email) = changes.email {
            user.email = Some(normalize_email(&email));
        }
        if let Some(hash) = changes.password_hash {
            user.password_hash = Some(hash);
        }
        if let Some(first_name) = changes.first_name {
            user.first_name = Some(first_name);
        }
        if let Some(last_name) = changes.last_name {
            user.last_name = Some(last_name);
        }
        if let Some(role) = changes.role {
            user.role = Some(role);
        }
        if let Some(status) = changes.status {
            user.status = Some(status);
        }
        user.updated_at = chrono::Utc::now();

        let replacement = user_to_doc(&user)?;
        self.collection
            .replace_one(filter, &replacement)
            .await
            .context("Failed to update user document")?;

        user_to_domain(replacement).map(Some)
    }

    async fn remove(&self, id: &Id) -> Result<()> {
        let Some(key) = document_key(id) else {
            return Ok(());
        };

        self.collection
            .update_one(
                Self::live_filter(doc! { "_id": key }),
                doc! { "$set": { "deletedAt": bson_now() } },
            )
            .await
            .context("Failed to soft-delete user document")?;

        Ok(())
    }
}
