use anyhow::{Context, Result};
use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

use crate::db::SessionStore;
use crate::entities::sessions;
use crate::models::{Id, NewSession, Session, SessionChanges};

use super::users::relational_key;
use super::{parse_optional_timestamp, parse_timestamp};

/// Pure translation from the relational row to the domain entity.
pub(crate) fn session_to_domain(model: sessions::Model) -> Result<Session> {
    Ok(Session {
        id: Id::from_int(i64::from(model.id)),
        user_id: Id::from_int(i64::from(model.user_id)),
        hash: model.hash,
        created_at: parse_timestamp(&model.created_at)?,
        updated_at: parse_timestamp(&model.updated_at)?,
        deleted_at: parse_optional_timestamp(model.deleted_at.as_deref())?,
    })
}

/// Pure translation from the domain entity back to the row shape.
pub(crate) fn session_to_record(session: &Session) -> Result<sessions::Model> {
    let id = relational_key(&session.id)
        .ok_or_else(|| anyhow::anyhow!("Session id {} is not a relational key", session.id))?;
    let user_id = relational_key(&session.user_id).ok_or_else(|| {
        anyhow::anyhow!("Session user id {} is not a relational key", session.user_id)
    })?;

    Ok(sessions::Model {
        id,
        user_id,
        hash: session.hash.clone(),
        created_at: session.created_at.to_rfc3339(),
        updated_at: session.updated_at.to_rfc3339(),
        deleted_at: session.deleted_at.map(|t| t.to_rfc3339()),
    })
}

pub struct SeaOrmSessionStore {
    conn: DatabaseConnection,
}

impl SeaOrmSessionStore {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl SessionStore for SeaOrmSessionStore {
    async fn create(&self, data: NewSession) -> Result<Session> {
        let user_id = relational_key(&data.user_id).ok_or_else(|| {
            anyhow::anyhow!("Session user id {} is not a relational key", data.user_id)
        })?;
        let now = chrono::Utc::now().to_rfc3339();

        let model = sessions::ActiveModel {
            user_id: Set(user_id),
            hash: Set(data.hash),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            deleted_at: Set(None),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert session")?;

        session_to_domain(model)
    }

    async fn find_by_id(&self, id: &Id) -> Result<Option<Session>> {
        let Some(key) = relational_key(id) else {
            return Ok(None);
        };

        let model = sessions::Entity::find()
            .filter(sessions::Column::Id.eq(key))
            .filter(sessions::Column::DeletedAt.is_null())
            .one(&self.conn)
            .await
            .context("Failed to query session by id")?;

        model.map(session_to_domain).transpose()
    }

    async fn update(&self, id: &Id, changes: SessionChanges) -> Result<Option<Session>> {
        let Some(key) = relational_key(id) else {
            return Ok(None);
        };

        let Some(model) = sessions::Entity::find()
            .filter(sessions::Column::Id.eq(key))
            .filter(sessions::Column::DeletedAt.is_null())
            .one(&self.conn)
            .await
            .context("Failed to query session for update")?
        else {
            return Ok(None);
        };

        let mut active: sessions::ActiveModel = model.into();
        if let Some(user_id) = changes.user_id {
            let user_key = relational_key(&user_id).ok_or_else(|| {
                anyhow::anyhow!("Session user id {user_id} is not a relational key")
            })?;
            active.user_id = Set(user_key);
        }
        if let Some(hash) = changes.hash {
            active.hash = Set(hash);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update session")?;

        session_to_domain(model).map(Some)
    }

    async fn rotate_hash(&self, id: &Id, current_hash: &str, new_hash: &str) -> Result<bool> {
        let Some(key) = relational_key(id) else {
            return Ok(false);
        };

        // Single conditional update; the hash filter makes rotation
        // exactly-once when two refresh calls race on the same secret.
        let result = sessions::Entity::update_many()
            .col_expr(sessions::Column::Hash, Expr::value(new_hash))
            .col_expr(
                sessions::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(sessions::Column::Id.eq(key))
            .filter(sessions::Column::Hash.eq(current_hash))
            .filter(sessions::Column::DeletedAt.is_null())
            .exec(&self.conn)
            .await
            .context("Failed to rotate session hash")?;

        Ok(result.rows_affected == 1)
    }

    async fn delete_by_id(&self, id: &Id) -> Result<()> {
        let Some(key) = relational_key(id) else {
            return Ok(());
        };

        sessions::Entity::update_many()
            .col_expr(
                sessions::Column::DeletedAt,
                Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(sessions::Column::Id.eq(key))
            .filter(sessions::Column::DeletedAt.is_null())
            .exec(&self.conn)
            .await
            .context("Failed to soft-delete session")?;

        Ok(())
    }

    async fn delete_by_user_id(&self, user_id: &Id) -> Result<()> {
        let Some(user_key) = relational_key(user_id) else {
            return Ok(());
        };

        sessions::Entity::update_many()
            .col_expr(
                sessions::Column::DeletedAt,
                Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(sessions::Column::UserId.eq(user_key))
            .filter(sessions::Column::DeletedAt.is_null())
            .exec(&self.conn)
            .await
            .context("Failed to soft-delete sessions by user")?;

        Ok(())
    }

    async fn delete_by_user_id_excluding(
        &self,
        user_id: &Id,
        exclude_session_id: &Id,
    ) -> Result<()> {
        let Some(user_key) = relational_key(user_id) else {
            return Ok(());
        };

        let mut query = sessions::Entity::update_many()
            .col_expr(
                sessions::Column::DeletedAt,
                Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(sessions::Column::UserId.eq(user_key))
            .filter(sessions::Column::DeletedAt.is_null());

        if let Some(exclude_key) = relational_key(exclude_session_id) {
            query = query.filter(sessions::Column::Id.ne(exclude_key));
        }

        query
            .exec(&self.conn)
            .await
            .context("Failed to soft-delete other sessions")?;

        Ok(())
    }
}
