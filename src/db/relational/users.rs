use anyhow::{Context, Result};
use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::db::{UserStore, normalize_email};
use crate::entities::users;
use crate::models::{
    Id, NewUser, Pagination, RoleId, SortOrder, StatusId, User, UserChanges, UserFilter, UserSort,
    UserSortField,
};

use super::{parse_optional_timestamp, parse_timestamp};

/// Pure translation from the relational row to the domain entity.
pub(crate) fn user_to_domain(model: users::Model) -> Result<User> {
    Ok(User {
        id: Id::from_int(i64::from(model.id)),
        email: model.email,
        password_hash: model.password_hash,
        social_id: model.social_id,
        first_name: model.first_name,
        last_name: model.last_name,
        role: model.role_id.map(RoleId),
        status: model.status_id.map(StatusId),
        created_at: parse_timestamp(&model.created_at)?,
        updated_at: parse_timestamp(&model.updated_at)?,
        deleted_at: parse_optional_timestamp(model.deleted_at.as_deref())?,
    })
}

/// Pure translation from the domain entity back to the row shape.
pub(crate) fn user_to_record(user: &User) -> Result<users::Model> {
    let id = relational_key(&user.id)
        .ok_or_else(|| anyhow::anyhow!("User id {} is not a relational key", user.id))?;

    Ok(users::Model {
        id,
        email: user.email.clone(),
        password_hash: user.password_hash.clone(),
        social_id: user.social_id.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        role_id: user.role.map(|r| r.0),
        status_id: user.status.map(|s| s.0),
        created_at: user.created_at.to_rfc3339(),
        updated_at: user.updated_at.to_rfc3339(),
        deleted_at: user.deleted_at.map(|t| t.to_rfc3339()),
    })
}

/// An opaque id only names a relational row if it parses as an integer key.
pub(crate) fn relational_key(id: &Id) -> Option<i32> {
    id.as_int().and_then(|v| i32::try_from(v).ok())
}

pub struct SeaOrmUserStore {
    conn: DatabaseConnection,
}

impl SeaOrmUserStore {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl UserStore for SeaOrmUserStore {
    async fn create(&self, data: NewUser) -> Result<User> {
        let now = chrono::Utc::now().to_rfc3339();

        let model = users::ActiveModel {
            email: Set(data.email.as_deref().map(normalize_email)),
            password_hash: Set(data.password_hash),
            social_id: Set(data.social_id),
            first_name: Set(data.first_name),
            last_name: Set(data.last_name),
            role_id: Set(data.role.map(|r| r.0)),
            status_id: Set(data.status.map(|s| s.0)),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            deleted_at: Set(None),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert user")?;

        user_to_domain(model)
    }

    async fn find_by_id(&self, id: &Id) -> Result<Option<User>> {
        let Some(key) = relational_key(id) else {
            return Ok(None);
        };

        let model = users::Entity::find()
            .filter(users::Column::Id.eq(key))
            .filter(users::Column::DeletedAt.is_null())
            .one(&self.conn)
            .await
            .context("Failed to query user by id")?;

        model.map(user_to_domain).transpose()
    }

    async fn find_by_ids(&self, ids: &[Id]) -> Result<Vec<User>> {
        let keys: Vec<i32> = ids.iter().filter_map(relational_key).collect();
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let models = users::Entity::find()
            .filter(users::Column::Id.is_in(keys))
            .filter(users::Column::DeletedAt.is_null())
            .all(&self.conn)
            .await
            .context("Failed to query users by ids")?;

        models.into_iter().map(user_to_domain).collect()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        if email.is_empty() {
            return Ok(None);
        }

        let model = users::Entity::find()
            .filter(users::Column::Email.eq(normalize_email(email)))
            .filter(users::Column::DeletedAt.is_null())
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        model.map(user_to_domain).transpose()
    }

    async fn find_many_with_pagination(
        &self,
        filter: Option<&UserFilter>,
        sort: &[UserSort],
        pagination: &Pagination,
    ) -> Result<Vec<User>> {
        let mut query = users::Entity::find().filter(users::Column::DeletedAt.is_null());

        if let Some(filter) = filter {
            if !filter.roles.is_empty() {
                let role_ids: Vec<i32> = filter.roles.iter().map(|r| r.0).collect();
                query = query.filter(users::Column::RoleId.is_in(role_ids));
            }
        }

        for criterion in sort {
            let column = match criterion.field {
                UserSortField::Id => users::Column::Id,
                UserSortField::Email => users::Column::Email,
                UserSortField::FirstName => users::Column::FirstName,
                UserSortField::LastName => users::Column::LastName,
                UserSortField::CreatedAt => users::Column::CreatedAt,
            };
            let order = match criterion.order {
                SortOrder::Asc => Order::Asc,
                SortOrder::Desc => Order::Desc,
            };
            query = query.order_by(column, order);
        }

        let models = query
            .offset(pagination.offset())
            .limit(pagination.limit)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        models.into_iter().map(user_to_domain).collect()
    }

    async fn update(&self, id: &Id, changes: UserChanges) -> Result<Option<User>> {
        let Some(key) = relational_key(id) else {
            return Ok(None);
        };

        let Some(model) = users::Entity::find()
            .filter(users::Column::Id.eq(key))
            .filter(users::Column::DeletedAt.is_null())
            .one(&self.conn)
            .await
            .context("Failed to query user for update")?
        else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = model.into();
        if let Some(email) = changes.email {
            active.email = Set(Some(normalize_email(&email)));
        }
        if let Some(hash) = changes.password_hash {
            active.password_hash = Set(Some(hash));
        }
        if let Some(first_name) = changes.first_name {
            active.first_name = Set(Some(first_name));
        }
        if let Some(last_name) = changes.last_name {
            active.last_name = Set(Some(last_name));
        }
        if let Some(role) = changes.role {
            active.role_id = Set(Some(role.0));
        }
        if let Some(status) = changes.status {
            active.status_id = Set(Some(status.0));
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update user")?;

        user_to_domain(model).map(Some)
    }

    async fn remove(&self, id: &Id) -> Result<()> {
        let Some(key) = relational_key(id) else {
            return Ok(());
        };

        users::Entity::update_many()
            .col_expr(
                users::Column::DeletedAt,
                Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(users::Column::Id.eq(key))
            .filter(users::Column::DeletedAt.is_null())
            .exec(&self.conn)
            .await
            .context("Failed to soft-delete user")?;

        Ok(())
    }
}
