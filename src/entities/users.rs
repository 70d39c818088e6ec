use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Case-normalized, unique across non-deleted rows.
    #[sea_orm(unique)]
    pub email: Option<String>,

    /// Argon2id PHC string. Absent for social-only accounts.
    pub password_hash: Option<String>,

    pub social_id: Option<String>,

    pub first_name: Option<String>,

    pub last_name: Option<String>,

    /// Opaque role reference.
    pub role_id: Option<i32>,

    /// Opaque status reference.
    pub status_id: Option<i32>,

    pub created_at: String,

    pub updated_at: String,

    /// Soft-delete marker; live rows have NULL here.
    pub deleted_at: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
