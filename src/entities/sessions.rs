use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Owning user.
    pub user_id: i32,

    /// Rotating session secret; replaced on every refresh.
    pub hash: String,

    pub created_at: String,

    pub updated_at: String,

    /// Soft-delete marker; live rows have NULL here.
    pub deleted_at: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
