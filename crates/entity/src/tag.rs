use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A label a user attaches to notes.
///
/// Names are unique per user; the `(user_id, name)` unique index in the
/// schema is the authority, not application-level checks.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tags")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: String,

    pub user_id: String,

    pub name: String,

    /// Unix timestamp (seconds).
    pub created_at: i64,

    /// Unix timestamp (seconds).
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
