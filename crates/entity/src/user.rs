use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Registered account.
///
/// The password is stored only as a salted PBKDF2 hash; the raw value never
/// touches the database.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: String,

    #[sea_orm(unique)]
    pub email: String,

    pub name: String,

    #[serde(skip_serializing)]
    pub password_hash: Vec<u8>,

    #[serde(skip_serializing)]
    pub salt: Vec<u8>,

    /// PBKDF2 iteration count used when the hash was derived.
    pub password_iterations: i32,

    /// Unix timestamp (seconds).
    pub created_at: i64,

    /// Unix timestamp (seconds).
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
