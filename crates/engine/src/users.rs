//! Users table (minimal entity).
//!
//! Expenses are owned by `user_id`, which is the username.

use sea_orm::entity::prelude::*;

use crate::{EngineError, ResultEngine};

/// Checks a username before it is registered and returns it trimmed.
///
/// The username names the folder receipts are stored under and travels in a
/// Basic `Authorization` header, so path separators, `.`, `..` and `:` are
/// refused.
pub fn validate_username(username: &str) -> ResultEngine<&str> {
    let username = username.trim();
    if username.is_empty()
        || username == "."
        || username == ".."
        || username.contains(['/', '\\', '\0', ':'])
    {
        return Err(EngineError::Validation(format!(
            "invalid username: {username:?}"
        )));
    }
    Ok(username)
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub username: String,
    pub password: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::categories::Entity")]
    Categories,
    #[sea_orm(has_many = "super::expenses::Entity")]
    Expenses,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
