//! User database entity for SeaORM.
//!
//! This is the only place that knows both the row shape and the domain
//! entity; everything else talks in `domain::User`.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use common::AppError;
use domain::{Email, User};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Stored normalized; unique among active rows (partial index)
    pub email: String,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub password_hash: String,
    /// false = soft deleted
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity
impl TryFrom<Model> for User {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let email = Email::parse(&model.email).map_err(|_| {
            AppError::internal(format!("stored email for user {} is malformed", model.id))
        })?;

        Ok(User::rehydrate(
            model.id,
            email,
            model.name,
            model.password_hash,
            model.is_active,
            model.created_at,
            model.updated_at,
        ))
    }
}

/// Convert domain entity to a fully populated active model
impl From<&User> for ActiveModel {
    fn from(user: &User) -> Self {
        ActiveModel {
            id: Set(user.id()),
            email: Set(user.email().as_str().to_string()),
            name: Set(user.name().to_string()),
            password_hash: Set(user.password_hash().to_string()),
            is_active: Set(user.is_active()),
            created_at: Set(user.created_at()),
            updated_at: Set(user.updated_at()),
        }
    }
}
