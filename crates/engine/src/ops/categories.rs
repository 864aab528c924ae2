use chrono::Utc;
use sea_orm::{
    ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{Category, EngineError, ResultEngine, categories, expenses};

use super::{Engine, normalize_optional_text, with_tx};

impl Engine {
    /// Lists the categories of `user_id`, ordered by name.
    pub async fn list_categories(&self, user_id: &str) -> ResultEngine<Vec<Category>> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let models = categories::Entity::find()
                .filter(categories::Column::UserId.eq(user_id.to_string()))
                .order_by_asc(categories::Column::Name)
                .all(&db_tx)
                .await?;
            Ok(models.into_iter().map(Category::from).collect())
        })
    }

    pub async fn create_category(
        &self,
        user_id: &str,
        name: &str,
        icon: Option<&str>,
        color: Option<&str>,
    ) -> ResultEngine<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::Validation(
                "category name must not be empty".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;

            let existing = categories::Entity::find()
                .filter(categories::Column::UserId.eq(user_id.to_string()))
                .filter(categories::Column::Name.eq(name))
                .one(&db_tx)
                .await?;
            if existing.is_some() {
                return Err(EngineError::ExistingKey(name.to_string()));
            }

            let model = categories::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                user_id: ActiveValue::Set(user_id.to_string()),
                name: ActiveValue::Set(name.to_string()),
                icon: ActiveValue::Set(normalize_optional_text(icon)),
                color: ActiveValue::Set(normalize_optional_text(color)),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;

            tracing::info!(
                "created category {} ({}) for {user_id}",
                model.name,
                model.id
            );
            Ok(Category::from(model))
        })
    }

    /// Deletes a category of `user_id`. Expenses pointing at it become
    /// uncategorized.
    ///
    /// Categories of other users are reported as missing.
    pub async fn delete_category(&self, user_id: &str, category_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;

            let model = categories::Entity::find_by_id(category_id)
                .filter(categories::Column::UserId.eq(user_id.to_string()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))?;

            expenses::Entity::update_many()
                .col_expr(
                    expenses::Column::CategoryId,
                    Expr::value(Option::<Uuid>::None),
                )
                .filter(expenses::Column::UserId.eq(user_id.to_string()))
                .filter(expenses::Column::CategoryId.eq(category_id))
                .exec(&db_tx)
                .await?;

            categories::Entity::delete_by_id(model.id)
                .exec(&db_tx)
                .await?;

            tracing::info!(
                "deleted category {} ({}) for {user_id}",
                model.name,
                model.id
            );
            Ok(())
        })
    }
}
