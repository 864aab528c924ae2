use sea_orm::{ConnectionTrait, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{BlobStore, EngineError, ResultEngine, categories, expenses, users};

use super::Engine;

impl Engine {
    /// Fails with `NotAuthenticated` unless `user_id` names a known user.
    pub(super) async fn require_user<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
    ) -> ResultEngine<()> {
        if user_id.trim().is_empty() {
            return Err(EngineError::NotAuthenticated);
        }
        users::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await?
            .map(|_| ())
            .ok_or(EngineError::NotAuthenticated)
    }

    /// Loads an expense owned by `user_id`.
    ///
    /// Expenses of other users are reported as missing.
    pub(super) async fn require_expense<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
        expense_id: Uuid,
    ) -> ResultEngine<expenses::Model> {
        expenses::Entity::find_by_id(expense_id)
            .filter(expenses::Column::UserId.eq(user_id.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("expense not exists".to_string()))
    }

    /// Loads a category of `user_id` referenced by an expense form.
    ///
    /// Categories of other users are reported as unknown.
    pub(super) async fn require_category<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
        category_id: Uuid,
    ) -> ResultEngine<categories::Model> {
        categories::Entity::find_by_id(category_id)
            .filter(categories::Column::UserId.eq(user_id.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::Validation(format!("unknown category: {category_id}")))
    }
}

/// Deletes a blob whose expense no longer points at it.
///
/// Failures are logged and swallowed: the database change they follow has
/// already happened.
pub(super) async fn discard_blob<B: BlobStore>(blobs: &B, url: &str) {
    if let Err(err) = blobs.delete(url).await {
        tracing::warn!("failed to delete attachment {url}: {err}");
    }
}
