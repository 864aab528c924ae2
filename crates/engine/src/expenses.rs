//! Expense primitives.
//!
//! An `Expense` is a single recorded payment owned by exactly one user. It
//! carries an optional category and an optional receipt attachment.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Currency, ResultEngine,
    categories::{self, Category, UNCATEGORIZED},
    money::validate_amount,
};

/// Receipt stored in the blob store.
///
/// The three fields are always set or cleared together.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Public retrieval URL returned by the blob store.
    pub url: String,
    /// Original file name as uploaded.
    pub name: String,
    pub content_type: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub user_id: String,
    pub amount: f64,
    pub currency: Currency,
    pub category_id: Option<Uuid>,
    /// Joined category, filled when the expense is read from the database.
    pub category: Option<Category>,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub attachment: Option<Attachment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    pub fn new(
        user_id: String,
        amount: f64,
        currency: Currency,
        date: NaiveDate,
    ) -> ResultEngine<Self> {
        let amount = validate_amount(amount)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            amount,
            currency,
            category_id: None,
            category: None,
            date,
            description: None,
            attachment: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Display label of the category, "Uncategorized" when missing.
    #[must_use]
    pub fn category_label(&self) -> &str {
        self.category
            .as_ref()
            .map_or(UNCATEGORIZED, |category| category.name.as_str())
    }

    pub(crate) fn from_models(
        model: Model,
        category: Option<categories::Model>,
    ) -> ResultEngine<Self> {
        let attachment = match (model.attachment_url, model.attachment_name, model.attachment_type)
        {
            (Some(url), Some(name), Some(content_type)) => Some(Attachment {
                url,
                name,
                content_type,
            }),
            _ => None,
        };

        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            amount: model.amount,
            currency: Currency::try_from(model.currency.as_str())?,
            category_id: model.category_id,
            category: category.map(Category::from),
            date: model.date,
            description: model.description,
            attachment,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    #[sea_orm(column_type = "Double")]
    pub amount: f64,
    pub currency: String,
    pub category_id: Option<Uuid>,
    pub date: Date,
    pub description: Option<String>,
    pub attachment_url: Option<String>,
    pub attachment_name: Option<String>,
    pub attachment_type: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Username",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Expense> for ActiveModel {
    fn from(expense: &Expense) -> Self {
        let (url, name, content_type) = match &expense.attachment {
            Some(attachment) => (
                Some(attachment.url.clone()),
                Some(attachment.name.clone()),
                Some(attachment.content_type.clone()),
            ),
            None => (None, None, None),
        };

        Self {
            id: ActiveValue::Set(expense.id),
            user_id: ActiveValue::Set(expense.user_id.clone()),
            amount: ActiveValue::Set(expense.amount),
            currency: ActiveValue::Set(expense.currency.code().to_string()),
            category_id: ActiveValue::Set(expense.category_id),
            date: ActiveValue::Set(expense.date),
            description: ActiveValue::Set(expense.description.clone()),
            attachment_url: ActiveValue::Set(url),
            attachment_name: ActiveValue::Set(name),
            attachment_type: ActiveValue::Set(content_type),
            created_at: ActiveValue::Set(expense.created_at),
            updated_at: ActiveValue::Set(expense.updated_at),
        }
    }
}
