use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    AttachmentChange, BlobStore, CreateExpenseCmd, Expense, ExpenseFilter, ExpenseSort,
    ExpenseStats, Page, ResultEngine, UpdateExpenseCmd, categories, expenses,
    filter::{ApplyExpenseFilters, validate_filter},
    money::validate_amount,
    paginate, sort_expenses, stats,
};

use super::{Engine, access::discard_blob, normalize_optional_text, with_tx};

impl Engine {
    /// Lists the expenses of `user_id` matching `filter`.
    ///
    /// Most recent first; expenses on the same date are ordered by creation
    /// time, newest first.
    pub async fn list_expenses(
        &self,
        user_id: &str,
        filter: &ExpenseFilter,
    ) -> ResultEngine<Vec<Expense>> {
        validate_filter(filter)?;

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;

            let rows = expenses::Entity::find()
                .filter(expenses::Column::UserId.eq(user_id.to_string()))
                .apply_expense_filters(filter)
                .order_by_desc(expenses::Column::Date)
                .order_by_desc(expenses::Column::CreatedAt)
                .find_also_related(categories::Entity)
                .all(&db_tx)
                .await?;

            let mut out = Vec::with_capacity(rows.len());
            for (model, category) in rows {
                let expense = Expense::from_models(model, category)?;
                if filter.matches(&expense) {
                    out.push(expense);
                }
            }
            Ok(out)
        })
    }

    /// Returns one expense of `user_id`.
    pub async fn expense(&self, user_id: &str, expense_id: Uuid) -> ResultEngine<Expense> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let model = self.require_expense(&db_tx, user_id, expense_id).await?;
            load_expense(&db_tx, model).await
        })
    }

    /// Aggregated statistics over the expenses matching `filter`.
    ///
    /// `today` selects the month used for the monthly totals.
    pub async fn expense_stats(
        &self,
        user_id: &str,
        filter: &ExpenseFilter,
        today: NaiveDate,
    ) -> ResultEngine<ExpenseStats> {
        let expenses = self.list_expenses(user_id, filter).await?;
        Ok(stats::aggregate(&expenses, today))
    }

    /// One page of the filtered expenses, in `sort` order.
    pub async fn expense_page(
        &self,
        user_id: &str,
        filter: &ExpenseFilter,
        sort: ExpenseSort,
        page_size: usize,
        page: usize,
    ) -> ResultEngine<Page<Expense>> {
        let mut expenses = self.list_expenses(user_id, filter).await?;
        sort_expenses(&mut expenses, sort);
        paginate(&expenses, page_size, page)
    }

    /// Records a new expense, uploading its receipt first when present.
    ///
    /// If the row cannot be stored the uploaded receipt is removed again.
    pub async fn create_expense<B: BlobStore>(
        &self,
        cmd: CreateExpenseCmd,
        blobs: &B,
    ) -> ResultEngine<Expense> {
        let CreateExpenseCmd {
            user_id,
            amount,
            currency,
            date,
            category_id,
            description,
            attachment,
        } = cmd;
        let mut expense = Expense::new(user_id, amount, currency, date)?;
        expense.description = normalize_optional_text(description.as_deref());
        expense.category_id = category_id;
        if let Some(upload) = &attachment {
            upload.validate()?;
        }

        let mut uploaded: Option<String> = None;
        let result: ResultEngine<Expense> = async {
            with_tx!(self, |db_tx| {
                self.require_user(&db_tx, &expense.user_id).await?;
                let category = match expense.category_id {
                    Some(id) => Some(
                        self.require_category(&db_tx, &expense.user_id, id)
                            .await?,
                    ),
                    None => None,
                };

                if let Some(upload) = &attachment {
                    let stored = blobs.upload(&expense.user_id, upload).await?;
                    uploaded = Some(stored.url.clone());
                    expense.attachment = Some(stored);
                }

                let model = expenses::ActiveModel::from(&expense)
                    .insert(&db_tx)
                    .await?;
                Expense::from_models(model, category)
            })
        }
        .await;

        match result {
            Ok(expense) => {
                tracing::info!(
                    "created expense {} for {} ({} {})",
                    expense.id,
                    expense.user_id,
                    expense.amount,
                    expense.currency
                );
                Ok(expense)
            }
            Err(err) => {
                if let Some(url) = &uploaded {
                    discard_blob(blobs, url).await;
                }
                Err(err)
            }
        }
    }

    /// Applies a partial update to an expense of `cmd.user_id`.
    ///
    /// A replaced or removed receipt is deleted from the blob store after the
    /// row stops referencing it; failing to delete it only logs a warning.
    pub async fn update_expense<B: BlobStore>(
        &self,
        cmd: UpdateExpenseCmd,
        blobs: &B,
    ) -> ResultEngine<Expense> {
        if let Some(amount) = cmd.amount {
            validate_amount(amount)?;
        }
        if let AttachmentChange::Replace(upload) = &cmd.attachment {
            upload.validate()?;
        }

        let mut uploaded: Option<String> = None;
        let result: ResultEngine<(Expense, Option<String>)> = async {
            with_tx!(self, |db_tx| {
                self.require_user(&db_tx, &cmd.user_id).await?;
                let model = self
                    .require_expense(&db_tx, &cmd.user_id, cmd.expense_id)
                    .await?;

                let category_id = if cmd.clear_category {
                    None
                } else if let Some(id) = cmd.category_id {
                    self.require_category(&db_tx, &cmd.user_id, id).await?;
                    Some(id)
                } else {
                    model.category_id
                };

                let previous_url = model.attachment_url.clone();
                let mut active: expenses::ActiveModel = model.into();
                if let Some(amount) = cmd.amount {
                    active.amount = ActiveValue::Set(amount);
                }
                if let Some(currency) = &cmd.currency {
                    active.currency = ActiveValue::Set(currency.code().to_string());
                }
                if let Some(date) = cmd.date {
                    active.date = ActiveValue::Set(date);
                }
                if let Some(description) = &cmd.description {
                    active.description =
                        ActiveValue::Set(normalize_optional_text(Some(description.as_str())));
                }
                active.category_id = ActiveValue::Set(category_id);

                let stale_url = match &cmd.attachment {
                    AttachmentChange::Keep => None,
                    AttachmentChange::Remove => {
                        active.attachment_url = ActiveValue::Set(None);
                        active.attachment_name = ActiveValue::Set(None);
                        active.attachment_type = ActiveValue::Set(None);
                        previous_url
                    }
                    AttachmentChange::Replace(upload) => {
                        let attachment = blobs.upload(&cmd.user_id, upload).await?;
                        uploaded = Some(attachment.url.clone());
                        active.attachment_url = ActiveValue::Set(Some(attachment.url));
                        active.attachment_name = ActiveValue::Set(Some(attachment.name));
                        active.attachment_type = ActiveValue::Set(Some(attachment.content_type));
                        previous_url
                    }
                };
                active.updated_at = ActiveValue::Set(Utc::now());

                let model = active.update(&db_tx).await?;
                let expense = load_expense(&db_tx, model).await?;
                Ok((expense, stale_url))
            })
        }
        .await;

        match result {
            Ok((expense, stale_url)) => {
                if let Some(url) = &stale_url {
                    discard_blob(blobs, url).await;
                }
                tracing::info!("updated expense {} for {}", expense.id, expense.user_id);
                Ok(expense)
            }
            Err(err) => {
                if let Some(url) = &uploaded {
                    discard_blob(blobs, url).await;
                }
                Err(err)
            }
        }
    }

    /// Deletes an expense of `user_id` and then its receipt.
    ///
    /// The expense stays deleted even when the blob store fails.
    pub async fn delete_expense<B: BlobStore>(
        &self,
        user_id: &str,
        expense_id: Uuid,
        blobs: &B,
    ) -> ResultEngine<()> {
        let deleted: ResultEngine<expenses::Model> = with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let model = self.require_expense(&db_tx, user_id, expense_id).await?;
            expenses::Entity::delete_by_id(model.id)
                .exec(&db_tx)
                .await?;
            Ok(model)
        });
        let model = deleted?;

        if let Some(url) = &model.attachment_url {
            discard_blob(blobs, url).await;
        }
        tracing::info!("deleted expense {} for {user_id}", model.id);
        Ok(())
    }
}

async fn load_expense(db_tx: &DatabaseTransaction, model: expenses::Model) -> ResultEngine<Expense> {
    let category = match model.category_id {
        Some(id) => categories::Entity::find_by_id(id).one(db_tx).await?,
        None => None,
    };
    Expense::from_models(model, category)
}
