//! Command structs for engine operations.
//!
//! These types group parameters for write operations (create/update
//! expense), keeping call sites readable and avoiding long argument lists.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{AttachmentUpload, Currency};

/// Create an expense.
#[derive(Clone, Debug)]
pub struct CreateExpenseCmd {
    pub user_id: String,
    pub amount: f64,
    pub currency: Currency,
    pub date: NaiveDate,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    pub attachment: Option<AttachmentUpload>,
}

impl CreateExpenseCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        amount: f64,
        currency: Currency,
        date: NaiveDate,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            amount,
            currency,
            date,
            category_id: None,
            description: None,
            attachment: None,
        }
    }

    #[must_use]
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn attachment(mut self, attachment: AttachmentUpload) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

/// What to do with the receipt of an expense being updated.
#[derive(Clone, Debug, Default)]
pub enum AttachmentChange {
    #[default]
    Keep,
    /// Delete the stored receipt and clear the attachment fields.
    Remove,
    /// Upload a new receipt and delete the previous one, if any.
    Replace(AttachmentUpload),
}

/// Update an expense. `None` fields are left untouched.
#[derive(Clone, Debug)]
pub struct UpdateExpenseCmd {
    pub user_id: String,
    pub expense_id: Uuid,
    pub amount: Option<f64>,
    pub currency: Option<Currency>,
    pub date: Option<NaiveDate>,
    pub category_id: Option<Uuid>,
    /// Clears the category; wins over `category_id`.
    pub clear_category: bool,
    /// An empty description clears it.
    pub description: Option<String>,
    pub attachment: AttachmentChange,
}

impl UpdateExpenseCmd {
    #[must_use]
    pub fn new(user_id: impl Into<String>, expense_id: Uuid) -> Self {
        Self {
            user_id: user_id.into(),
            expense_id,
            amount: None,
            currency: None,
            date: None,
            category_id: None,
            clear_category: false,
            description: None,
            attachment: AttachmentChange::Keep,
        }
    }

    #[must_use]
    pub fn amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = Some(currency);
        self
    }

    #[must_use]
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn clear_category(mut self) -> Self {
        self.clear_category = true;
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn attachment(mut self, change: AttachmentChange) -> Self {
        self.attachment = change;
        self
    }
}
