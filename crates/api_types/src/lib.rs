use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod attachment {
    use super::*;

    /// Receipt sent inline with an expense form.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct AttachmentUpload {
        pub name: String,
        /// One of `image/jpeg`, `image/png`, `image/webp`, `application/pdf`.
        pub content_type: String,
        /// File content, standard base64 with padding.
        pub data_base64: String,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct AttachmentView {
        pub url: String,
        pub name: String,
        pub content_type: String,
    }
}

pub mod category {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: String,
        pub icon: Option<String>,
        pub color: Option<String>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: Uuid,
        pub name: String,
        pub icon: Option<String>,
        pub color: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryListResponse {
        /// Ordered by name.
        pub categories: Vec<CategoryView>,
    }
}

pub mod expense {
    use super::{
        attachment::{AttachmentUpload, AttachmentView},
        category::CategoryView,
        *,
    };

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum SortField {
        #[default]
        Date,
        Category,
        Amount,
        Description,
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum SortOrder {
        Asc,
        #[default]
        Desc,
    }

    /// Query string of `GET /expenses` and `GET /stats`.
    ///
    /// Every criterion is optional; `page`, `page_size`, `sort` and `order`
    /// are ignored by `/stats`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseQuery {
        pub category_id: Option<Uuid>,
        pub currency: Option<String>,
        pub start_date: Option<NaiveDate>,
        pub end_date: Option<NaiveDate>,
        pub search: Option<String>,
        /// 1-indexed.
        pub page: Option<usize>,
        pub page_size: Option<usize>,
        pub sort: Option<SortField>,
        pub order: Option<SortOrder>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub amount: f64,
        pub currency: String,
        pub date: NaiveDate,
        pub category_id: Option<Uuid>,
        pub description: Option<String>,
        pub attachment: Option<AttachmentUpload>,
    }

    /// Body of `PATCH /expenses/{id}`. Absent fields are left untouched.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseUpdate {
        pub amount: Option<f64>,
        pub currency: Option<String>,
        pub date: Option<NaiveDate>,
        pub category_id: Option<Uuid>,
        #[serde(default)]
        pub clear_category: bool,
        /// An empty string clears the description.
        pub description: Option<String>,
        /// Replaces the current receipt.
        pub attachment: Option<AttachmentUpload>,
        #[serde(default)]
        pub remove_attachment: bool,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ExpenseView {
        pub id: Uuid,
        pub amount: f64,
        pub currency: String,
        /// Amount rendered with the currency symbol, e.g. `$1,234.50`.
        pub formatted_amount: String,
        pub category: Option<CategoryView>,
        /// Category name, or `Uncategorized`.
        pub category_label: String,
        pub date: NaiveDate,
        pub description: Option<String>,
        pub attachment: Option<AttachmentView>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    /// Entry of the pagination control.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum PageLink {
        Page(usize),
        Ellipsis,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpensePage {
        pub expenses: Vec<ExpenseView>,
        pub page: usize,
        pub page_size: usize,
        pub total_pages: usize,
        pub total_items: usize,
        /// 0-based index of the first expense of the page.
        pub start_index: usize,
        /// 0-based index one past the last expense of the page.
        pub end_index: usize,
        pub links: Vec<PageLink>,
    }
}

pub mod stats {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CurrencyTotalsView {
        pub currency: String,
        pub total: f64,
        pub count: usize,
        pub monthly_total: f64,
        pub average: f64,
        pub formatted_total: String,
        pub formatted_monthly_total: String,
        pub formatted_average: String,
        /// Short form for dashboard cards, e.g. `$1.23K`.
        pub compact_total: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TopCategoryView {
        pub category_id: Option<Uuid>,
        pub name: String,
        pub currency: String,
        pub total: f64,
        pub count: usize,
        pub formatted_total: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseStatsView {
        pub count: usize,
        pub currencies: Vec<CurrencyTotalsView>,
        pub primary_currency: Option<String>,
        pub has_multiple_currencies: bool,
        pub top_category: Option<TopCategoryView>,
        pub year: i32,
        pub month: u32,
    }
}
