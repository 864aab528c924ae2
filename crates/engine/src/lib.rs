//! Expense tracking core.
//!
//! The pure building blocks (filtering, statistics, sorting and pagination,
//! currency formatting) work on plain [`Expense`] values and can be used
//! without a database. [`Engine`] adds the user-scoped persistence on top of
//! sea-orm, with receipts kept in a [`BlobStore`].

pub use attachments::{
    ACCEPTED_CONTENT_TYPES, AttachmentUpload, BlobStore, COMPRESSION_TARGET_BYTES,
    LocalBlobStore, MAX_COMPRESSED_IMAGE_BYTES, MAX_IMAGE_DIMENSION, MAX_UPLOAD_BYTES,
};
pub use categories::{Category, UNCATEGORIZED};
pub use commands::{AttachmentChange, CreateExpenseCmd, UpdateExpenseCmd};
pub use currency::Currency;
pub use error::EngineError;
pub use expenses::{Attachment, Expense};
pub use filter::{ExpenseFilter, filter_expenses};
pub use money::{format_amount, format_compact, format_currency, validate_amount};
pub use ops::{Engine, EngineBuilder};
pub use paginate::{
    ExpenseSort, Page, PageMarker, SortDirection, SortField, page_markers, paginate,
    sort_expenses,
};
pub use stats::{CurrencyTotals, ExpenseStats, TopCategory, aggregate};

mod attachments;
pub mod categories;
mod commands;
mod currency;
mod error;
pub mod expenses;
mod filter;
mod money;
mod ops;
mod paginate;
mod stats;
pub mod users;

type ResultEngine<T> = Result<T, EngineError>;
