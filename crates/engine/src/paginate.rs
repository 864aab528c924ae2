//! Sorting and page slicing for expense lists.
//!
//! Out-of-range page numbers are clamped into `[1, total_pages]` instead of
//! being rejected, so a stale page number after a delete still shows the
//! last page.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::{EngineError, Expense, ResultEngine};

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
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Sort order for expense lists. The default is most recent first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseSort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl ExpenseSort {
    pub const DATE_DESC: ExpenseSort = ExpenseSort {
        field: SortField::Date,
        direction: SortDirection::Desc,
    };
}

fn compare(a: &Expense, b: &Expense, field: SortField) -> Ordering {
    match field {
        SortField::Date => a.date.cmp(&b.date),
        SortField::Amount => a.amount.total_cmp(&b.amount),
        SortField::Category => a
            .category_label()
            .to_lowercase()
            .cmp(&b.category_label().to_lowercase()),
        SortField::Description => {
            let a = a.description.as_deref().unwrap_or_default().to_lowercase();
            let b = b.description.as_deref().unwrap_or_default().to_lowercase();
            a.cmp(&b)
        }
    }
}

/// Sorts in place. Expenses with equal keys keep their relative order.
pub fn sort_expenses(expenses: &mut [Expense], sort: ExpenseSort) {
    expenses.sort_by(|a, b| {
        let ordering = compare(a, b, sort.field);
        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

/// One page of a list plus the numbers needed to render "x-y of z".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-indexed page actually returned, after clamping.
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_items: usize,
    /// 0-based index of the first item of the page.
    pub start_index: usize,
    /// 0-based index one past the last item of the page.
    pub end_index: usize,
}

/// Slices `items` into page `page` of `page_size` items.
pub fn paginate<T: Clone>(items: &[T], page_size: usize, page: usize) -> ResultEngine<Page<T>> {
    if page_size == 0 {
        return Err(EngineError::Validation(
            "page_size must be > 0".to_string(),
        ));
    }

    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size);
    let page = if total_pages == 0 {
        1
    } else {
        page.clamp(1, total_pages)
    };

    let start_index = ((page - 1) * page_size).min(total_items);
    let end_index = (start_index + page_size).min(total_items);

    Ok(Page {
        items: items[start_index..end_index].to_vec(),
        page,
        page_size,
        total_pages,
        total_items,
        start_index,
        end_index,
    })
}

/// Entry of a pagination control.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageMarker {
    Page(usize),
    Ellipsis,
}

/// Page numbers to show around `current`.
///
/// The first and last pages are always present, `siblings` pages are shown
/// on each side of `current`, and every hidden run collapses into one
/// [`PageMarker::Ellipsis`]. A run of a single page is shown as that page.
#[must_use]
pub fn page_markers(current: usize, total_pages: usize, siblings: usize) -> Vec<PageMarker> {
    if total_pages == 0 {
        return Vec::new();
    }

    let current = current.clamp(1, total_pages);
    let low = current.saturating_sub(siblings).max(1);
    let high = current.saturating_add(siblings).min(total_pages);

    let mut pages = Vec::with_capacity(high - low + 3);
    pages.push(1);
    pages.extend(low..=high);
    pages.push(total_pages);
    pages.dedup();

    let mut markers = Vec::with_capacity(pages.len() + 2);
    let mut previous: Option<usize> = None;
    for page in pages {
        if let Some(prev) = previous {
            if page <= prev {
                continue;
            }
            match page - prev {
                1 => {}
                2 => markers.push(PageMarker::Page(prev + 1)),
                _ => markers.push(PageMarker::Ellipsis),
            }
        }
        markers.push(PageMarker::Page(page));
        previous = Some(page);
    }
    markers
}
