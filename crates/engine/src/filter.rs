//! Expense filtering.
//!
//! [`ExpenseFilter::matches`] is the single source of truth for what a
//! filter means. The database query may pre-filter on a subset of the
//! criteria, but listed expenses always go through the predicate too, so the
//! result never depends on where filtering happened.

use chrono::NaiveDate;
use sea_orm::{ColumnTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, Expense, ResultEngine, expenses};

/// Filters for listing expenses.
///
/// Criteria are AND-ed; a `None` criterion imposes no constraint. Both date
/// bounds are inclusive.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseFilter {
    pub category_id: Option<Uuid>,
    pub currency: Option<Currency>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Case-insensitive substring of the description.
    pub search: Option<String>,
}

impl ExpenseFilter {
    /// Returns `true` when no criterion is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.category_id.is_none()
            && self.currency.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.search_term().is_none()
    }

    /// Returns `true` iff `expense` satisfies every criterion.
    #[must_use]
    pub fn matches(&self, expense: &Expense) -> bool {
        if let Some(category_id) = self.category_id
            && expense.category_id != Some(category_id)
        {
            return false;
        }
        if let Some(currency) = &self.currency
            && &expense.currency != currency
        {
            return false;
        }
        if let Some(start) = self.start_date
            && expense.date < start
        {
            return false;
        }
        if let Some(end) = self.end_date
            && expense.date > end
        {
            return false;
        }
        if let Some(term) = self.search_term() {
            let description = expense.description.as_deref().unwrap_or_default();
            if !description.to_lowercase().contains(&term.to_lowercase()) {
                return false;
            }
        }
        true
    }

    fn search_term(&self) -> Option<&str> {
        self.search.as_deref().filter(|term| !term.is_empty())
    }
}

/// Keeps the expenses matching `filter`, preserving their order.
#[must_use]
pub fn filter_expenses(expenses: &[Expense], filter: &ExpenseFilter) -> Vec<Expense> {
    expenses
        .iter()
        .filter(|expense| filter.matches(expense))
        .cloned()
        .collect()
}

pub(crate) fn validate_filter(filter: &ExpenseFilter) -> ResultEngine<()> {
    if let (Some(start), Some(end)) = (filter.start_date, filter.end_date)
        && start > end
    {
        return Err(EngineError::Validation(
            "invalid range: start_date must be <= end_date".to_string(),
        ));
    }
    Ok(())
}

/// Pushes the cheap criteria of a filter down to an expenses query.
///
/// `search` is left to [`ExpenseFilter::matches`]: SQLite `LIKE` only folds
/// ASCII case.
pub(crate) trait ApplyExpenseFilters: QueryFilter + Sized {
    fn apply_expense_filters(self, filter: &ExpenseFilter) -> Self;
}

impl<T> ApplyExpenseFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_expense_filters(mut self, filter: &ExpenseFilter) -> Self {
        if let Some(category_id) = filter.category_id {
            self = self.filter(expenses::Column::CategoryId.eq(category_id));
        }
        if let Some(currency) = &filter.currency {
            self = self.filter(expenses::Column::Currency.eq(currency.code()));
        }
        if let Some(start) = filter.start_date {
            self = self.filter(expenses::Column::Date.gte(start));
        }
        if let Some(end) = filter.end_date {
            self = self.filter(expenses::Column::Date.lte(end));
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn expense(amount: f64, currency: &str, day: NaiveDate, description: Option<&str>) -> Expense {
        let mut expense = Expense::new(
            "alice".to_string(),
            amount,
            Currency::try_from(currency).unwrap(),
            day,
        )
        .unwrap();
        expense.description = description.map(ToString::to_string);
        expense
    }

    fn sample() -> Vec<Expense> {
        vec![
            expense(100.0, "USD", date(2024, 1, 5), Some("Groceries at Market")),
            expense(50.0, "USD", date(2024, 1, 10), None),
            expense(30.0, "EUR", date(2024, 1, 1), Some("Train ticket")),
        ]
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let expenses = sample();
        let filter = ExpenseFilter::default();
        assert!(filter.is_empty());
        assert_eq!(filter_expenses(&expenses, &filter), expenses);
    }

    #[test]
    fn currency_filter_selects_exact_code() {
        let expenses = sample();
        let filter = ExpenseFilter {
            currency: Some(Currency::try_from("EUR").unwrap()),
            ..Default::default()
        };
        let out = filter_expenses(&expenses, &filter);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].date, date(2024, 1, 1));
    }

    #[test]
    fn date_bounds_are_inclusive() {
        let expenses = sample();
        let filter = ExpenseFilter {
            start_date: Some(date(2024, 1, 5)),
            end_date: Some(date(2024, 1, 10)),
            ..Default::default()
        };
        let out = filter_expenses(&expenses, &filter);
        let dates: Vec<_> = out.iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![date(2024, 1, 5), date(2024, 1, 10)]);
    }

    #[test]
    fn search_is_case_insensitive_and_skips_missing_descriptions() {
        let expenses = sample();
        let filter = ExpenseFilter {
            search: Some("market".to_string()),
            ..Default::default()
        };
        let out = filter_expenses(&expenses, &filter);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].amount, 100.0);

        let filter = ExpenseFilter {
            search: Some("a".to_string()),
            ..Default::default()
        };
        assert!(filter_expenses(&expenses, &filter)
            .iter()
            .all(|e| e.description.is_some()));
    }

    #[test]
    fn empty_search_imposes_nothing() {
        let expenses = sample();
        let filter = ExpenseFilter {
            search: Some(String::new()),
            ..Default::default()
        };
        assert!(filter.is_empty());
        assert_eq!(filter_expenses(&expenses, &filter).len(), 3);
    }

    #[test]
    fn category_filter_requires_matching_id() {
        let mut expenses = sample();
        let food = Uuid::new_v4();
        expenses[1].category_id = Some(food);
        let filter = ExpenseFilter {
            category_id: Some(food),
            ..Default::default()
        };
        let out = filter_expenses(&expenses, &filter);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, expenses[1].id);
    }

    #[test]
    fn criteria_are_anded() {
        let expenses = sample();
        let filter = ExpenseFilter {
            currency: Some(Currency::try_from("USD").unwrap()),
            search: Some("train".to_string()),
            ..Default::default()
        };
        assert!(filter_expenses(&expenses, &filter).is_empty());
    }

    #[test]
    fn inverted_range_is_rejected() {
        let filter = ExpenseFilter {
            start_date: Some(date(2024, 2, 1)),
            end_date: Some(date(2024, 1, 1)),
            ..Default::default()
        };
        assert!(validate_filter(&filter).is_err());
    }
}
