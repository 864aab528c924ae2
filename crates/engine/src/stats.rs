//! Expense statistics.
//!
//! [`aggregate`] reduces a snapshot of expenses into the figures shown on the
//! dashboard. Amounts are never summed across currencies: every total is
//! reported per currency code.
//!
//! Tie-breaks are deterministic and always favour the key seen first in the
//! input (see [`tally`]).

use std::{collections::HashMap, hash::Hash};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, Expense};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurrencyTotals {
    pub currency: Currency,
    pub total: f64,
    pub count: usize,
    /// Total restricted to the month of the reference date.
    pub monthly_total: f64,
    pub average: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TopCategory {
    /// `None` groups the uncategorized expenses.
    pub category_id: Option<Uuid>,
    pub name: String,
    pub currency: Currency,
    pub total: f64,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExpenseStats {
    pub count: usize,
    /// One entry per currency, in first-seen order.
    pub currencies: Vec<CurrencyTotals>,
    pub primary_currency: Option<Currency>,
    pub has_multiple_currencies: bool,
    /// Biggest category by amount among the primary-currency expenses.
    pub top_category: Option<TopCategory>,
    /// `(year, month)` the monthly totals refer to.
    pub month: (i32, u32),
}

impl ExpenseStats {
    /// Totals for one currency, if any expense uses it.
    #[must_use]
    pub fn totals_for(&self, currency: &Currency) -> Option<&CurrencyTotals> {
        self.currencies.iter().find(|t| &t.currency == currency)
    }
}

#[derive(Default)]
struct Accumulator {
    total: f64,
    count: usize,
    monthly_total: f64,
}

#[derive(Default)]
struct CategoryAccumulator {
    name: String,
    total: f64,
    count: usize,
}

/// Groups `items` by `key`, folding each item into its group with `merge`.
///
/// Groups come back in the order their key was first seen, so callers that
/// pick a maximum with a strict comparison break ties in favour of the
/// earliest key.
pub(crate) fn tally<T, K, V>(
    items: impl IntoIterator<Item = T>,
    key: impl Fn(&T) -> K,
    mut merge: impl FnMut(&mut V, T),
) -> Vec<(K, V)>
where
    K: Eq + Hash + Clone,
    V: Default,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, V)> = Vec::new();

    for item in items {
        let k = key(&item);
        let slot = *index.entry(k.clone()).or_insert_with(|| {
            groups.push((k, V::default()));
            groups.len() - 1
        });
        merge(&mut groups[slot].1, item);
    }

    groups
}

/// First element with the strictly greatest score.
fn first_max_by<T>(items: &[T], score: impl Fn(&T) -> f64) -> Option<&T> {
    let mut best: Option<&T> = None;
    for item in items {
        match best {
            Some(current) if score(item) <= score(current) => {}
            _ => best = Some(item),
        }
    }
    best
}

/// Aggregates `expenses` relative to the calendar date `today`.
///
/// `today` only selects the month used by the monthly totals; the function
/// never reads the clock.
#[must_use]
pub fn aggregate(expenses: &[Expense], today: NaiveDate) -> ExpenseStats {
    let month = (today.year(), today.month());
    let in_month = |date: NaiveDate| (date.year(), date.month()) == month;

    let by_currency = tally(
        expenses,
        |expense| expense.currency.clone(),
        |acc: &mut Accumulator, expense| {
            acc.total += expense.amount;
            acc.count += 1;
            if in_month(expense.date) {
                acc.monthly_total += expense.amount;
            }
        },
    );

    let currencies: Vec<CurrencyTotals> = by_currency
        .into_iter()
        .map(|(currency, acc)| CurrencyTotals {
            currency,
            total: acc.total,
            count: acc.count,
            monthly_total: acc.monthly_total,
            average: if acc.count == 0 {
                0.0
            } else {
                acc.total / acc.count as f64
            },
        })
        .collect();

    let primary_currency =
        first_max_by(&currencies, |t| t.count as f64).map(|t| t.currency.clone());

    let top_category = primary_currency.as_ref().and_then(|primary| {
        let by_category = tally(
            expenses.iter().filter(|e| &e.currency == primary),
            |expense| expense.category_id,
            |acc: &mut CategoryAccumulator, expense| {
                if acc.count == 0 {
                    acc.name = expense.category_label().to_string();
                }
                acc.total += expense.amount;
                acc.count += 1;
            },
        );
        first_max_by(&by_category, |(_, acc)| acc.total).map(|(category_id, acc)| TopCategory {
            category_id: *category_id,
            name: acc.name.clone(),
            currency: primary.clone(),
            total: acc.total,
            count: acc.count,
        })
    });

    ExpenseStats {
        count: expenses.len(),
        has_multiple_currencies: currencies.len() > 1,
        currencies,
        primary_currency,
        top_category,
        month,
    }
}
