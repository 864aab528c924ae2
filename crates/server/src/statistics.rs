//! Statistics API endpoints

use api_types::{
    expense::ExpenseQuery,
    stats::{CurrencyTotalsView, ExpenseStatsView, TopCategoryView},
};
use axum::{
    Extension, Json,
    extract::State,
};
use chrono::Utc;

use crate::{
    ServerError, expenses::filter_from_query, extract::QueryParams, server::ServerState,
    user::User,
};
use engine::{format_compact, format_currency};

/// Handle requests for the dashboard statistics of the filtered expenses.
///
/// Monthly totals refer to the current UTC month.
pub async fn get_stats(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    QueryParams(query): QueryParams<ExpenseQuery>,
) -> Result<Json<ExpenseStatsView>, ServerError> {
    let filter = filter_from_query(&query)?;
    let today = Utc::now().date_naive();
    let stats = state
        .engine
        .expense_stats(&user.username, &filter, today)
        .await?;

    let currencies = stats
        .currencies
        .into_iter()
        .map(|totals| {
            let code = totals.currency.code();
            CurrencyTotalsView {
                formatted_total: format_currency(totals.total, code),
                formatted_monthly_total: format_currency(totals.monthly_total, code),
                formatted_average: format_currency(totals.average, code),
                compact_total: format_compact(totals.total, code),
                currency: totals.currency.into(),
                total: totals.total,
                count: totals.count,
                monthly_total: totals.monthly_total,
                average: totals.average,
            }
        })
        .collect();

    let top_category = stats.top_category.map(|top| TopCategoryView {
        formatted_total: format_currency(top.total, top.currency.code()),
        category_id: top.category_id,
        name: top.name,
        currency: top.currency.into(),
        total: top.total,
        count: top.count,
    });

    let (year, month) = stats.month;
    Ok(Json(ExpenseStatsView {
        count: stats.count,
        currencies,
        primary_currency: stats.primary_currency.map(String::from),
        has_multiple_currencies: stats.has_multiple_currencies,
        top_category,
        year,
        month,
    }))
}
