//! Amount validation and display formatting.
//!
//! Amounts are plain `f64` values in major units (`12.5` is twelve and a
//! half units of the expense currency). Formatting always rounds to two
//! decimals and groups thousands with `,`.
//!
//! # Examples
//!
//! ```rust
//! use engine::{format_compact, format_currency};
//!
//! assert_eq!(format_currency(1234.5, "USD"), "$1,234.50");
//! assert_eq!(format_currency(0.0, "XYZ"), "XYZ 0.00");
//! assert_eq!(format_compact(1500.0, "EUR"), "€1.50K");
//! ```

use crate::{EngineError, ResultEngine, currency::symbol_for};

/// Checks that an amount can be stored on an expense.
pub fn validate_amount(amount: f64) -> ResultEngine<f64> {
    if !amount.is_finite() {
        return Err(EngineError::Validation(
            "amount must be a finite number".to_string(),
        ));
    }
    if amount < 0.0 {
        return Err(EngineError::Validation("amount must be >= 0".to_string()));
    }
    Ok(amount)
}

/// Formats `amount` with two decimals and `,` thousands separators.
#[must_use]
pub fn format_amount(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let digits = int_part.as_bytes();
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(char::from(*digit));
    }

    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

/// Formats an amount for display, prefixed by the currency symbol.
///
/// Codes without a known symbol are shown as `CODE ` instead.
#[must_use]
pub fn format_currency(amount: f64, currency: &str) -> String {
    format!("{}{}", prefix(currency), format_amount(amount))
}

/// Compact variant used on dashboard cards: `1.50K`, `2.25M`.
#[must_use]
pub fn format_compact(amount: f64, currency: &str) -> String {
    let body = if amount >= 1_000_000.0 {
        format!("{:.2}M", amount / 1_000_000.0)
    } else if amount >= 1_000.0 {
        format!("{:.2}K", amount / 1_000.0)
    } else {
        format!("{amount:.2}")
    };
    format!("{}{body}", prefix(currency))
}

fn prefix(currency: &str) -> String {
    match symbol_for(currency) {
        Some(symbol) => symbol.to_string(),
        None => format!("{currency} "),
    }
}
