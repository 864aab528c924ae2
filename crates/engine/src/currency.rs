use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Display symbols for the currencies the dashboard knows about.
///
/// Codes missing from this table are shown as the raw code.
const SYMBOLS: &[(&str, &str)] = &[
    ("USD", "$"),
    ("EUR", "€"),
    ("GBP", "£"),
    ("JPY", "¥"),
    ("CAD", "CA$"),
    ("AUD", "A$"),
    ("CHF", "Fr"),
    ("CNY", "¥"),
    ("INR", "₹"),
    ("MXN", "MX$"),
    ("DOP", "$"),
];

/// ISO-like currency code attached to an expense.
///
/// Expenses are never converted between currencies: every total the engine
/// reports is kept per code. The code is stored upper-case.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Canonical currency code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Display symbol from the lookup table, if the code is known.
    #[must_use]
    pub fn symbol(&self) -> Option<&'static str> {
        symbol_for(&self.0)
    }
}

/// Symbol lookup on a raw code, used by the formatters.
pub(crate) fn symbol_for(code: &str) -> Option<&'static str> {
    SYMBOLS
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, symbol)| *symbol)
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let code = value.trim().to_ascii_uppercase();
        if !(2..=5).contains(&code.len()) || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(EngineError::Validation(format!(
                "unsupported currency: {value}"
            )));
        }
        Ok(Currency(code))
    }
}

impl TryFrom<String> for Currency {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Currency::try_from(value.as_str())
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_upper_cased() {
        let currency = Currency::try_from(" usd ").unwrap();
        assert_eq!(currency.code(), "USD");
        assert_eq!(currency.symbol(), Some("$"));
    }

    #[test]
    fn unknown_codes_have_no_symbol() {
        let currency = Currency::try_from("XYZ").unwrap();
        assert_eq!(currency.symbol(), None);
    }

    #[test]
    fn rejects_malformed_codes() {
        assert!(Currency::try_from("").is_err());
        assert!(Currency::try_from("U").is_err());
        assert!(Currency::try_from("US1").is_err());
        assert!(Currency::try_from("TOOLONG").is_err());
    }
}
