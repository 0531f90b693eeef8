//! Amount type for handling monetary values as they appear in a sheet cell.
//!
//! Cells may carry a currency symbol, thousands separators, or a decimal comma depending on who
//! typed them and how the sheet is formatted. `Amount` normalizes all of those into a `Decimal`.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

/// A monetary amount. There is no sign constraint: refunds are simply negative.
///
/// # Examples
///
/// ```
/// # use expense_dashboard::model::Amount;
/// # use std::str::FromStr;
/// let a = Amount::from_str("€1,250.50").unwrap();
/// let b = Amount::from_str("1250,50").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.to_string(), "1250.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying `Decimal` value.
    pub fn decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }
}

/// An error that can occur when parsing a cell into an `Amount`.
#[derive(Debug, Clone, PartialEq)]
pub enum AmountError {
    Empty,
    Invalid {
        input: String,
        reason: rust_decimal::Error,
    },
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AmountError::Empty => f.write_str("the amount is empty"),
            AmountError::Invalid { input, reason } => {
                write!(f, "'{input}' is not a valid amount: {reason}")
            }
        }
    }
}

impl std::error::Error for AmountError {}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AmountError::Empty);
        }

        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, trimmed),
        };

        let bare = unsigned
            .trim_start_matches(['$', '€'])
            .trim_end_matches('€')
            .trim();

        let digits = normalize_separators(bare);
        let text = if negative {
            format!("-{digits}")
        } else {
            digits
        };

        // Sheets renders very small or very large numbers as `1E-05` or `1E+16`.
        let value = Decimal::from_str(&text)
            .or_else(|e| {
                if text.contains(['e', 'E']) {
                    Decimal::from_scientific(&text)
                } else {
                    Err(e)
                }
            })
            .map_err(|reason| AmountError::Invalid {
                input: s.to_string(),
                reason,
            })?;
        Ok(Amount(value))
    }
}

/// Resolves commas into either thousands separators (dropped) or a decimal point.
///
/// - `1,234.56` -> `1234.56` (a dot is present, so commas group thousands)
/// - `12,50` -> `12.50` (a single comma not followed by exactly three digits)
/// - `1,000` -> `1000`
fn normalize_separators(s: &str) -> String {
    if s.contains('.') {
        return s.replace(',', "");
    }
    let commas = s.matches(',').count();
    if commas == 1 {
        if let Some((_, frac)) = s.split_once(',') {
            if frac.len() != 3 {
                return s.replace(',', ".");
            }
        }
    }
    s.replace(',', "")
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0 + rhs.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        Amount(iter.map(|a| a.0).sum())
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_plain() {
        assert_eq!(Amount::from_str("12.5").unwrap().decimal(), dec("12.5"));
    }

    #[test]
    fn test_parse_negative() {
        assert_eq!(Amount::from_str("-7.25").unwrap().decimal(), dec("-7.25"));
        assert!(Amount::from_str("-7.25").unwrap().is_negative());
    }

    #[test]
    fn test_parse_currency_symbols() {
        assert_eq!(Amount::from_str("$50.00").unwrap().decimal(), dec("50"));
        assert_eq!(Amount::from_str("-$50.00").unwrap().decimal(), dec("-50"));
        assert_eq!(Amount::from_str("50,00 €").unwrap().decimal(), dec("50"));
        assert_eq!(Amount::from_str("€3").unwrap().decimal(), dec("3"));
    }

    #[test]
    fn test_parse_decimal_comma() {
        assert_eq!(Amount::from_str("12,50").unwrap().decimal(), dec("12.50"));
        assert_eq!(Amount::from_str("12,5").unwrap().decimal(), dec("12.5"));
    }

    #[test]
    fn test_parse_thousands() {
        assert_eq!(Amount::from_str("1,000").unwrap().decimal(), dec("1000"));
        assert_eq!(
            Amount::from_str("1,234,567.89").unwrap().decimal(),
            dec("1234567.89")
        );
    }

    #[test]
    fn test_parse_whitespace() {
        assert_eq!(Amount::from_str("  42  ").unwrap().decimal(), dec("42"));
    }

    #[test]
    fn test_parse_empty_is_error() {
        assert_eq!(Amount::from_str("   ").unwrap_err(), AmountError::Empty);
    }

    #[test]
    fn test_parse_scientific() {
        assert_eq!(Amount::from_str("1e-05").unwrap().decimal(), dec("0.00001"));
        assert_eq!(
            Amount::from_str("1E+16").unwrap().decimal(),
            dec("10000000000000000")
        );
        assert_eq!(Amount::from_str("-2.5E3").unwrap().decimal(), dec("-2500"));
        assert!(Amount::from_str("1e").is_err());
        assert!(Amount::from_str("e5").is_err());
    }

    #[test]
    fn test_parse_garbage_is_error() {
        let err = Amount::from_str("None").unwrap_err();
        assert!(err.to_string().contains("'None' is not a valid amount"));
    }

    #[test]
    fn test_display_keeps_scale() {
        assert_eq!(Amount::from_str("10.00").unwrap().to_string(), "10.00");
    }

    #[test]
    fn test_zero_is_not_negative() {
        assert!(!Amount::from_str("-0").unwrap().is_negative());
    }

    #[test]
    fn test_sum() {
        let total: Amount = ["10.00", "5.00", "7.00"]
            .iter()
            .map(|s| Amount::from_str(s).unwrap())
            .sum();
        assert_eq!(total.decimal(), dec("22"));
    }

    #[test]
    fn test_serde() {
        let amount = Amount::from_str("-3.10").unwrap();
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"-3.10\"");
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, amount);
    }
}
