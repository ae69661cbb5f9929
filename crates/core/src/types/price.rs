//! Raw price fields and their explicit conversion to decimal amounts.
//!
//! The backend serialises `DecimalField`s as strings (`"19990.00"`) while
//! hand-written fixtures and older endpoints send plain JSON numbers. A
//! [`PriceField`] keeps whatever arrived; arithmetic happens only after
//! [`PriceField::parse`] has produced a [`Decimal`].

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PriceField`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The field is an empty or blank string.
    #[error("price is empty")]
    Empty,
    /// The field is not a decimal number.
    #[error("price is not a number: {raw:?}")]
    NotANumber {
        /// The value as it was received.
        raw: String,
    },
}

/// A price exactly as it was received from upstream data.
///
/// ```
/// use rust_decimal::Decimal;
/// use ventas_core::PriceField;
///
/// let text = PriceField::from("19990");
/// let number: PriceField = serde_json::from_str("19990").unwrap();
///
/// assert_eq!(text.parse().unwrap(), Decimal::from(19990));
/// assert_eq!(number.parse().unwrap(), Decimal::from(19990));
/// assert!(PriceField::from("gratis").parse().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceField {
    /// A JSON number.
    Number(serde_json::Number),
    /// A JSON string that should contain a number.
    Text(String),
}

impl PriceField {
    /// Convert the raw field into a decimal amount.
    ///
    /// Accepts plain (`"19990"`, `"19.99"`) and scientific (`1.999e4`)
    /// notation. Surrounding whitespace in text is ignored.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Empty` for blank text and
    /// `PriceError::NotANumber` for anything that is not a finite decimal.
    pub fn parse(&self) -> Result<Decimal, PriceError> {
        let raw = match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.trim().to_owned(),
        };

        if raw.is_empty() {
            return Err(PriceError::Empty);
        }

        Decimal::from_str(&raw)
            .or_else(|_| Decimal::from_scientific(&raw))
            .map_err(|_| PriceError::NotANumber { raw })
    }
}

/// A missing price: parses as [`PriceError::Empty`].
impl Default for PriceField {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<Decimal> for PriceField {
    fn from(amount: Decimal) -> Self {
        Self::Text(amount.to_string())
    }
}

impl From<i64> for PriceField {
    fn from(amount: i64) -> Self {
        Self::Number(amount.into())
    }
}

impl From<&str> for PriceField {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_and_number() {
        assert_eq!(
            PriceField::from("19990").parse().unwrap(),
            Decimal::from(19990)
        );
        assert_eq!(
            PriceField::from(" 19.99 ").parse().unwrap(),
            Decimal::new(1999, 2)
        );
        assert_eq!(PriceField::from(250).parse().unwrap(), Decimal::from(250));
    }

    #[test]
    fn test_parse_json_float() {
        let field: PriceField = serde_json::from_str("12.5").unwrap();
        assert_eq!(field.parse().unwrap(), Decimal::new(125, 1));
    }

    #[test]
    fn test_parse_scientific() {
        let field: PriceField = serde_json::from_str("1.5e3").unwrap();
        assert_eq!(field.parse().unwrap(), Decimal::from(1500));
    }

    #[test]
    fn test_parse_blank() {
        assert_eq!(PriceField::from("  ").parse(), Err(PriceError::Empty));
    }

    #[test]
    fn test_default_is_unusable() {
        assert_eq!(PriceField::default().parse(), Err(PriceError::Empty));
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(
            PriceField::from("N/A").parse(),
            Err(PriceError::NotANumber {
                raw: "N/A".to_string()
            })
        );
    }

    #[test]
    fn test_deserialize_keeps_shape() {
        let text: PriceField = serde_json::from_str("\"19990.00\"").unwrap();
        assert_eq!(text, PriceField::Text("19990.00".to_string()));
        assert_eq!(serde_json::to_string(&text).unwrap(), "\"19990.00\"");
    }
}
