//! Identifiers for backend entities.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally passing a customer id where a sale id is expected.
//!
//! Products are identified by [`ProductKey`] instead: the catalog hands out
//! keys as either integers or strings, and cart lines are merged by key.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i64` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_i64()`
/// - `From<i64>`, `Into<i64>` and `FromStr` implementations
///
/// # Example
///
/// ```rust
/// # use ventas_core::define_id;
/// define_id!(CashierId);
/// define_id!(TerminalId);
///
/// let cashier = CashierId::new(1);
/// let terminal: TerminalId = "7".parse().unwrap();
///
/// assert_eq!(cashier.as_i64(), 1);
/// assert_eq!(terminal.to_string(), "7");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Create a new ID from an i64 value.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the underlying i64 value.
            #[must_use]
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(CustomerId);
define_id!(SaleId);

/// Durable catalog identifier of a product.
///
/// The backend serialises product ids as JSON integers, but older records and
/// hand-edited payloads carry them as strings. Both shapes are accepted and
/// the original shape is kept when the key is sent back in a sale payload.
///
/// Two keys are the same product only if they have the same shape and value;
/// `ProductKey::parse` is the way to obtain a key from free text and always
/// prefers the numeric shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductKey {
    /// Integer key, as produced by the backend's primary key.
    Numeric(i64),
    /// Textual key (SKU-style or a stringified number).
    Text(String),
}

impl ProductKey {
    /// Parse a key typed by a user or read from a command line.
    ///
    /// Integers become [`ProductKey::Numeric`], anything else is kept as
    /// trimmed text.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        s.parse::<i64>()
            .map_or_else(|_| Self::Text(s.to_owned()), Self::Numeric)
    }

    /// Whether the key carries an identity at all.
    ///
    /// Blank text keys are not identities: a product with one cannot be
    /// merged or referenced in a sale.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Numeric(_) => false,
            Self::Text(s) => s.trim().is_empty(),
        }
    }
}

impl fmt::Display for ProductKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ProductKey {
    fn from(id: i64) -> Self {
        Self::Numeric(id)
    }
}

impl From<&str> for ProductKey {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}
