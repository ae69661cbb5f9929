//! Error taxonomy for the client.
//!
//! - [`ValidationError`] - local precondition failures, raised before any
//!   network call
//! - [`AuthError`] - login failures at the token endpoint
//! - [`ApiError`] - everything an authenticated call can end with
//!
//! A 401 on an authenticated call is handled by the gateway (forced logout
//! and a single redirect) before the caller sees [`ApiError::SessionExpired`].

use std::collections::BTreeMap;
use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;
use ventas_core::{EmailError, PriceError, ProductKey};

/// Message shown when a failure has no server-provided detail.
pub const CONNECTIVITY_MESSAGE: &str =
    "could not reach the sales server; nothing was lost, try again";

/// Local precondition failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A product without a durable key cannot be added to an order.
    #[error("product has no key and cannot be added to an order")]
    MissingProductKey,

    /// The key cannot address a single resource (`.` or `..`).
    #[error("product key {0:?} cannot be used in a URL")]
    UnaddressableKey(String),

    /// Quantities start at 1.
    #[error("quantity must be at least 1")]
    ZeroQuantity,

    /// Submitting requires at least one line.
    #[error("the cart is empty")]
    EmptyCart,

    /// Submitting requires a customer.
    #[error("no customer selected")]
    MissingCustomer,

    /// A line's price could not be parsed, so no payload can be built.
    #[error("price of product {product_key} is not usable: {source}")]
    UnparseablePrice {
        /// Offending line.
        product_key: ProductKey,
        /// Parse failure.
        #[source]
        source: PriceError,
    },

    /// A required text field is blank.
    #[error("{0} cannot be empty")]
    MissingField(&'static str),

    /// Stock counts cannot go below zero.
    #[error("stock cannot be negative")]
    NegativeStock,

    /// Invalid customer email.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// The order is being submitted.
    #[error("the order is being submitted; the cart cannot change until it completes")]
    CartFrozen,
}

/// Errors returned by the token endpoint.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The server refused the credentials.
    #[error("login rejected: {0}")]
    Rejected(String),

    /// No response from the token endpoint.
    #[error("login request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// 2xx response without a usable token.
    #[error("login response did not contain a token: {0}")]
    Malformed(String),

    /// The token endpoint URL could not be built.
    #[error("invalid token endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

/// Errors from calls made through the gateway.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 401 on an authenticated call. The session has already been cleared.
    #[error("session expired, log in again")]
    SessionExpired,

    /// Local precondition failure; no request was sent.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// No response (connection, TLS, timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-401 error status.
    #[error("server rejected the request ({status}): {body}")]
    ServerRejected {
        /// HTTP status returned.
        status: StatusCode,
        /// Parsed error body.
        body: RejectionBody,
    },

    /// 2xx body that does not have the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The endpoint URL could not be built.
    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

impl ApiError {
    /// Whether the gateway already logged the user out for this failure.
    #[must_use]
    pub const fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }

    /// Message for the cashier.
    ///
    /// Server-provided errors are repeated verbatim; failures without a
    /// usable body collapse into a generic connectivity message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::ServerRejected {
                body: body @ (RejectionBody::Fields(_) | RejectionBody::Detail(_)),
                ..
            } => body.to_string(),
            Self::Validation(err) => err.to_string(),
            Self::SessionExpired => self.to_string(),
            Self::ServerRejected { .. }
            | Self::Network(_)
            | Self::Decode(_)
            | Self::Endpoint(_) => CONNECTIVITY_MESSAGE.to_string(),
        }
    }
}

/// Body of a non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionBody {
    /// Field-level errors: `{"cliente": ["This field is required."]}`.
    Fields(BTreeMap<String, Vec<String>>),
    /// A single message: `{"detail": "Not found."}`.
    Detail(String),
    /// Anything else, kept as received.
    Text(String),
}

impl RejectionBody {
    /// Classify a raw error body.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(raw)
        else {
            return Self::Text(raw.trim().to_string());
        };

        if let Some(serde_json::Value::String(detail)) = map.get("detail") {
            return Self::Detail(detail.clone());
        }

        let mut fields = BTreeMap::new();
        for (field, value) in map {
            let messages = match value {
                serde_json::Value::String(message) => vec![message],
                serde_json::Value::Array(items) => items
                    .into_iter()
                    .map(|item| match item {
                        serde_json::Value::String(message) => message,
                        other => other.to_string(),
                    })
                    .collect(),
                other => vec![other.to_string()],
            };
            fields.insert(field, messages);
        }

        if fields.is_empty() {
            Self::Text(raw.trim().to_string())
        } else {
            Self::Fields(fields)
        }
    }
}

impl fmt::Display for RejectionBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fields(fields) => {
                let rendered = fields
                    .iter()
                    .map(|(field, messages)| format!("{field}: {}", messages.join(" ")))
                    .collect::<Vec<_>>()
                    .join("; ");
                f.write_str(&rendered)
            }
            Self::Detail(detail) => f.write_str(detail),
            Self::Text(text) if text.is_empty() => f.write_str("(empty body)"),
            Self::Text(text) => f.write_str(text),
        }
    }
}
