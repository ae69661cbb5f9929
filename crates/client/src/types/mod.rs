//! Backend resource types.
//!
//! Field names follow the backend's Spanish JSON (`nombre`, `precio`, ...).
//! Fields the dashboard does not rely on are optional so that a partially
//! filled record still deserialises.

mod customer;
mod product;
mod sale;

pub use customer::{Customer, NewCustomer};
pub use product::{Product, ProductDraft};
pub use sale::{Sale, SaleDetail};

use serde::{Deserialize, Deserializer};

/// A list response: a bare array or a paginated `{ "results": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListEnvelope<T> {
    Bare(Vec<T>),
    Paginated { results: Vec<T> },
}

impl<T> ListEnvelope<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            Self::Bare(items) | Self::Paginated { results: items } => items,
        }
    }
}

/// Read an explicit `null` the same way as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shapes_normalize_identically() {
        let bare: ListEnvelope<Customer> =
            serde_json::from_str(r#"[{"id": 1, "nombre": "Ana"}]"#).unwrap();
        let paginated: ListEnvelope<Customer> = serde_json::from_str(
            r#"{"count": 1, "next": null, "previous": null, "results": [{"id": 1, "nombre": "Ana"}]}"#,
        )
        .unwrap();

        assert_eq!(bare.into_vec(), paginated.into_vec());
    }

    #[test]
    fn test_envelope_rejects_other_objects() {
        let result = serde_json::from_str::<ListEnvelope<Customer>>(r#"{"detail": "x"}"#);
        assert!(result.is_err());
    }
}
