//! Catalog products.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ventas_core::{PriceField, ProductKey};

use crate::error::ValidationError;

/// A product as listed by `GET /productos/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Durable catalog key. Absent on records the backend has not saved.
    #[serde(default)]
    pub id: Option<ProductKey>,
    #[serde(default)]
    pub nombre: String,
    /// Unit price, numeric or textual depending on the endpoint.
    #[serde(default)]
    pub precio: PriceField,
    /// Units in stock.
    #[serde(default)]
    pub cantidad: Option<i64>,
    #[serde(default)]
    pub descripcion: Option<String>,
}

impl Product {
    /// The product's key, if it has a usable one.
    #[must_use]
    pub fn key(&self) -> Option<&ProductKey> {
        self.id.as_ref().filter(|key| !key.is_blank())
    }
}

/// Fields sent when creating or updating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductDraft {
    pub nombre: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub precio: Decimal,
    pub cantidad: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
}

impl ProductDraft {
    /// Build a draft, rejecting a blank name or negative stock.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MissingField` for a blank name and
    /// `ValidationError::ZeroQuantity` for negative stock.
    pub fn new(
        nombre: &str,
        precio: Decimal,
        cantidad: i64,
        descripcion: Option<String>,
    ) -> Result<Self, ValidationError> {
        let nombre = nombre.trim();
        if nombre.is_empty() {
            return Err(ValidationError::MissingField("nombre"));
        }
        if cantidad < 0 {
            return Err(ValidationError::NegativeStock);
        }
        Ok(Self {
            nombre: nombre.to_string(),
            precio,
            cantidad,
            descripcion: descripcion.filter(|d| !d.trim().is_empty()),
        })
    }
}
