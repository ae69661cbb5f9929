//! Product endpoints.

use tracing::instrument;
use ventas_core::ProductKey;

use super::ApiGateway;
use crate::error::{ApiError, ValidationError};
use crate::types::{Product, ProductDraft};

/// `productos/<key>/` with the key as one encoded segment.
///
/// Text keys come from user input, so `/` is encoded and the dot segments
/// that URL resolution would collapse are refused.
fn product_path(key: &ProductKey) -> Result<String, ValidationError> {
    let raw = key.to_string();
    if matches!(raw.as_str(), "." | "..") {
        return Err(ValidationError::UnaddressableKey(raw));
    }
    Ok(format!("productos/{}/", urlencoding::encode(&raw)))
}

impl ApiGateway {
    /// List the catalog.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        self.list("productos/").await
    }

    /// Fetch one product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(product_key = %key))]
    pub async fn get_product(&self, key: &ProductKey) -> Result<Product, ApiError> {
        self.get(&product_path(key)?).await
    }

    /// Create (`id` absent) or update (`id` present) a product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, draft), fields(nombre = %draft.nombre))]
    pub async fn save_product(
        &self,
        id: Option<&ProductKey>,
        draft: &ProductDraft,
    ) -> Result<Product, ApiError> {
        match id {
            Some(key) => self.put(&product_path(key)?, draft).await,
            None => self.post("productos/", draft).await,
        }
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(product_key = %key))]
    pub async fn delete_product(&self, key: &ProductKey) -> Result<(), ApiError> {
        self.delete(&product_path(key)?).await
    }
}
