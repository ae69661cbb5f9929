//! Sale endpoints.

use reqwest::Method;
use tracing::{instrument, warn};

use super::ApiGateway;
use crate::error::ApiError;
use crate::order::SalePayload;
use crate::types::Sale;

impl ApiGateway {
    /// List recorded sales.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn list_sales(&self) -> Result<Vec<Sale>, ApiError> {
        self.list("ventas/").await
    }

    /// Record a sale.
    ///
    /// Any 2xx means the backend recorded it. The returned body is read on a
    /// best-effort basis: `None` when it is empty or not a sale record.
    ///
    /// Use [`Register::submit`](crate::Register::submit) rather than calling
    /// this directly: the register freezes the cart and reconciles it with
    /// the outcome.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the backend answers with a
    /// non-2xx status.
    #[instrument(skip(self, payload), fields(cliente = %payload.cliente, lines = payload.detalles.len()))]
    pub async fn create_sale(&self, payload: &SalePayload) -> Result<Option<Sale>, ApiError> {
        let body = serde_json::to_value(payload)?;
        let response = self.send(Method::POST, "ventas/", Some(body)).await?;
        let status = response.status();

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(%status, error = %e, "Sale recorded; response body lost");
                return Ok(None);
            }
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        match serde_json::from_slice::<Sale>(&bytes) {
            Ok(sale) => Ok(Some(sale)),
            Err(e) => {
                warn!(%status, error = %e, "Sale recorded; response body is not a sale");
                Ok(None)
            }
        }
    }
}
