//! Customer endpoints.

use tracing::instrument;
use ventas_core::CustomerId;

use super::ApiGateway;
use crate::error::ApiError;
use crate::types::{Customer, NewCustomer};

impl ApiGateway {
    /// List customers.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn list_customers(&self) -> Result<Vec<Customer>, ApiError> {
        self.list("clientes/").await
    }

    /// Create a customer. The email was validated when `customer` was built.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, customer), fields(email = %customer.email()))]
    pub async fn create_customer(&self, customer: &NewCustomer) -> Result<Customer, ApiError> {
        self.post("clientes/", customer).await
    }

    /// Delete a customer.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(customer_id = %id))]
    pub async fn delete_customer(&self, id: CustomerId) -> Result<(), ApiError> {
        self.delete(&format!("clientes/{id}/")).await
    }
}
