//! Order submission.
//!
//! A [`Register`] owns the cart and the selected customer and walks the
//! order through `Draft -> Submitting -> Committed | Failed`. Preconditions
//! are checked before anything is sent; the cart and customer are reset only
//! once the backend has confirmed the sale.
//!
//! Submission comes in two phases so that a register behind a lock does not
//! have to stay locked during the network call:
//!
//! ```rust,ignore
//! let pending = register.lock().await.begin_submission()?;
//! let outcome = gateway.create_sale(&pending.payload).await;
//! let order = register.lock().await.finish_submission(pending, &outcome);
//! ```
//!
//! [`Register::submit`] does both for the common case.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument, warn};
use ventas_core::{CustomerId, OrderStatus, ProductKey};

use crate::cart::{Cart, CartLine, CartTotal};
use crate::error::{ApiError, ValidationError};
use crate::gateway::ApiGateway;
use crate::types::{Product, Sale};

/// One line of `POST /ventas/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleLinePayload {
    pub producto_id: ProductKey,
    pub cantidad: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub precio_unitario: Decimal,
}

/// Body of `POST /ventas/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalePayload {
    /// Id of the selected customer.
    pub cliente: CustomerId,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub detalles: Vec<SaleLinePayload>,
}

/// Snapshot of an order taken when its submission began.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub customer_ref: Option<CustomerId>,
    pub lines: Vec<CartLine>,
    pub total: Decimal,
    pub status: OrderStatus,
}

/// A submission that has passed validation and froze the register.
#[derive(Debug, Clone)]
pub struct PendingSubmission {
    pub order: Order,
    pub payload: SalePayload,
}

/// Cart plus customer selection for the order being built.
#[derive(Debug, Default)]
pub struct Register {
    cart: Cart,
    customer: Option<CustomerId>,
    status: OrderStatus,
}

impl Register {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub const fn customer(&self) -> Option<CustomerId> {
        self.customer
    }

    #[must_use]
    pub const fn status(&self) -> OrderStatus {
        self.status
    }

    /// Current cart total; see [`Cart::total`].
    #[must_use]
    pub fn total(&self) -> CartTotal {
        self.cart.total()
    }

    /// # Errors
    ///
    /// Returns `ValidationError::CartFrozen` during a submission, otherwise
    /// whatever [`Cart::add_line`] returns.
    pub fn add_line(&mut self, product: &Product, quantity: u32) -> Result<(), ValidationError> {
        self.edit(|register| register.cart.add_line(product, quantity))
    }

    /// # Errors
    ///
    /// Returns `ValidationError::CartFrozen` during a submission.
    pub fn update_quantity(&mut self, key: &ProductKey, delta: i64) -> Result<(), ValidationError> {
        self.edit(|register| {
            register.cart.update_quantity(key, delta);
            Ok(())
        })
    }

    /// # Errors
    ///
    /// Returns `ValidationError::CartFrozen` during a submission.
    pub fn remove_line(&mut self, key: &ProductKey) -> Result<Option<CartLine>, ValidationError> {
        self.edit(|register| Ok(register.cart.remove_line(key)))
    }

    /// # Errors
    ///
    /// Returns `ValidationError::CartFrozen` during a submission.
    pub fn select_customer(&mut self, customer: CustomerId) -> Result<(), ValidationError> {
        self.edit(|register| {
            register.customer = Some(customer);
            Ok(())
        })
    }

    /// # Errors
    ///
    /// Returns `ValidationError::CartFrozen` during a submission.
    pub fn clear_customer(&mut self) -> Result<(), ValidationError> {
        self.edit(|register| {
            register.customer = None;
            Ok(())
        })
    }

    /// Validate the order, freeze the register and build the payload.
    ///
    /// Nothing is sent; pass the payload to
    /// [`ApiGateway::create_sale`] and the outcome to
    /// [`Register::finish_submission`].
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::CartFrozen` if a submission is already in
    /// progress, `EmptyCart`, `MissingCustomer`, or `UnparseablePrice` for
    /// the first line whose price is not a number. The register is unchanged
    /// on error.
    pub fn begin_submission(&mut self) -> Result<PendingSubmission, ValidationError> {
        if self.status.is_in_flight() {
            return Err(ValidationError::CartFrozen);
        }
        if self.cart.is_empty() {
            return Err(ValidationError::EmptyCart);
        }
        let customer = self.customer.ok_or(ValidationError::MissingCustomer)?;

        let mut total = Decimal::ZERO;
        let mut detalles = Vec::with_capacity(self.cart.len());
        for line in self.cart.lines() {
            let precio_unitario =
                line.unit_price
                    .parse()
                    .map_err(|source| ValidationError::UnparseablePrice {
                        product_key: line.product_key.clone(),
                        source,
                    })?;
            total += precio_unitario * Decimal::from(line.quantity);
            detalles.push(SaleLinePayload {
                producto_id: line.product_key.clone(),
                cantidad: line.quantity,
                precio_unitario,
            });
        }

        self.status = OrderStatus::Submitting;

        Ok(PendingSubmission {
            order: Order {
                customer_ref: Some(customer),
                lines: self.cart.lines().to_vec(),
                total,
                status: OrderStatus::Submitting,
            },
            payload: SalePayload {
                cliente: customer,
                total,
                detalles,
            },
        })
    }

    /// Apply the backend's answer to a submission.
    ///
    /// On success the cart and customer are reset, whether or not the
    /// backend echoed the sale back; on failure both are kept so the cashier
    /// can retry. Returns the order with its final status.
    pub fn finish_submission(
        &mut self,
        pending: PendingSubmission,
        outcome: &Result<Option<Sale>, ApiError>,
    ) -> Order {
        let mut order = pending.order;

        match outcome {
            Ok(sale) => {
                info!(
                    sale_id = ?sale.as_ref().and_then(|s| s.id).map(i64::from),
                    total = %order.total,
                    lines = order.lines.len(),
                    "Sale committed"
                );
                self.cart.clear();
                self.customer = None;
                self.status = OrderStatus::Committed;
            }
            Err(e) => {
                warn!(error = %e, total = %order.total, "Sale not recorded; cart kept");
                self.status = OrderStatus::Failed;
            }
        }

        order.status = self.status;
        order
    }

    /// Unfreeze a register whose submission was dropped before an outcome
    /// arrived. The order counts as failed; the cart is kept.
    pub fn abandon_submission(&mut self) {
        if self.status == OrderStatus::Submitting {
            warn!("Submission abandoned without an outcome");
            self.status = OrderStatus::Failed;
        }
    }

    /// Validate, send and reconcile in one call.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` without any network call when a
    /// precondition fails, otherwise the gateway's error. The cart and
    /// customer are untouched on error.
    #[instrument(skip(self, gateway), fields(lines = self.cart.len()))]
    pub async fn submit(&mut self, gateway: &ApiGateway) -> Result<Option<Sale>, ApiError> {
        let pending = self.begin_submission()?;
        let outcome = gateway.create_sale(&pending.payload).await;
        self.finish_submission(pending, &outcome);
        outcome
    }

    fn edit<T>(
        &mut self,
        change: impl FnOnce(&mut Self) -> Result<T, ValidationError>,
    ) -> Result<T, ValidationError> {
        if !self.status.is_editable() {
            return Err(ValidationError::CartFrozen);
        }
        let result = change(self)?;
        self.status = OrderStatus::Draft;
        Ok(result)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reqwest::StatusCode;
    use ventas_core::PriceField;

    use super::*;
    use crate::error::RejectionBody;

    fn product(id: i64, precio: PriceField) -> Product {
        Product {
            id: Some(ProductKey::Numeric(id)),
            nombre: format!("Producto {id}"),
            precio,
            cantidad: None,
            descripcion: None,
        }
    }

    fn ready_register() -> Register {
        let mut register = Register::new();
        register
            .add_line(&product(1, PriceField::from("19990")), 2)
            .unwrap();
        register
            .add_line(&product(2, PriceField::from(500)), 1)
            .unwrap();
        register.select_customer(CustomerId::new(7)).unwrap();
        register
    }

    fn rejected() -> Result<Option<Sale>, ApiError> {
        Err(ApiError::ServerRejected {
            status: StatusCode::BAD_REQUEST,
            body: RejectionBody::parse(r#"{"detalles": ["Stock insuficiente"]}"#),
        })
    }

    fn committed() -> Result<Option<Sale>, ApiError> {
        Ok(Some(
            serde_json::from_str(r#"{"id": 41, "cliente": 7, "total": "40480.00"}"#).unwrap(),
        ))
    }

    #[test]
    fn test_empty_cart_or_missing_customer_rejected() {
        let mut register = Register::new();
        register.select_customer(CustomerId::new(7)).unwrap();
        assert_eq!(
            register.begin_submission().unwrap_err(),
            ValidationError::EmptyCart
        );

        let mut register = Register::new();
        register
            .add_line(&product(1, PriceField::from(100)), 1)
            .unwrap();
        assert_eq!(
            register.begin_submission().unwrap_err(),
            ValidationError::MissingCustomer
        );
        assert_eq!(register.status(), OrderStatus::Draft);
    }

    #[test]
    fn test_unparseable_price_blocks_submission() {
        let mut register = ready_register();
        register
            .add_line(&product(3, PriceField::from("consultar")), 1)
            .unwrap();

        let err = register.begin_submission().unwrap_err();
        assert!(matches!(
            err,
            ValidationError::UnparseablePrice {
                product_key: ProductKey::Numeric(3),
                ..
            }
        ));
        assert_eq!(register.status(), OrderStatus::Draft);
    }

    #[test]
    fn test_payload_shape() {
        let mut register = ready_register();
        let pending = register.begin_submission().unwrap();

        assert_eq!(
            serde_json::to_value(&pending.payload).unwrap(),
            serde_json::json!({
                "cliente": 7,
                "total": 40480.0,
                "detalles": [
                    {"producto_id": 1, "cantidad": 2, "precio_unitario": 19990.0},
                    {"producto_id": 2, "cantidad": 1, "precio_unitario": 500.0}
                ]
            })
        );
        assert_eq!(pending.order.total, Decimal::from(40480));
    }

    #[test]
    fn test_cart_frozen_while_submitting() {
        let mut register = ready_register();
        let _pending = register.begin_submission().unwrap();

        assert_eq!(register.status(), OrderStatus::Submitting);
        assert_eq!(
            register.add_line(&product(9, PriceField::from(1)), 1),
            Err(ValidationError::CartFrozen)
        );
        assert_eq!(
            register.update_quantity(&ProductKey::Numeric(1), 1),
            Err(ValidationError::CartFrozen)
        );
        assert_eq!(register.clear_customer(), Err(ValidationError::CartFrozen));
        assert_eq!(
            register.begin_submission().unwrap_err(),
            ValidationError::CartFrozen
        );
        assert_eq!(register.cart().len(), 2);
    }

    #[test]
    fn test_success_clears_cart_and_customer() {
        let mut register = ready_register();
        let pending = register.begin_submission().unwrap();

        let order = register.finish_submission(pending, &committed());

        assert_eq!(order.status, OrderStatus::Committed);
        assert_eq!(order.lines.len(), 2);
        assert!(register.cart().is_empty());
        assert_eq!(register.customer(), None);
        assert_eq!(register.status(), OrderStatus::Committed);
    }

    #[test]
    fn test_success_without_echo_still_commits() {
        let mut register = ready_register();
        let pending = register.begin_submission().unwrap();

        let order = register.finish_submission(pending, &Ok(None));

        assert_eq!(order.status, OrderStatus::Committed);
        assert!(register.cart().is_empty());
        assert_eq!(register.customer(), None);
    }

    #[test]
    fn test_failure_keeps_cart_and_customer() {
        let mut register = ready_register();
        let before = register.cart().clone();
        let pending = register.begin_submission().unwrap();

        let order = register.finish_submission(pending, &rejected());

        assert_eq!(order.status, OrderStatus::Failed);
        assert_eq!(register.cart(), &before);
        assert_eq!(register.customer(), Some(CustomerId::new(7)));

        // A retry is a fresh submission of the same cart.
        let retry = register.begin_submission().unwrap();
        assert_eq!(retry.payload.detalles.len(), 2);
    }

    #[test]
    fn test_session_expiry_keeps_cart() {
        let mut register = ready_register();
        let pending = register.begin_submission().unwrap();

        register.finish_submission(pending, &Err(ApiError::SessionExpired));

        assert_eq!(register.status(), OrderStatus::Failed);
        assert_eq!(register.cart().len(), 2);
    }

    #[test]
    fn test_editing_after_outcome_starts_new_draft() {
        let mut register = ready_register();
        let pending = register.begin_submission().unwrap();
        register.finish_submission(pending, &rejected());

        register
            .update_quantity(&ProductKey::Numeric(1), -1)
            .unwrap();
        assert_eq!(register.status(), OrderStatus::Draft);

        let pending = register.begin_submission().unwrap();
        register.finish_submission(pending, &committed());
        register
            .add_line(&product(5, PriceField::from(10)), 1)
            .unwrap();
        assert_eq!(register.status(), OrderStatus::Draft);
    }

    #[test]
    fn test_resubmitting_committed_register_reports_empty_cart() {
        let mut register = ready_register();
        let pending = register.begin_submission().unwrap();
        register.finish_submission(pending, &committed());

        assert_eq!(
            register.begin_submission().unwrap_err(),
            ValidationError::EmptyCart
        );
        assert_eq!(register.status(), OrderStatus::Committed);
    }

    #[test]
    fn test_abandon_unfreezes() {
        let mut register = ready_register();
        let _pending = register.begin_submission().unwrap();

        register.abandon_submission();

        assert_eq!(register.status(), OrderStatus::Failed);
        assert!(register.select_customer(CustomerId::new(8)).is_ok());
    }
}
