//! Cart aggregation.
//!
//! Lines are keyed by [`ProductKey`] and kept in insertion order. Quantities
//! never drop below 1: decrementing clamps, and removing a line is a separate
//! explicit operation. The total is recomputed from the lines on every call.

use rust_decimal::Decimal;
use tracing::warn;
use ventas_core::{PriceError, PriceField, ProductKey};

use crate::error::ValidationError;
use crate::types::Product;

/// One product in the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub product_key: ProductKey,
    /// Unit price as it was received from the catalog.
    pub unit_price: PriceField,
    /// Always at least 1.
    pub quantity: u32,
    pub display_name: String,
}

impl CartLine {
    /// `unit_price * quantity`.
    ///
    /// # Errors
    ///
    /// Returns the price parse error if the unit price is not a number.
    pub fn subtotal(&self) -> Result<Decimal, PriceError> {
        Ok(self.unit_price.parse()? * Decimal::from(self.quantity))
    }
}

/// A line left out of the total because its price does not parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludedLine {
    pub product_key: ProductKey,
    pub error: PriceError,
}

/// Result of [`Cart::total`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CartTotal {
    /// Sum over the lines whose price parsed.
    pub amount: Decimal,
    /// Lines that did not contribute to `amount`.
    pub excluded: Vec<ExcludedLine>,
}

impl CartTotal {
    /// Whether every line contributed to the amount.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.excluded.is_empty()
    }
}

/// The order being built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` units of `product`, merging with an existing line.
    ///
    /// A merged line keeps the price and name it was first added with.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MissingProductKey` if the product has no
    /// usable key and `ValidationError::ZeroQuantity` if `quantity` is 0.
    pub fn add_line(&mut self, product: &Product, quantity: u32) -> Result<(), ValidationError> {
        let key = product.key().ok_or(ValidationError::MissingProductKey)?;
        if quantity == 0 {
            return Err(ValidationError::ZeroQuantity);
        }

        if let Some(line) = self.line_mut(key) {
            line.quantity = line.quantity.saturating_add(quantity);
        } else {
            self.lines.push(CartLine {
                product_key: key.clone(),
                unit_price: product.precio.clone(),
                quantity,
                display_name: product.nombre.clone(),
            });
        }
        Ok(())
    }

    /// Change a line's quantity by `delta`, clamping at 1.
    ///
    /// Unknown keys are ignored.
    pub fn update_quantity(&mut self, key: &ProductKey, delta: i64) {
        if let Some(line) = self.line_mut(key) {
            let updated = i64::from(line.quantity)
                .saturating_add(delta)
                .clamp(1, i64::from(u32::MAX));
            line.quantity = u32::try_from(updated).unwrap_or(u32::MAX);
        }
    }

    /// Remove a line whatever its quantity. Returns the removed line.
    pub fn remove_line(&mut self, key: &ProductKey) -> Option<CartLine> {
        let index = self.lines.iter().position(|l| &l.product_key == key)?;
        Some(self.lines.remove(index))
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn get(&self, key: &ProductKey) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.product_key == key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Sum of `unit_price * quantity` over all lines.
    ///
    /// Lines whose price does not parse are excluded from the amount,
    /// reported in [`CartTotal::excluded`] and logged.
    #[must_use]
    pub fn total(&self) -> CartTotal {
        let mut total = CartTotal::default();
        for line in &self.lines {
            match line.subtotal() {
                Ok(subtotal) => total.amount += subtotal,
                Err(error) => {
                    warn!(
                        product_key = %line.product_key,
                        price = %line.unit_price,
                        %error,
                        "Excluding line with unusable price from total"
                    );
                    total.excluded.push(ExcludedLine {
                        product_key: line.product_key.clone(),
                        error,
                    });
                }
            }
        }
        total
    }

    fn line_mut(&mut self, key: &ProductKey) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|l| &l.product_key == key)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn product(id: i64, nombre: &str, precio: PriceField) -> Product {
        Product {
            id: Some(ProductKey::Numeric(id)),
            nombre: nombre.to_string(),
            precio,
            cantidad: Some(10),
            descripcion: None,
        }
    }

    #[test]
    fn test_repeated_add_sums_quantities() {
        let mut cart = Cart::new();
        let cafe = product(1, "Café", PriceField::from(4990));

        cart.add_line(&cafe, 1).unwrap();
        cart.add_line(&cafe, 2).unwrap();
        cart.add_line(&cafe, 1).unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(&ProductKey::Numeric(1)).unwrap().quantity, 4);
    }

    #[test]
    fn test_remove_then_add_restarts_at_one() {
        let mut cart = Cart::new();
        let cafe = product(1, "Café", PriceField::from(4990));
        cart.add_line(&cafe, 5).unwrap();

        let removed = cart.remove_line(&ProductKey::Numeric(1)).unwrap();
        assert_eq!(removed.quantity, 5);
        assert!(cart.is_empty());

        cart.add_line(&cafe, 1).unwrap();
        assert_eq!(cart.get(&ProductKey::Numeric(1)).unwrap().quantity, 1);
    }

    #[test]
    fn test_total_mixes_text_and_numeric_prices() {
        let mut cart = Cart::new();
        cart.add_line(&product(1, "Té", PriceField::from("19990")), 2)
            .unwrap();
        cart.add_line(&product(2, "Pan", PriceField::from(1500)), 3)
            .unwrap();
        cart.add_line(&product(3, "Jugo", PriceField::from("999.50")), 1)
            .unwrap();

        let total = cart.total();
        assert!(total.is_complete());
        assert_eq!(total.amount, Decimal::new(4547950, 2));
    }

    #[test]
    fn test_total_excludes_unparseable_price() {
        let mut cart = Cart::new();
        cart.add_line(&product(1, "Té", PriceField::from("19990")), 1)
            .unwrap();
        cart.add_line(&product(2, "Regalo", PriceField::from("gratis")), 4)
            .unwrap();

        let total = cart.total();
        assert_eq!(total.amount, Decimal::from(19990));
        assert_eq!(total.excluded.len(), 1);
        assert_eq!(total.excluded[0].product_key, ProductKey::Numeric(2));
    }

    #[test]
    fn test_decrement_clamps_at_one() {
        let mut cart = Cart::new();
        cart.add_line(&product(1, "Café", PriceField::from(4990)), 3)
            .unwrap();

        cart.update_quantity(&ProductKey::Numeric(1), -100);
        assert_eq!(cart.get(&ProductKey::Numeric(1)).unwrap().quantity, 1);

        cart.update_quantity(&ProductKey::Numeric(1), 2);
        assert_eq!(cart.get(&ProductKey::Numeric(1)).unwrap().quantity, 3);
    }

    #[test]
    fn test_update_unknown_key_is_noop() {
        let mut cart = Cart::new();
        cart.add_line(&product(1, "Café", PriceField::from(4990)), 1)
            .unwrap();
        let before = cart.clone();

        cart.update_quantity(&ProductKey::Numeric(99), 5);
        assert_eq!(cart, before);
    }

    #[test]
    fn test_add_rejects_missing_key_and_zero_quantity() {
        let mut cart = Cart::new();
        let mut keyless = product(1, "Sin código", PriceField::from(100));
        keyless.id = None;
        assert_eq!(
            cart.add_line(&keyless, 1),
            Err(ValidationError::MissingProductKey)
        );

        keyless.id = Some(ProductKey::Text(String::new()));
        assert_eq!(
            cart.add_line(&keyless, 1),
            Err(ValidationError::MissingProductKey)
        );

        assert_eq!(
            cart.add_line(&product(2, "Pan", PriceField::from(100)), 0),
            Err(ValidationError::ZeroQuantity)
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut cart = Cart::new();
        for (id, name) in [(3, "c"), (1, "a"), (2, "b")] {
            cart.add_line(&product(id, name, PriceField::from(1)), 1)
                .unwrap();
        }
        cart.add_line(&product(3, "c", PriceField::from(1)), 1)
            .unwrap();

        let names: Vec<_> = cart.lines().iter().map(|l| l.display_name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_text_and_numeric_keys_are_distinct() {
        let mut cart = Cart::new();
        cart.add_line(&product(7, "Numérico", PriceField::from(1)), 1)
            .unwrap();
        let mut textual = product(0, "Texto", PriceField::from(1));
        textual.id = Some(ProductKey::Text("7".to_string()));
        cart.add_line(&textual, 1).unwrap();

        assert_eq!(cart.len(), 2);
    }
}
