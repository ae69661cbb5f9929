//! Catalog search.
//!
//! Case-insensitive substring filters for the product and customer lists.
//! An empty (or blank) term keeps everything.

use crate::types::{Customer, Product};

/// Products whose name contains `term`.
#[must_use]
pub fn filter_products<'a>(products: &'a [Product], term: &str) -> Vec<&'a Product> {
    let needle = term.trim().to_lowercase();
    products
        .iter()
        .filter(|p| needle.is_empty() || p.nombre.to_lowercase().contains(&needle))
        .collect()
}

/// Customers whose name or email contains `term`.
#[must_use]
pub fn filter_customers<'a>(customers: &'a [Customer], term: &str) -> Vec<&'a Customer> {
    let needle = term.trim().to_lowercase();
    customers
        .iter()
        .filter(|c| {
            needle.is_empty()
                || c.nombre.to_lowercase().contains(&needle)
                || c.email
                    .as_deref()
                    .is_some_and(|email| email.to_lowercase().contains(&needle))
        })
        .collect()
}
