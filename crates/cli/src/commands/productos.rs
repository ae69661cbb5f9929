//! Product commands.

use rust_decimal::Decimal;
use ventas_client::{ProductDraft, filter_products};
use ventas_core::ProductKey;

use super::{App, CommandError};

/// List products, optionally filtered by name.
pub async fn list(app: &App, search: Option<&str>) -> Result<(), CommandError> {
    let products = app.gateway.list_products().await?;
    let matches = filter_products(&products, search.unwrap_or_default());

    println!("{:>8}  {:<32} {:>12} {:>6}", "ID", "NOMBRE", "PRECIO", "STOCK");
    for product in &matches {
        println!(
            "{:>8}  {:<32} {:>12} {:>6}",
            product.key().map_or_else(|| "-".to_string(), ToString::to_string),
            product.nombre,
            product.precio.to_string(),
            product
                .cantidad
                .map_or_else(|| "-".to_string(), |c| c.to_string()),
        );
    }
    println!("{} of {} products", matches.len(), products.len());
    Ok(())
}

/// Create (`id` absent) or update a product.
pub async fn save(
    app: &App,
    id: Option<&str>,
    nombre: &str,
    precio: Decimal,
    cantidad: i64,
    descripcion: Option<String>,
) -> Result<(), CommandError> {
    let draft = ProductDraft::new(nombre, precio, cantidad, descripcion)?;
    let key = id.map(ProductKey::parse);

    let product = app.gateway.save_product(key.as_ref(), &draft).await?;
    println!(
        "Saved product {} ({})",
        product.key().map_or_else(|| "?".to_string(), ToString::to_string),
        product.nombre
    );
    Ok(())
}

/// Delete a product.
pub async fn delete(app: &App, id: &str) -> Result<(), CommandError> {
    let key = ProductKey::parse(id);
    app.gateway.delete_product(&key).await?;
    println!("Deleted product {key}");
    Ok(())
}
