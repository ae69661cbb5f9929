//! Sale commands.

use rust_decimal::Decimal;
use tracing::warn;
use ventas_client::Register;
use ventas_core::{CustomerId, ProductKey};

use super::{App, CommandError};

/// List recorded sales with their combined total.
pub async fn list(app: &App) -> Result<(), CommandError> {
    let sales = app.gateway.list_sales().await?;

    let mut sum = Decimal::ZERO;
    println!("{:>6}  {:>8}  {:>12}  {:<25}", "ID", "CLIENTE", "TOTAL", "FECHA");
    for sale in &sales {
        match sale.total.parse() {
            Ok(total) => sum += total,
            Err(error) => warn!(sale_id = ?sale.id.map(i64::from), %error, "Sale total not counted"),
        }
        println!(
            "{:>6}  {:>8}  {:>12}  {:<25}",
            sale.id.map_or_else(|| "-".to_string(), |id| id.to_string()),
            sale.customer_id()
                .map_or_else(|| "-".to_string(), |id| id.to_string()),
            sale.total.to_string(),
            sale.recorded_at()
                .map_or_else(|| "-".to_string(), |at| at.to_rfc3339()),
        );
    }
    println!("{} sales, {sum} total", sales.len());
    Ok(())
}

/// Build an order from `items` and submit it for `cliente`.
pub async fn nueva(app: &App, cliente: CustomerId, items: &[String]) -> Result<(), CommandError> {
    let items = items
        .iter()
        .map(|raw| parse_item(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let products = app.gateway.list_products().await?;
    let mut register = Register::new();
    for (key, quantity) in items {
        let product = products
            .iter()
            .find(|p| p.key() == Some(&key))
            .ok_or(CommandError::UnknownProduct(key))?;
        register.add_line(product, quantity)?;
    }
    register.select_customer(cliente)?;

    let total = register.total();
    println!(
        "Submitting {} lines for customer {cliente}, total {}",
        register.cart().len(),
        total.amount
    );

    let sale = register.submit(&app.gateway).await?;
    println!(
        "Sale {} recorded",
        sale.and_then(|s| s.id)
            .map_or_else(|| "?".to_string(), |id| id.to_string())
    );
    Ok(())
}

/// Parse `<key>` or `<key>:<qty>`.
fn parse_item(raw: &str) -> Result<(ProductKey, u32), CommandError> {
    let invalid = || CommandError::InvalidItem(raw.to_string());

    let (key, quantity) = match raw.rsplit_once(':') {
        Some((key, qty)) => (key, qty.trim().parse::<u32>().map_err(|_| invalid())?),
        None => (raw, 1),
    };

    let key = ProductKey::parse(key);
    if key.is_blank() || quantity == 0 {
        return Err(invalid());
    }
    Ok((key, quantity))
}
