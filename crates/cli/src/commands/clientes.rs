//! Customer commands.

use ventas_client::{NewCustomer, filter_customers};
use ventas_core::CustomerId;

use super::{App, CommandError};

/// List customers, optionally filtered by name or email.
pub async fn list(app: &App, search: Option<&str>) -> Result<(), CommandError> {
    let customers = app.gateway.list_customers().await?;
    let matches = filter_customers(&customers, search.unwrap_or_default());

    println!("{:>6}  {:<28} {:<32} {:<14}", "ID", "NOMBRE", "EMAIL", "TELEFONO");
    for customer in &matches {
        println!(
            "{:>6}  {:<28} {:<32} {:<14}",
            customer.id.to_string(),
            customer.nombre,
            customer.email.as_deref().unwrap_or("-"),
            customer.telefono.as_deref().unwrap_or("-"),
        );
    }
    println!("{} of {} customers", matches.len(), customers.len());
    Ok(())
}

/// Create a customer. The email is checked before anything is sent.
pub async fn create(
    app: &App,
    nombre: &str,
    email: &str,
    telefono: Option<&str>,
) -> Result<(), CommandError> {
    let customer = NewCustomer::new(nombre, email, telefono)?;
    let created = app.gateway.create_customer(&customer).await?;
    println!("Created customer {} ({})", created.id, created.nombre);
    Ok(())
}

/// Delete a customer.
pub async fn delete(app: &App, id: CustomerId) -> Result<(), CommandError> {
    app.gateway.delete_customer(id).await?;
    println!("Deleted customer {id}");
    Ok(())
}
