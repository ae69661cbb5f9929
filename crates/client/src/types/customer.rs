//! Customers.

use serde::{Deserialize, Serialize};
use ventas_core::{CustomerId, Email};

use crate::error::ValidationError;

/// A customer as listed by `GET /clientes/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub telefono: Option<String>,
}

/// Body of `POST /clientes/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCustomer {
    nombre: String,
    email: Email,
    #[serde(skip_serializing_if = "Option::is_none")]
    telefono: Option<String>,
}

impl NewCustomer {
    /// Validate and build a new customer.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MissingField` for a blank name and
    /// `ValidationError::InvalidEmail` when the email is malformed.
    pub fn new(nombre: &str, email: &str, telefono: Option<&str>) -> Result<Self, ValidationError> {
        let nombre = nombre.trim();
        if nombre.is_empty() {
            return Err(ValidationError::MissingField("nombre"));
        }

        Ok(Self {
            nombre: nombre.to_string(),
            email: Email::parse(email)?,
            telefono: telefono
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
        })
    }

    #[must_use]
    pub fn nombre(&self) -> &str {
        &self.nombre
    }

    #[must_use]
    pub const fn email(&self) -> &Email {
        &self.email
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ventas_core::EmailError;

    use super::*;

    #[test]
    fn test_new_customer_serializes_trimmed() {
        let customer = NewCustomer::new(" Ana Pérez ", "ana@Tienda.CL", Some("  ")).unwrap();
        assert_eq!(
            serde_json::to_value(&customer).unwrap(),
            serde_json::json!({"nombre": "Ana Pérez", "email": "ana@tienda.cl"})
        );
    }

    #[test]
    fn test_new_customer_rejects_bad_email() {
        assert_eq!(
            NewCustomer::new("Ana", "ana.tienda.cl", None),
            Err(ValidationError::InvalidEmail(EmailError::AtSymbol))
        );
        assert_eq!(
            NewCustomer::new("", "ana@tienda.cl", None),
            Err(ValidationError::MissingField("nombre"))
        );
    }

    #[test]
    fn test_customer_optional_contact() {
        let customer: Customer = serde_json::from_str(r#"{"id": 3, "nombre": "Luis"}"#).unwrap();
        assert_eq!(customer.id, CustomerId::new(3));
        assert!(customer.email.is_none());
    }
}
