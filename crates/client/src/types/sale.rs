//! Recorded sales.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ventas_core::{CustomerId, PriceField, ProductKey, SaleId};

/// A sale as returned by `GET /ventas/` and `POST /ventas/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    #[serde(default)]
    pub id: Option<SaleId>,
    /// Customer reference: an id, a numeric string or a nested customer.
    #[serde(default)]
    pub cliente: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub total: PriceField,
    #[serde(default)]
    pub fecha: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub detalles: Vec<SaleDetail>,
}

/// One line of a recorded sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleDetail {
    #[serde(default)]
    pub producto_id: Option<ProductKey>,
    #[serde(default)]
    pub cantidad: Option<i64>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub precio_unitario: PriceField,
}

impl Sale {
    /// The customer id, whichever shape the backend used.
    #[must_use]
    pub fn customer_id(&self) -> Option<CustomerId> {
        match self.cliente.as_ref()? {
            serde_json::Value::Number(n) => n.as_i64().map(CustomerId::new),
            serde_json::Value::String(s) => s.parse().ok(),
            serde_json::Value::Object(map) => map
                .get("id")
                .and_then(serde_json::Value::as_i64)
                .map(CustomerId::new),
            _ => None,
        }
    }

    /// When the sale was recorded: `fecha` if present, else `created_at`.
    ///
    /// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (taken as
    /// midnight UTC).
    #[must_use]
    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.fecha.as_deref().or(self.created_at.as_deref())?;
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_customer_id_shapes() {
        let cases = [
            (r#"{"cliente": 7}"#, Some(7)),
            (r#"{"cliente": "7"}"#, Some(7)),
            (r#"{"cliente": {"id": 7, "nombre": "Ana"}}"#, Some(7)),
            (r#"{"cliente": null}"#, None),
            ("{}", None),
        ];
        for (json, expected) in cases {
            let sale: Sale = serde_json::from_str(json).unwrap();
            assert_eq!(sale.customer_id().map(i64::from), expected, "{json}");
        }
    }

    #[test]
    fn test_recorded_at_prefers_fecha() {
        let sale: Sale = serde_json::from_str(
            r#"{"id": 1, "total": "100.00", "fecha": "2024-03-01", "created_at": "2024-03-02T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(
            sale.recorded_at().unwrap().to_rfc3339(),
            "2024-03-01T00:00:00+00:00"
        );
        assert_eq!(sale.total.parse().unwrap(), Decimal::from(100));
    }

    #[test]
    fn test_null_fields_read_as_missing() {
        let sale: Sale = serde_json::from_str(
            r#"{"id": 3, "total": null, "detalles": [{"producto_id": 1, "cantidad": 2, "precio_unitario": null}]}"#,
        )
        .unwrap();
        assert_eq!(sale.total, PriceField::default());
        assert_eq!(sale.detalles[0].precio_unitario, PriceField::default());

        let sale: Sale = serde_json::from_str(r#"{"detalles": null}"#).unwrap();
        assert!(sale.detalles.is_empty());
    }

    #[test]
    fn test_created_at_fallback() {
        let sale: Sale =
            serde_json::from_str(r#"{"created_at": "2024-03-02T10:00:00-03:00"}"#).unwrap();
        assert_eq!(
            sale.recorded_at().unwrap().to_rfc3339(),
            "2024-03-02T13:00:00+00:00"
        );
    }
}
