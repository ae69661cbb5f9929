//! Order lifecycle status.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Where an order is in its submission lifecycle.
///
/// ```text
/// Draft ──▶ Submitting ──▶ Committed
///   ▲            │
///   │            ▼
///   └──────── Failed
/// ```
///
/// `Failed` may go straight back to `Submitting` (a retry); editing the cart
/// after `Failed` or `Committed` starts a new `Draft`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Being composed; the cart is editable.
    #[default]
    Draft,
    /// Sent to the backend; the cart is frozen.
    Submitting,
    /// Confirmed by the backend.
    Committed,
    /// Rejected or not delivered; the cart is kept for a retry.
    Failed,
}

impl OrderStatus {
    /// Whether the cart and customer selection may be changed.
    #[must_use]
    pub const fn is_editable(self) -> bool {
        !self.is_in_flight()
    }

    /// Whether a submission is in flight.
    #[must_use]
    pub const fn is_in_flight(self) -> bool {
        matches!(self, Self::Submitting)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Draft => "draft",
            Self::Submitting => "submitting",
            Self::Committed => "committed",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_submitting_freezes() {
        assert!(OrderStatus::Draft.is_editable());
        assert!(OrderStatus::Failed.is_editable());
        assert!(OrderStatus::Committed.is_editable());
        assert!(!OrderStatus::Submitting.is_editable());
        assert!(OrderStatus::Submitting.is_in_flight());
        assert!(!OrderStatus::Failed.is_in_flight());
    }
}
