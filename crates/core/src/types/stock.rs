//! Stock classification.
//!
//! `product.quantity` is the only stored stock figure. Availability is always
//! derived from it, never persisted separately.

use serde::{Deserialize, Serialize};

/// Products at or below this many units (but above zero) count as low stock.
pub const LOW_STOCK_THRESHOLD: i32 = 10;

/// Whether a product with `quantity` units on hand can be sold.
#[must_use]
pub const fn in_stock(quantity: i32) -> bool {
    quantity > 0
}

/// Inventory bucket used by the admin product filters and dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    OutOfStock,
    Low,
    Available,
}

impl StockLevel {
    /// Classify a quantity.
    #[must_use]
    pub const fn of(quantity: i32) -> Self {
        if quantity <= 0 {
            Self::OutOfStock
        } else if quantity <= LOW_STOCK_THRESHOLD {
            Self::Low
        } else {
            Self::Available
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_stock_tracks_quantity() {
        assert!(!in_stock(0));
        assert!(!in_stock(-1));
        assert!(in_stock(1));
    }

    #[test]
    fn test_stock_level_boundaries() {
        assert_eq!(StockLevel::of(0), StockLevel::OutOfStock);
        assert_eq!(StockLevel::of(1), StockLevel::Low);
        assert_eq!(StockLevel::of(LOW_STOCK_THRESHOLD), StockLevel::Low);
        assert_eq!(StockLevel::of(LOW_STOCK_THRESHOLD + 1), StockLevel::Available);
    }
}
