//! Cart view types.

use serde::Serialize;

use pharmacorp_core::cart::available;
use pharmacorp_core::{Money, ProductId};

/// A cart line joined with live product data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartViewLine {
    pub product_id: ProductId,
    pub name: String,
    pub image: String,
    pub price: Money,
    pub quantity: i32,
    /// Units on hand right now.
    pub stock: i32,
    /// Units that can still be added on top of `quantity`.
    pub available: i32,
    /// Whether the line can be checked out as is.
    pub within_stock: bool,
    pub line_total: Money,
}

impl CartViewLine {
    #[must_use]
    pub fn new(
        product_id: ProductId,
        name: String,
        image: String,
        price: Money,
        quantity: i32,
        stock: i32,
    ) -> Self {
        Self {
            product_id,
            name,
            image,
            price,
            quantity,
            stock,
            available: available(stock, quantity),
            within_stock: quantity <= stock,
            line_total: price.times(u32::try_from(quantity).unwrap_or_default()),
        }
    }
}

/// A cart reconciled against current stock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartViewLine>,
    /// Summed in `i64`; replace accepts any positive `i32` per line.
    pub item_count: i64,
    pub subtotal: Money,
}

impl CartView {
    #[must_use]
    pub fn new(items: Vec<CartViewLine>) -> Self {
        let item_count = items.iter().map(|line| i64::from(line.quantity)).sum();
        let subtotal = items.iter().map(|line| line.line_total).sum();
        Self {
            items,
            item_count,
            subtotal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: i32, price_cents: u32, quantity: i32, stock: i32) -> CartViewLine {
        CartViewLine::new(
            ProductId::new(id),
            format!("Product {id}"),
            "/products/default.jpg".into(),
            Money::from_cents(price_cents),
            quantity,
            stock,
        )
    }

    #[test]
    fn test_line_availability() {
        let ok = line(1, 1000, 3, 5);
        assert_eq!(ok.available, 2);
        assert!(ok.within_stock);

        let over = line(2, 1000, 3, 2);
        assert_eq!(over.available, 0);
        assert!(!over.within_stock);
    }

    #[test]
    fn test_view_totals() {
        let view = CartView::new(vec![line(1, 4999, 2, 10), line(2, 2499, 1, 10)]);
        assert_eq!(view.item_count, 3);
        assert_eq!(view.subtotal, Money::from_cents(12497));
    }

    #[test]
    fn test_view_count_does_not_overflow_i32() {
        let view = CartView::new(vec![
            line(1, 100, 2_000_000_000, 10),
            line(2, 100, 2_000_000_000, 10),
        ]);
        assert_eq!(view.item_count, 4_000_000_000);
        assert_eq!(
            view.subtotal.amount(),
            rust_decimal::Decimal::new(4_000_000_000, 0)
        );
    }

    #[test]
    fn test_empty_view_serializes_items_array() {
        let json = serde_json::to_value(CartView::default()).unwrap_or_default();
        assert_eq!(json["items"], serde_json::json!([]));
        assert_eq!(json["subtotal"], "0");
    }
}
