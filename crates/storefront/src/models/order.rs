//! Order types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use pharmacorp_core::{
    Money, OrderId, OrderItemId, OrderNumber, OrderStatus, PaymentMethod, PaymentStatus,
    ProductId, UserId,
};

/// A placed order with its snapshot lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub shipping_name: String,
    pub shipping_email: String,
    pub shipping_phone: String,
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_state: String,
    pub shipping_zip: String,
    pub subtotal: Money,
    pub total: Money,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

/// One purchased product, frozen at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    /// `None` once the product has been deleted from the catalog.
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub product_image: String,
    pub product_price: Money,
    pub quantity: i32,
    pub total: Money,
}

/// Order list row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub shipping_name: String,
    pub total: Money,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Dashboard order figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total_orders: i64,
    pub pending_orders: i64,
    /// Revenue from orders placed since midnight UTC.
    pub today_revenue: Decimal,
    pub total_revenue: Decimal,
}
