//! Admin dashboard.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use crate::db::{OrderRepository, ProductRepository};
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::{InventoryStats, OrderStats, OrderSummary, Product};
use crate::state::AppState;

const RECENT_LIMIT: i64 = 5;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub inventory: InventoryStats,
    pub orders: OrderStats,
    pub recent_orders: Vec<OrderSummary>,
    pub recent_products: Vec<Product>,
}

/// Inventory and order figures with the latest activity.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Dashboard>> {
    let products = ProductRepository::new(state.pool());
    let orders = OrderRepository::new(state.pool());

    let (inventory, order_stats, recent_orders, recent_products) = tokio::try_join!(
        products.inventory_stats(),
        orders.stats(),
        orders.recent(RECENT_LIMIT),
        products.recent(RECENT_LIMIT),
    )?;

    Ok(Json(Dashboard {
        inventory,
        orders: order_stats,
        recent_orders,
        recent_products,
    }))
}
