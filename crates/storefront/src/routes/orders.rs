//! Order history for the signed-in customer.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use pharmacorp_core::OrderId;

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::{Order, OrderSummary};
use crate::state::AppState;

/// The user's orders, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<OrderSummary>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(orders))
}

/// One of the user's orders. Other users' orders read as not found.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    OrderRepository::new(state.pool())
        .get_for_user(id, user.id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))
}
